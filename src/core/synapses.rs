//! A `Synapse` models a single proximal connection between a `Column` and one input bit.
//!
//! If the permanence is above the connected threshold, the synapse is considered "connected" and
//! counts toward the column's overlap score. During learning, permanence is increased or decreased
//! depending on whether the input bit it reads was active at that timestep.
//!
//! Every mutation of the permanence clamps it into `[0.0, 1.0]`, direct sets included, so the
//! invariant holds no matter which path wrote the value.
//!
//! The thresholds and step sizes live in `SynapsePermanenceOptions`, which is threaded through the
//! pooler configuration instead of being shared globally. Two regions in the same process can run
//! with different tunings.

use crate::error::{Result, SpatialPoolerError};
use serde::{Deserialize, Serialize};

/// Lower bound of every permanence value.
pub const MIN_PERMANENCE: f32 = 0.0;
/// Upper bound of every permanence value.
pub const MAX_PERMANENCE: f32 = 1.0;

/// A synapse reading one input bit, with the strength of that connection.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Synapse {
    /// Points to which input bit this synapse reads.
    source_index: usize,

    /// Represents the strength of the connection between the synapse and the input bit.
    permanence: f32,

    /// Whether the source bit was on at the latest timestep. Not meaningful across timesteps.
    #[serde(skip)]
    active: bool,
}

/// Options governing how synapse permanence is adjusted and when a synapse counts as connected.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynapsePermanenceOptions {
    /// A synapse is connected when its permanence is strictly greater than this value.
    pub connected: f32,
    /// Added to the permanence of active synapses on winning columns.
    pub active_increment: f32,
    /// Subtracted from the permanence of inactive synapses on winning columns.
    pub inactive_decrement: f32,
}

impl Default for SynapsePermanenceOptions {
    fn default() -> Self {
        Self {
            connected: 0.2,
            active_increment: 0.1,
            inactive_decrement: 0.05,
        }
    }
}

impl SynapsePermanenceOptions {
    /// Checks that every threshold and step lies within the permanence range.
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("connected", self.connected),
            ("active_increment", self.active_increment),
            ("inactive_decrement", self.inactive_decrement),
        ];

        for (name, value) in fields {
            if !(MIN_PERMANENCE..=MAX_PERMANENCE).contains(&value) {
                return Err(SpatialPoolerError::invalid(
                    name,
                    format!("must lie in [0, 1], got {value}"),
                ));
            }
        }

        Ok(())
    }
}

#[inline]
fn clamp_permanence(value: f32) -> f32 {
    if value.is_nan() {
        MIN_PERMANENCE
    } else {
        value.clamp(MIN_PERMANENCE, MAX_PERMANENCE)
    }
}

impl Synapse {
    /// Creates an inactive synapse reading `source_index`. The permanence is clamped into `[0, 1]`.
    #[inline]
    pub fn new(source_index: usize, permanence: f32) -> Self {
        Self {
            source_index,
            permanence: clamp_permanence(permanence),
            active: false,
        }
    }

    #[inline]
    pub fn source_index(&self) -> usize {
        self.source_index
    }

    #[inline]
    pub fn permanence(&self) -> f32 {
        self.permanence
    }

    /// Overwrites the permanence, clamped into `[0, 1]`.
    #[inline]
    pub fn set_permanence(&mut self, permanence: f32) {
        self.permanence = clamp_permanence(permanence);
    }

    /// Raises the permanence by `delta`, saturating at 1.0.
    #[inline]
    pub fn inc_permanence(&mut self, delta: f32) {
        self.set_permanence(self.permanence + delta);
    }

    /// Lowers the permanence by `delta`, saturating at 0.0.
    #[inline]
    pub fn dec_permanence(&mut self, delta: f32) {
        self.set_permanence(self.permanence - delta);
    }

    /// Strict comparison: a permanence exactly at the threshold is not connected.
    #[inline]
    pub fn is_connected(&self, connected_threshold: f32) -> bool {
        self.permanence > connected_threshold
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.active
    }

    #[inline]
    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    /// Reads the bit this synapse is wired to from the input vector of `timestep`.
    ///
    /// Fails with `OutOfRange` when the input is shorter than the source index. `column` is only
    /// used to make the error point at the column that owns the synapse.
    #[inline]
    pub fn source_input(&self, input: &[bool], timestep: u64, column: usize) -> Result<bool> {
        input
            .get(self.source_index)
            .copied()
            .ok_or(SpatialPoolerError::OutOfRange {
                timestep,
                column,
                source_index: self.source_index,
                input_len: input.len(),
            })
    }
}
