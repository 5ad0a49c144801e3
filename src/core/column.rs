//! A `Column` in HTM represents one feature detector or receptive field in the Spatial Pooler.
//!
//! Biological inspiration:
//! Columns in HTM are inspired by cortical mini-columns found in the brain.
//! They consist of a group of neurons, which in HTM are modeled as "cells".
//!
//! Meaning in HTM:
//! Each column senses a subset of the input space through its proximal synapses, computes its
//! overlap score with the current input, and competes with its neighbors to become active.
//! During spatial pooling the column acts as one atomic unit. Its cells and their distal synapses
//! belong to the temporal layer and are only carried here as structure.

use super::synapses::Synapse;
use serde::{Deserialize, Serialize};

/// Number of cells a column is built with unless configured otherwise.
pub const DEFAULT_CELLS_PER_COLUMN: usize = 4;

/// A cell inside a column. Owns its distal synapses; has no spatial pooling behavior.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    synapses: Vec<Synapse>,
}

impl Cell {
    /// A cell without synapses.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Distal synapses of the cell.
    #[inline]
    pub fn synapses(&self) -> &[Synapse] {
        &self.synapses
    }
}

/// Represents a cortical column in the HTM model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    /// The index of the column within its region.
    index: usize,

    /// Multiplier applied to the overlap of qualifying columns. Adapted by an outside policy.
    boost: f32,

    /// Overlap score of the current timestep; only written while overlaps are computed.
    #[serde(skip)]
    overlap: f32,

    /// Fixed set of cells, created with the column.
    cells: Vec<Cell>,

    /// Feed-forward synapses into the input space.
    proximal_synapses: Vec<Synapse>,
}

impl Column {
    /// Creates a new column with `cells_per_column` empty cells, a boost of 1.0 and the given
    /// proximal synapses.
    pub fn new(index: usize, cells_per_column: usize, proximal_synapses: Vec<Synapse>) -> Self {
        Self {
            index,
            boost: 1.0,
            overlap: 0.0,
            cells: (0..cells_per_column).map(|_| Cell::new()).collect(),
            proximal_synapses,
        }
    }

    /// Position of the column within its region.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Overlap of the latest computed timestep, boost included.
    #[inline]
    pub fn overlap(&self) -> f32 {
        self.overlap
    }

    #[inline]
    pub fn reset_overlap(&mut self) {
        self.overlap = 0.0;
    }

    #[inline]
    pub fn add_overlap(&mut self, amount: f32) {
        self.overlap += amount;
    }

    /// Multiplies the overlap by the boost factor. Must run at most once per timestep.
    #[inline]
    pub fn apply_boost(&mut self) {
        self.overlap *= self.boost;
    }

    #[inline]
    pub fn boost(&self) -> f32 {
        self.boost
    }

    #[inline]
    pub fn set_boost(&mut self, boost: f32) {
        self.boost = boost;
    }

    /// The cells of this column.
    #[inline]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Every proximal synapse, connected or not.
    #[inline]
    pub fn proximal_synapses(&self) -> &[Synapse] {
        &self.proximal_synapses
    }

    /// Mutable proximal synapses. The set of synapses itself is fixed.
    #[inline]
    pub fn proximal_synapses_mut(&mut self) -> &mut [Synapse] {
        &mut self.proximal_synapses
    }

    /// Yields the proximal synapses whose permanence is above `connected_threshold`.
    /// Evaluated lazily on every call, so it always reflects the latest permanences.
    #[inline]
    pub fn connected_synapses(
        &self,
        connected_threshold: f32,
    ) -> impl Iterator<Item = &Synapse> + '_ {
        self.proximal_synapses
            .iter()
            .filter(move |syn| syn.is_connected(connected_threshold))
    }
}
