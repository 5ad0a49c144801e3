//! Errors raised by the spatial pooling core.
//!
//! Out-of-range permanences and overlaps are not errors: they are clamped or reset where they occur.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SpatialPoolerError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SpatialPoolerError {
    /// A proximal synapse points past the end of the input vector.
    /// Aborts the whole timestep before any column state is written.
    #[error(
        "timestep {timestep}: column {column} reads input bit {source_index}, but the input has only {input_len} bits"
    )]
    OutOfRange {
        timestep: u64,
        column: usize,
        source_index: usize,
        input_len: usize,
    },

    /// Rejected while building a region or a pooler, never mid-cycle.
    #[error("invalid configuration '{name}': {message}")]
    InvalidConfiguration { name: &'static str, message: String },

    /// The active-columns log never overwrites an entry.
    #[error("timestep {timestep} already recorded")]
    DuplicateTimestep { timestep: u64 },

    /// Retention has dropped entries at or after this timestep, so it can no longer be recorded.
    #[error("timestep {timestep} is at or before evicted timestep {evicted_through}")]
    StaleTimestep { timestep: u64, evicted_through: u64 },

    #[error("column {column} does not exist in a region of {len} columns")]
    UnknownColumn { column: usize, len: usize },
}

impl SpatialPoolerError {
    pub(crate) fn invalid(name: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            name,
            message: message.into(),
        }
    }
}
