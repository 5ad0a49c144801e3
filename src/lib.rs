//! Spatial pooling core of Hierarchical Temporal Memory (HTM).
//!
//! A binary input vector is mapped onto a sparse set of active columns:
//! - every column scores its overlap with the input through its connected proximal synapses,
//! - columns compete against their spatial neighbors (local inhibition),
//! - winners reinforce the synapses that matched the input and weaken the rest.
//!
//! The winners of every timestep are kept in an [`ActiveColumnsLog`](crate::core::active_columns::ActiveColumnsLog)
//! for downstream consumers such as a temporal memory.

pub mod core;
pub mod error;

pub use crate::core::{
    active_columns::ActiveColumnsLog,
    boosting::DutyCycleBooster,
    column::{Cell, Column},
    region::{Region, RegionBuilder},
    spatial_pooler::{SpatialPooler, SpatialPoolerConfig},
    synapses::{Synapse, SynapsePermanenceOptions},
    topology::Topology,
};
pub use crate::error::{Result, SpatialPoolerError};
