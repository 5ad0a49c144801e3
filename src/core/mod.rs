pub mod active_columns;
pub mod boosting;
pub mod column;
pub mod inhibition;
pub mod region;
pub mod spatial_pooler;
pub mod synapses;
pub mod topology;
