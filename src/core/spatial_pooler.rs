//! The `SpatialPooler` turns a binary input vector into a sparse set of active columns.
//!
//! Every timestep runs three strictly ordered phases over the columns of its `Region`:
//! - Overlap: each column counts its connected proximal synapses whose input bit is on. Counts
//!   below `min_overlap` are zeroed, the rest are multiplied by the column's boost.
//! - Inhibition: each column with a positive overlap competes against its neighbors within the
//!   inhibition radius and wins when it reaches the k-th largest overlap of that neighborhood.
//! - Learning: on every winning column, synapses that read an active bit are strengthened and
//!   the others are weakened (Hebbian rule). Skipped when learning is disabled.
//!
//! The winners are then written once into the `ActiveColumnsLog`.
//!
//! A phase completes for all columns before the next one starts. Phase 1 evaluates every column
//! before writing anything, so a bad input aborts the timestep without touching column state.
//!
//! Boosts are not adapted here. They are a knob on each column (see `Region::set_boost`) that an
//! outside policy such as `DutyCycleBooster` may turn between timesteps. The boost is the only
//! column state a caller can change; columns themselves cannot be replaced or reordered.

use super::{
    active_columns::ActiveColumnsLog, inhibition, region::Region,
    synapses::SynapsePermanenceOptions,
};
use crate::error::{Result, SpatialPoolerError};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

fn default_desired_local_activity() -> f32 {
    5.0
}

fn default_inhibition_radius() -> usize {
    1
}

/// Parameters of a spatial pooler. Everything except `min_overlap` has a default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpatialPoolerConfig {
    /// Raw overlaps below this value are zeroed and the column cannot win.
    pub min_overlap: f32,

    /// Approximate number of winners per neighborhood. Fractions are floored, with a minimum of one.
    #[serde(default = "default_desired_local_activity")]
    pub desired_local_activity: f32,

    /// Radius (in column space, along every dimension) of the neighborhood a column competes in.
    #[serde(default = "default_inhibition_radius")]
    pub inhibition_radius: usize,

    /// Connected threshold and learning step sizes.
    #[serde(default)]
    pub permanence: SynapsePermanenceOptions,

    /// Maximum number of timesteps kept in the active-columns log. `None` keeps everything.
    #[serde(default)]
    pub log_retention: Option<usize>,
}

impl SpatialPoolerConfig {
    pub fn new(min_overlap: f32) -> Self {
        Self {
            min_overlap,
            desired_local_activity: default_desired_local_activity(),
            inhibition_radius: default_inhibition_radius(),
            permanence: SynapsePermanenceOptions::default(),
            log_retention: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.min_overlap.is_finite() && self.min_overlap >= 0.0) {
            return Err(SpatialPoolerError::invalid(
                "min_overlap",
                format!("must be a non-negative number, got {}", self.min_overlap),
            ));
        }
        if !(self.desired_local_activity.is_finite() && self.desired_local_activity > 0.0) {
            return Err(SpatialPoolerError::invalid(
                "desired_local_activity",
                format!("must be positive, got {}", self.desired_local_activity),
            ));
        }
        if self.log_retention == Some(0) {
            return Err(SpatialPoolerError::invalid(
                "log_retention",
                "must keep at least one timestep",
            ));
        }
        self.permanence.validate()
    }
}

/// Runs spatial pooling over one region and keeps the history of its winners.
#[derive(Debug)]
pub struct SpatialPooler {
    config: SpatialPoolerConfig,

    region: Region,

    /// Winners of every recorded timestep.
    log: ActiveColumnsLog,

    /// Winners of the latest computed timestep.
    winner_columns: Vec<usize>,

    /// The total number of compute iterations performed so far (whether learning or not).
    iteration_num: u64,

    /// The number of compute iterations performed so far with learning enabled.
    iteration_learn_num: u64,
}

impl SpatialPooler {
    /// Creates a pooler over `region`. Fails fast on an invalid configuration or an empty region.
    pub fn new(config: SpatialPoolerConfig, region: Region) -> Result<Self> {
        config.validate()?;
        if region.is_empty() {
            return Err(SpatialPoolerError::invalid(
                "region",
                "a region needs at least one column",
            ));
        }

        info!(
            "spatial pooler over {} columns: min overlap {}, desired local activity {}, inhibition radius {}",
            region.len(),
            config.min_overlap,
            config.desired_local_activity,
            config.inhibition_radius
        );

        Ok(Self {
            log: ActiveColumnsLog::new(config.log_retention),
            winner_columns: Vec::new(),
            iteration_num: 0,
            iteration_learn_num: 0,
            config,
            region,
        })
    }

    /// The validated configuration.
    #[inline]
    pub fn config(&self) -> &SpatialPoolerConfig {
        &self.config
    }

    /// The columns and their topology.
    #[inline]
    pub fn region(&self) -> &Region {
        &self.region
    }

    /// The region, for adapting column boosts between timesteps through `Region::set_boost`.
    #[inline]
    pub fn region_mut(&mut self) -> &mut Region {
        &mut self.region
    }

    /// Winners of every recorded timestep still retained.
    #[inline]
    pub fn active_columns_log(&self) -> &ActiveColumnsLog {
        &self.log
    }

    /// Winners of the latest computed timestep.
    #[inline]
    pub fn winner_columns(&self) -> &[usize] {
        &self.winner_columns
    }

    /// Successful `compute` calls so far.
    #[inline]
    pub fn iteration_num(&self) -> u64 {
        self.iteration_num
    }

    /// Successful `compute` calls with learning on.
    #[inline]
    pub fn iteration_learn_num(&self) -> u64 {
        self.iteration_learn_num
    }

    /// Current overlap of every column.
    pub fn overlaps(&self) -> Vec<f32> {
        self.region.columns().iter().map(|c| c.overlap()).collect()
    }

    /// Processes the input of `timestep`:
    /// - rejects timesteps that are already recorded or older than the log's retention,
    /// - calculates the boosted overlap of every column,
    /// - selects winners through local inhibition,
    /// - adapts the winners' synapses if `learn` is true,
    /// - records the winners in the log and returns them.
    ///
    /// On error nothing is recorded and, for out-of-range inputs, no column state is changed. A
    /// rejected timestep stays open and can be computed again with a corrected input, even after
    /// later timesteps were recorded.
    pub fn compute(&mut self, timestep: u64, input: &[bool], learn: bool) -> Result<&[usize]> {
        if let Err(err) = self.log.check_timestep(timestep) {
            warn!("rejecting timestep {}: {}", timestep, err);
            return Err(err);
        }

        if let Err(err) = self.calculate_overlaps(input, timestep) {
            warn!("aborting timestep {}: {}", timestep, err);
            return Err(err);
        }

        let winners = self.inhibit_columns();

        if learn {
            self.adapt_synapses(&winners);
        }

        self.log.record(timestep, winners.clone())?;
        self.winner_columns = winners;
        self.update_iteration_number(learn);

        debug!(
            "timestep {}: {} of {} columns active (learning {})",
            timestep,
            self.winner_columns.len(),
            self.region.len(),
            if learn { "on" } else { "off" }
        );

        Ok(&self.winner_columns)
    }

    /// Phase 1. Calculates the overlap of every column with `input`:
    /// - refreshes the active flag of every proximal synapse from its input bit,
    /// - counts connected synapses whose input bit is on,
    /// - zeroes counts below `min_overlap` and boosts the others.
    ///
    /// All raw overlaps are evaluated before any column is written, so an `OutOfRange`
    /// error leaves every column as it was. Repeated calls with the same input give the same overlaps.
    pub fn calculate_overlaps(&mut self, input: &[bool], timestep: u64) -> Result<()> {
        let connected = self.config.permanence.connected;

        let raw_overlaps = self
            .region
            .columns()
            .iter()
            .map(|col| {
                col.proximal_synapses()
                    .iter()
                    .try_fold(0.0f32, |acc, syn| -> Result<f32> {
                        let bit = syn.source_input(input, timestep, col.index())?;
                        Ok(if bit && syn.is_connected(connected) {
                            acc + 1.0
                        } else {
                            acc
                        })
                    })
            })
            .collect::<Result<Vec<f32>>>()?;

        for (col, raw) in self.region.columns_mut().iter_mut().zip(raw_overlaps) {
            for syn in col.proximal_synapses_mut() {
                // Indices were checked above.
                syn.set_active(input[syn.source_index()]);
            }

            col.reset_overlap();
            col.add_overlap(raw);

            if col.overlap() < self.config.min_overlap {
                col.reset_overlap();
            } else {
                col.apply_boost();
            }
        }

        Ok(())
    }

    /// Phase 2. Selects the winners from the overlaps of the latest phase 1.
    pub fn inhibit_columns(&self) -> Vec<usize> {
        inhibition::inhibit_columns(
            &self.region,
            self.config.inhibition_radius,
            self.config.desired_local_activity,
        )
    }

    /// Phase 3. Adjusts the proximal synapses of each winner column:
    /// - increments the permanence of synapses whose input bit was active,
    /// - decrements the permanence of synapses whose input bit was inactive.
    ///
    /// Permanences stay clamped to `[0, 1]`. Distal synapses of the cells are not touched.
    pub fn adapt_synapses(&mut self, winners: &[usize]) {
        let options = self.config.permanence;

        for &col in winners {
            let Some(column) = self.region.column_mut(col) else {
                continue;
            };

            for syn in column.proximal_synapses_mut() {
                if syn.is_active() {
                    syn.inc_permanence(options.active_increment);
                } else {
                    syn.dec_permanence(options.inactive_decrement);
                }
            }
        }
    }

    fn update_iteration_number(&mut self, learn: bool) {
        self.iteration_num += 1;
        if learn {
            self.iteration_learn_num += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{column::Column, synapses::Synapse, topology::Topology};

    fn single_column_pooler(min_overlap: f32) -> SpatialPooler {
        let column = Column::new(0, 4, vec![Synapse::new(0, 0.5)]);
        let region = Region::new(vec![column], Topology::line(1, false).unwrap()).unwrap();
        SpatialPooler::new(SpatialPoolerConfig::new(min_overlap), region).unwrap()
    }

    #[test]
    fn test_config_defaults() {
        let config = SpatialPoolerConfig::new(1.0);
        assert_eq!(config.desired_local_activity, 5.0);
        assert_eq!(config.permanence.connected, 0.2);
        assert_eq!(config.permanence.active_increment, 0.1);
        assert_eq!(config.permanence.inactive_decrement, 0.05);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_from_json_requires_only_min_overlap() {
        let config: SpatialPoolerConfig =
            serde_json::from_str(r#"{ "min_overlap": 2.0, "inhibition_radius": 3 }"#).unwrap();
        assert_eq!(config.min_overlap, 2.0);
        assert_eq!(config.inhibition_radius, 3);
        assert_eq!(config.desired_local_activity, 5.0);
        assert_eq!(config.permanence, SynapsePermanenceOptions::default());

        assert!(serde_json::from_str::<SpatialPoolerConfig>("{}").is_err());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let region = || {
            Region::new(
                vec![Column::new(0, 4, Vec::new())],
                Topology::line(1, false).unwrap(),
            )
            .unwrap()
        };

        let result = SpatialPooler::new(SpatialPoolerConfig::new(-1.0), region());
        assert!(matches!(
            result,
            Err(SpatialPoolerError::InvalidConfiguration { name: "min_overlap", .. })
        ));

        let mut config = SpatialPoolerConfig::new(0.0);
        config.desired_local_activity = 0.0;
        assert!(SpatialPooler::new(config, region()).is_err());

        let mut config = SpatialPoolerConfig::new(0.0);
        config.log_retention = Some(0);
        assert!(SpatialPooler::new(config, region()).is_err());
    }

    #[test]
    fn test_overlap_is_boosted() {
        let mut sp = single_column_pooler(0.0);
        sp.region_mut().set_boost(0, 2.5).unwrap();
        sp.calculate_overlaps(&[true], 0).unwrap();
        assert_eq!(sp.overlaps(), vec![2.5]);
    }

    #[test]
    fn test_overlap_below_minimum_is_zeroed() {
        let mut sp = single_column_pooler(2.0);
        sp.region_mut().set_boost(0, 3.0).unwrap();
        sp.calculate_overlaps(&[true], 0).unwrap();
        assert_eq!(sp.overlaps(), vec![0.0]);
    }

    #[test]
    fn test_repeated_overlap_is_idempotent() {
        let mut sp = single_column_pooler(0.0);
        sp.region_mut().set_boost(0, 1.5).unwrap();
        sp.calculate_overlaps(&[true], 0).unwrap();
        let first = sp.overlaps();
        sp.calculate_overlaps(&[true], 0).unwrap();
        assert_eq!(first, sp.overlaps());
    }

    #[test]
    fn test_out_of_range_aborts_timestep() {
        let columns = vec![
            Column::new(0, 4, vec![Synapse::new(0, 0.5)]),
            Column::new(1, 4, vec![Synapse::new(5, 0.5)]),
        ];
        let region = Region::new(columns, Topology::line(2, false).unwrap()).unwrap();
        let mut sp = SpatialPooler::new(SpatialPoolerConfig::new(0.0), region).unwrap();

        sp.compute(0, &[true, true, true, true, true, true], true).unwrap();
        let before = sp.overlaps();
        let perms_before: Vec<f32> = sp.region().columns()[0]
            .proximal_synapses()
            .iter()
            .map(|s| s.permanence())
            .collect();

        let err = sp.compute(1, &[false, false], true).unwrap_err();
        assert_eq!(
            err,
            SpatialPoolerError::OutOfRange {
                timestep: 1,
                column: 1,
                source_index: 5,
                input_len: 2,
            }
        );
        assert_eq!(sp.overlaps(), before);
        assert!(sp.region().columns()[0].proximal_synapses()[0].is_active());
        assert_eq!(
            sp.region().columns()[0].proximal_synapses()[0].permanence(),
            perms_before[0]
        );
        assert!(!sp.active_columns_log().contains(1));
        assert_eq!(sp.iteration_num(), 1);

        // The failed timestep can be retried with corrected input.
        assert!(sp.compute(1, &[false; 6], true).is_ok());
    }

    #[test]
    fn test_duplicate_timestep_rejected() {
        let mut sp = single_column_pooler(0.0);
        sp.compute(3, &[true], true).unwrap();
        assert!(matches!(
            sp.compute(3, &[true], true),
            Err(SpatialPoolerError::DuplicateTimestep { timestep: 3 })
        ));
        assert_eq!(sp.iteration_num(), 1);
    }

    #[test]
    fn test_skipped_timestep_can_be_retried_later() {
        let column = Column::new(0, 4, vec![Synapse::new(2, 0.5)]);
        let region = Region::new(vec![column], Topology::line(1, false).unwrap()).unwrap();
        let mut sp = SpatialPooler::new(SpatialPoolerConfig::new(0.0), region).unwrap();

        assert!(matches!(
            sp.compute(3, &[true], true),
            Err(SpatialPoolerError::OutOfRange { timestep: 3, .. })
        ));
        sp.compute(4, &[false, false, false], true).unwrap();

        // Timestep 3 was never recorded, so a corrected input is accepted.
        let winners = sp.compute(3, &[false, false, true], true).unwrap().to_vec();
        assert_eq!(winners, vec![0]);
        assert_eq!(sp.active_columns_log().get(3), Some(&[0][..]));
        assert_eq!(sp.active_columns_log().get(4), Some(&[][..]));
        assert_eq!(sp.iteration_num(), 2);
    }

    #[test]
    fn test_timesteps_past_retention_are_stale() {
        let column = Column::new(0, 4, vec![Synapse::new(0, 0.5)]);
        let region = Region::new(vec![column], Topology::line(1, false).unwrap()).unwrap();
        let mut config = SpatialPoolerConfig::new(0.0);
        config.log_retention = Some(1);
        let mut sp = SpatialPooler::new(config, region).unwrap();

        sp.compute(5, &[true], false).unwrap();
        sp.compute(6, &[true], false).unwrap();
        assert_eq!(
            sp.compute(2, &[true], false).unwrap_err(),
            SpatialPoolerError::StaleTimestep {
                timestep: 2,
                evicted_through: 5
            }
        );
        assert_eq!(sp.iteration_num(), 2);
    }

    #[test]
    fn test_inference_does_not_learn() {
        let mut sp = single_column_pooler(0.0);
        sp.compute(0, &[true], false).unwrap();
        assert_eq!(sp.winner_columns(), &[0]);
        assert_eq!(
            sp.region().columns()[0].proximal_synapses()[0].permanence(),
            0.5
        );
        assert_eq!(sp.iteration_num(), 1);
        assert_eq!(sp.iteration_learn_num(), 0);
    }

    #[test]
    fn test_learning_touches_only_proximal_synapses_of_winners() {
        let columns = vec![
            Column::new(0, 4, vec![Synapse::new(0, 0.5), Synapse::new(1, 0.5)]),
            Column::new(1, 4, vec![Synapse::new(1, 0.5)]),
        ];
        let region = Region::new(columns, Topology::line(2, false).unwrap()).unwrap();
        let mut config = SpatialPoolerConfig::new(0.0);
        config.desired_local_activity = 1.0;
        let mut sp = SpatialPooler::new(config, region).unwrap();

        let winners = sp.compute(0, &[true, false], true).unwrap().to_vec();
        assert_eq!(winners, vec![0]);

        let perms = |sp: &SpatialPooler, col: usize| -> Vec<f32> {
            sp.region().columns()[col]
                .proximal_synapses()
                .iter()
                .map(|s| s.permanence())
                .collect()
        };
        assert!((perms(&sp, 0)[0] - 0.6).abs() < 1e-6);
        assert!((perms(&sp, 0)[1] - 0.45).abs() < 1e-6);
        assert_eq!(perms(&sp, 1), vec![0.5]);
        assert!(sp.region().columns()[0]
            .cells()
            .iter()
            .all(|cell| cell.synapses().is_empty()));
    }
}
