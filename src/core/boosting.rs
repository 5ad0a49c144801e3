//! Boost adaptation through active duty cycles.
//!
//! The spatial pooler only multiplies overlaps by each column's boost; it never changes the boost.
//! `DutyCycleBooster` is one policy for doing so, run by the caller after each timestep.
//!
//! What are duty cycles?
//! - They are rolling metrics measuring how often each column wins over time.
//! - The active duty cycle (ADC) is an exponential moving average over `duty_cycle_period` timesteps.
//! - Every `update_period` timesteps, the minimum acceptable ADC is set to a fraction of the
//!   highest ADC in the region.
//! - Columns under that minimum get a boost that grows linearly up to `max_boost` as their ADC
//!   approaches zero. Columns at or above it are reset to a boost of 1.0.
//!
//! This keeps columns from becoming permanently uncompetitive.

use super::region::Region;
use crate::error::{Result, SpatialPoolerError};
use log::debug;

#[derive(Debug, Clone)]
pub struct DutyCycleBooster {
    /// The time window over which active duty cycles are averaged.
    pub duty_cycle_period: u32,

    /// The largest boost an idle column can get.
    pub max_boost: f32,

    /// Fraction of the maximum active duty cycle under which a column is considered underactive.
    pub min_percentage_active_duty_cycles: f32,

    /// How often (in timesteps) the minimum duty cycles are recalculated.
    pub update_period: u32,

    /// Updates folded in so far.
    iteration_num: u64,

    active_duty_cycles: Vec<f32>,

    min_active_duty_cycles: Vec<f32>,
}

impl DutyCycleBooster {
    pub fn new(num_columns: usize, duty_cycle_period: u32, max_boost: f32) -> Result<Self> {
        if duty_cycle_period == 0 {
            return Err(SpatialPoolerError::invalid(
                "duty_cycle_period",
                "must be at least one timestep",
            ));
        }
        if !(max_boost.is_finite() && max_boost >= 1.0) {
            return Err(SpatialPoolerError::invalid(
                "max_boost",
                format!("must be at least 1.0, got {max_boost}"),
            ));
        }

        Ok(Self {
            duty_cycle_period,
            max_boost,
            min_percentage_active_duty_cycles: 0.001,
            update_period: 50,
            iteration_num: 0,
            active_duty_cycles: vec![0.0; num_columns],
            min_active_duty_cycles: vec![0.0; num_columns],
        })
    }

    /// Moving average of how often each column won.
    #[inline]
    pub fn active_duty_cycles(&self) -> &[f32] {
        &self.active_duty_cycles
    }

    /// Per-column threshold under which a column gets boosted.
    #[inline]
    pub fn min_active_duty_cycles(&self) -> &[f32] {
        &self.min_active_duty_cycles
    }

    /// Folds the winners of one timestep into the duty cycles and writes new boosts into `region`.
    pub fn update(&mut self, region: &mut Region, winners: &[usize]) -> Result<()> {
        if region.len() != self.active_duty_cycles.len() {
            return Err(SpatialPoolerError::invalid(
                "region",
                format!(
                    "booster tracks {} columns, region has {}",
                    self.active_duty_cycles.len(),
                    region.len()
                ),
            ));
        }

        self.iteration_num += 1;
        self.update_duty_cycles(winners);

        if self.update_period > 0 && self.iteration_num % u64::from(self.update_period) == 0 {
            self.update_min_duty_cycles();
        }

        self.update_boost_factors(region)
    }

    /// Decays every column's active duty cycle and credits the winners.
    fn update_duty_cycles(&mut self, winners: &[usize]) {
        let period = self.iteration_num.min(u64::from(self.duty_cycle_period)) as f32;
        let factor = (period - 1.0) / period;
        let credit = 1.0 / period;

        self.active_duty_cycles
            .iter_mut()
            .for_each(|duty| *duty *= factor);

        for &col in winners {
            if let Some(duty) = self.active_duty_cycles.get_mut(col) {
                *duty += credit;
            }
        }
    }

    /// Sets every column's minimum to a fraction of the region-wide maximum duty cycle.
    fn update_min_duty_cycles(&mut self) {
        let max = self
            .active_duty_cycles
            .iter()
            .fold(0.0f32, |acc, &x| acc.max(x));
        self.min_active_duty_cycles
            .fill(self.min_percentage_active_duty_cycles * max);

        debug!(
            "booster: minimum active duty cycle now {}",
            self.min_percentage_active_duty_cycles * max
        );
    }

    fn update_boost_factors(&self, region: &mut Region) -> Result<()> {
        if !self.min_active_duty_cycles.iter().any(|&min| min > 0.0) {
            return Ok(());
        }

        for (index, (&min, &active)) in self
            .min_active_duty_cycles
            .iter()
            .zip(&self.active_duty_cycles)
            .enumerate()
        {
            let boost = if active > min {
                1.0
            } else {
                let min = min.max(f32::EPSILON);
                ((1.0 - self.max_boost) / min) * active + self.max_boost
            };
            region.set_boost(index, boost)?;
        }
        Ok(())
    }
}
