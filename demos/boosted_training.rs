//! This demo runs a Spatial Pooler on skewed input, where one half of the input space is far more
//! active than the other, and lets a `DutyCycleBooster` adapt column boosts between timesteps.
//!
//! Without boosting, columns sensing the quiet half rarely win. The demo prints how many
//! distinct columns won at least once, with and without the booster.

use anyhow::Result;
use htm_sp::{DutyCycleBooster, RegionBuilder, SpatialPooler, SpatialPoolerConfig};
use rand::{rngs::StdRng, Rng, SeedableRng};

fn run(boosting: bool) -> Result<usize> {
    let num_inputs = 200;
    let num_columns = 100;

    let mut builder = RegionBuilder::new(vec![num_inputs], vec![num_columns]);
    builder.potential_radius = Some(20);
    let region = builder.build()?;

    let mut config = SpatialPoolerConfig::new(1.0);
    config.inhibition_radius = 50;
    config.desired_local_activity = 5.0;
    config.log_retention = Some(100);
    let mut spatial_pooler = SpatialPooler::new(config, region)?;

    let mut booster = DutyCycleBooster::new(num_columns, 100, 5.0)?;
    booster.update_period = 20;
    booster.min_percentage_active_duty_cycles = 0.1;

    let mut rng = StdRng::seed_from_u64(99);
    let mut ever_active = vec![false; num_columns];

    for t in 0..2_000u64 {
        let input: Vec<bool> = (0..num_inputs)
            .map(|i| rng.random_bool(if i < num_inputs / 2 { 0.3 } else { 0.05 }))
            .collect();

        let winners = spatial_pooler.compute(t, &input, true)?.to_vec();
        for &col in &winners {
            ever_active[col] = true;
        }

        if boosting {
            booster.update(spatial_pooler.region_mut(), &winners)?;
        }
    }

    Ok(ever_active.iter().filter(|&&active| active).count())
}

fn main() -> Result<()> {
    env_logger::init();

    println!("Training without boosting...");
    let plain = run(false)?;
    println!("Training with duty-cycle boosting...");
    let boosted = run(true)?;

    println!("Columns that ever won: {} without boosting, {} with boosting", plain, boosted);

    Ok(())
}
