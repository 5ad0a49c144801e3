//! This demo trains a Spatial Pooler with local inhibition on a handful of random binary patterns
//! and then checks how stable the learned representations are.
//!
//! Every pattern is presented repeatedly with learning enabled. Afterwards each pattern is run
//! once more in inference mode and the resulting set of active columns is compared with the one
//! produced during the last training pass.
//!
//! Run with `RUST_LOG=debug` to see per-timestep activity.

use anyhow::Result;
use htm_sp::{RegionBuilder, SpatialPooler, SpatialPoolerConfig};
use rand::{rngs::StdRng, Rng, SeedableRng};

fn overlap_ratio(a: &[usize], b: &[usize]) -> f32 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    let shared = a.iter().filter(|col| b.contains(col)).count();
    shared as f32 / a.len().max(b.len()) as f32
}

fn main() -> Result<()> {
    env_logger::init();

    let num_inputs = 400;
    let num_columns = 256;
    let num_patterns = 8;
    let epochs = 30;

    println!("Wiring {} columns onto {} inputs...", num_columns, num_inputs);

    let mut builder = RegionBuilder::new(vec![num_inputs], vec![num_columns]);
    builder.potential_radius = Some(48);
    builder.potential_percentage = 0.5;
    builder.init_connected_percentage = 0.5;
    let region = builder.build()?;

    let mut config = SpatialPoolerConfig::new(3.0);
    config.inhibition_radius = 8;
    config.desired_local_activity = 2.0;
    config.log_retention = Some(1_000);
    let mut spatial_pooler = SpatialPooler::new(config, region)?;

    let mut rng = StdRng::seed_from_u64(1234);
    let patterns: Vec<Vec<bool>> = (0..num_patterns)
        .map(|_| (0..num_inputs).map(|_| rng.random_bool(0.1)).collect())
        .collect();

    println!(
        "Training on {} patterns for {} epochs...",
        num_patterns, epochs
    );

    let mut timestep = 0u64;
    let mut last_seen = vec![Vec::new(); num_patterns];

    for _ in 0..epochs {
        for (i, pattern) in patterns.iter().enumerate() {
            last_seen[i] = spatial_pooler.compute(timestep, pattern, true)?.to_vec();
            timestep += 1;
        }
    }

    println!("Training complete.");

    let mut total_similarity = 0.0;

    for (i, pattern) in patterns.iter().enumerate() {
        let winners = spatial_pooler.compute(timestep, pattern, false)?.to_vec();
        timestep += 1;

        let similarity = overlap_ratio(&winners, &last_seen[i]);
        total_similarity += similarity;

        println!(
            "Pattern {}: {} active columns ({:.1}% sparsity), stability {:.2}",
            i,
            winners.len(),
            100.0 * winners.len() as f32 / num_columns as f32,
            similarity
        );
    }

    println!(
        "Mean stability: {:.2}, timesteps kept in log: {}",
        total_similarity / num_patterns as f32,
        spatial_pooler.active_columns_log().len()
    );

    Ok(())
}
