//! Local inhibition: columns compete for activation against their spatial neighbors.
//!
//! For every column with a positive overlap, the neighborhood is the set of columns within the
//! inhibition radius plus the column itself. The column wins when its overlap reaches the k-th
//! largest overlap of that neighborhood, with `k` derived from the desired local activity.
//! Ties at the boundary all win, so a neighborhood may produce more than `k` winners.
//!
//! The result is a locally sparse code: roughly `k` winners per neighborhood, independent of the
//! total number of columns.

use super::region::Region;
use log::trace;
use std::cmp::Ordering;

/// Returns the `k`-th largest value (1-indexed) of `values`.
///
/// `None` when `k` is zero or exceeds the number of values. NaNs sort below every number.
pub fn kth_score(values: &[f32], k: usize) -> Option<f32> {
    if k == 0 || k > values.len() {
        return None;
    }

    let mut scratch = values.to_vec();
    let (_, kth, _) = scratch.select_nth_unstable_by(k - 1, descending);
    Some(*kth)
}

fn descending(a: &f32, b: &f32) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.total_cmp(a),
    }
}

/// Converts the (possibly fractional) desired local activity into a rank: floor, but at least 1.
#[inline]
pub fn local_rank(desired_local_activity: f32) -> usize {
    (desired_local_activity.floor() as usize).max(1)
}

/// Selects the winners among the region's columns from their current overlaps.
///
/// Reads overlaps only; returns the winning column indices in ascending order. A neighborhood
/// smaller than the rank lets every positive column in it win.
pub fn inhibit_columns(
    region: &Region,
    inhibition_radius: usize,
    desired_local_activity: f32,
) -> Vec<usize> {
    let overlaps: Vec<f32> = region.columns().iter().map(|c| c.overlap()).collect();
    let rank = local_rank(desired_local_activity);

    let mut winners = Vec::new();
    let mut neighborhood = Vec::new();

    for (col, &overlap) in overlaps.iter().enumerate() {
        if !(overlap > 0.0) {
            continue;
        }

        neighborhood.clear();
        neighborhood.push(overlap);
        neighborhood.extend(region.neighbors(col, inhibition_radius).map(|n| overlaps[n]));

        let k = rank.min(neighborhood.len());
        let Some(threshold) = kth_score(&neighborhood, k) else {
            continue;
        };

        trace!(
            "column {}: overlap {} vs local threshold {} over {} columns",
            col,
            overlap,
            threshold,
            neighborhood.len()
        );

        if overlap >= threshold {
            winners.push(col);
        }
    }

    winners
}
