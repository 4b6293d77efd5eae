// Drop scoring: projected-value gap to the next K alternatives in a pool.

use std::collections::HashMap;

use crate::draft::{Player, PlayerId};

/// Score every player in a ranked pool, writing into `out`.
///
/// `drop(rank i) = value(i) - mean(value(i+1) .. value(i + min(k, rest)))`.
/// The last player in the pool has no successors and receives no entry;
/// with fewer than `k` successors the mean is taken over however many
/// remain. Entries already in `out` are overwritten.
pub fn score_pool(pool: &[&Player], k: usize, out: &mut HashMap<PlayerId, f64>) {
    for (i, player) in pool.iter().enumerate() {
        let Some(points) = player.projected_points else {
            continue;
        };

        let window_end = (i + 1 + k).min(pool.len());
        let successors = &pool[i + 1..window_end];
        if successors.is_empty() {
            continue;
        }

        let values: Vec<f64> = successors
            .iter()
            .filter_map(|p| p.projected_points)
            .collect();
        if values.is_empty() {
            continue;
        }

        let mean = values.iter().sum::<f64>() / values.len() as f64;
        out.insert(player.id, points - mean);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
