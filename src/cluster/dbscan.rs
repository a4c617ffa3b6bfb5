//! Density-based clustering over cosine distance.
//!
//! Groups fused vectors by density reachability: a vector with at least
//! `min_samples` neighbors (itself included) within `eps` cosine distance
//! is a core point, and every vector reachable through a chain of core
//! points joins its cluster. Vectors reachable from no dense neighborhood
//! keep the noise label `-1`. The number of clusters is discovered, not
//! chosen a priori.

use crate::domain::NOISE_CLUSTER_ID;
use ndarray::{Array2, ArrayView1};
use std::collections::VecDeque;

/// Internal marker for points not yet visited by the scan.
const UNVISITED: i32 = -2;

/// Cosine distance between two vectors, in `[0, 2]`.
///
/// A zero-norm vector has no direction; distance to it is defined as the
/// maximum-dissimilarity 1.0 unless both vectors are zero, which compare
/// as identical.
pub fn cosine_distance(a: ArrayView1<'_, f32>, b: ArrayView1<'_, f32>) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 && norm_b == 0.0 {
        return 0.0;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }
    1.0 - dot / (norm_a * norm_b)
}

/// Runs the density scan and returns one label per input row.
///
/// Labels are `0..k-1` for the `k` discovered groups and
/// [`NOISE_CLUSTER_ID`] for points in no sufficiently dense neighborhood.
pub fn cluster(data: &Array2<f32>, eps: f32, min_samples: usize) -> Vec<i32> {
    let n = data.nrows();
    if n == 0 {
        return Vec::new();
    }

    // Neighborhoods within eps, the point itself included.
    let neighborhoods: Vec<Vec<usize>> = (0..n)
        .map(|i| {
            (0..n)
                .filter(|&j| cosine_distance(data.row(i), data.row(j)) <= eps)
                .collect()
        })
        .collect();

    let mut labels = vec![UNVISITED; n];
    let mut next_cluster = 0i32;

    for seed in 0..n {
        if labels[seed] != UNVISITED {
            continue;
        }
        if neighborhoods[seed].len() < min_samples {
            labels[seed] = NOISE_CLUSTER_ID;
            continue;
        }

        // Grow a new cluster outward from this core point.
        let cluster_id = next_cluster;
        next_cluster += 1;
        labels[seed] = cluster_id;

        let mut frontier: VecDeque<usize> = neighborhoods[seed].iter().copied().collect();
        while let Some(point) = frontier.pop_front() {
            if labels[point] == NOISE_CLUSTER_ID {
                // Border point: density-reachable but not itself dense.
                labels[point] = cluster_id;
            }
            if labels[point] != UNVISITED {
                continue;
            }
            labels[point] = cluster_id;
            if neighborhoods[point].len() >= min_samples {
                frontier.extend(neighborhoods[point].iter().copied());
            }
        }
    }

    labels
}
