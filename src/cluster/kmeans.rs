//! Centroid-based clustering.
//!
//! Classic Lloyd iterations: assign every vector to its nearest centroid
//! by Euclidean distance, recompute centroids as the mean of their
//! members, repeat until the centroids stop moving. The whole procedure
//! restarts several times from different seeded initializations and the
//! run with the lowest inertia wins, so results are reproducible for a
//! given seed.

use crate::core::constants::KMEANS_CONVERGENCE_THRESHOLD;
use ndarray::{Array2, ArrayView1};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn squared_distance(a: ArrayView1<'_, f32>, b: ArrayView1<'_, f32>) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).powi(2))
        .sum()
}

/// Runs seeded Lloyd clustering with restarts and returns one label in
/// `0..k` per input row.
///
/// `k` must satisfy `1 <= k <= data.nrows()`; the caller clamps the
/// requested cluster count before calling. Labels are always
/// non-negative: this strategy has no noise sentinel.
pub fn cluster(data: &Array2<f32>, k: usize, seed: u64, restarts: usize, max_iter: usize) -> Vec<i32> {
    let n = data.nrows();
    debug_assert!(k >= 1 && k <= n);

    let mut best_labels = vec![0i32; n];
    let mut best_inertia = f32::INFINITY;

    for restart in 0..restarts.max(1) {
        let mut rng = StdRng::seed_from_u64(seed.wrapping_add(restart as u64));
        let (labels, inertia) = lloyd_run(data, k, &mut rng, max_iter);
        if inertia < best_inertia {
            best_inertia = inertia;
            best_labels = labels;
        }
    }

    best_labels
}

/// One full Lloyd run from a fresh initialization.
fn lloyd_run(data: &Array2<f32>, k: usize, rng: &mut StdRng, max_iter: usize) -> (Vec<i32>, f32) {
    let n = data.nrows();
    let dim = data.ncols();

    // Initialize centroids on k distinct input rows.
    let chosen = rand::seq::index::sample(rng, n, k);
    let mut centroids = Array2::<f32>::zeros((k, dim));
    for (centroid_index, row_index) in chosen.iter().enumerate() {
        centroids.row_mut(centroid_index).assign(&data.row(row_index));
    }

    let mut labels = vec![0usize; n];
    for _ in 0..max_iter {
        // Assignment step.
        for (index, label) in labels.iter_mut().enumerate() {
            let point = data.row(index);
            let mut best = 0usize;
            let mut best_dist = f32::INFINITY;
            for centroid_index in 0..k {
                let dist = squared_distance(point, centroids.row(centroid_index));
                if dist < best_dist {
                    best_dist = dist;
                    best = centroid_index;
                }
            }
            *label = best;
        }

        // Update step.
        let mut sums = Array2::<f32>::zeros((k, dim));
        let mut counts = vec![0usize; k];
        for (index, &label) in labels.iter().enumerate() {
            let mut sum = sums.row_mut(label);
            sum += &data.row(index);
            counts[label] += 1;
        }

        // An empty cluster steals the point furthest from its current
        // assignment, keeping all k centroids populated.
        for centroid_index in 0..k {
            if counts[centroid_index] > 0 {
                continue;
            }
            if let Some(stolen) = furthest_point(data, &centroids, &labels) {
                let old = labels[stolen];
                counts[old] -= 1;
                let mut old_sum = sums.row_mut(old);
                old_sum -= &data.row(stolen);
                labels[stolen] = centroid_index;
                counts[centroid_index] = 1;
                sums.row_mut(centroid_index).assign(&data.row(stolen));
            }
        }

        let mut shift = 0.0f32;
        for centroid_index in 0..k {
            if counts[centroid_index] == 0 {
                continue;
            }
            let mut updated = sums.row(centroid_index).to_owned();
            updated /= counts[centroid_index] as f32;
            shift = shift.max(squared_distance(updated.view(), centroids.row(centroid_index)));
            centroids.row_mut(centroid_index).assign(&updated);
        }

        if shift < KMEANS_CONVERGENCE_THRESHOLD {
            break;
        }
    }

    let inertia = labels
        .iter()
        .enumerate()
        .map(|(index, &label)| squared_distance(data.row(index), centroids.row(label)))
        .sum();

    (labels.into_iter().map(|label| label as i32).collect(), inertia)
}

/// Index of the point with the greatest distance to its assigned
/// centroid, considering only clusters that can spare a member.
fn furthest_point(data: &Array2<f32>, centroids: &Array2<f32>, labels: &[usize]) -> Option<usize> {
    let mut counts = vec![0usize; centroids.nrows()];
    for &label in labels {
        counts[label] += 1;
    }

    let mut best: Option<(usize, f32)> = None;
    for (index, &label) in labels.iter().enumerate() {
        if counts[label] <= 1 {
            continue;
        }
        let dist = squared_distance(data.row(index), centroids.row(label));
        if best.map_or(true, |(_, best_dist)| dist > best_dist) {
            best = Some((index, dist));
        }
    }
    best.map(|(index, _)| index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::constants::{KMEANS_MAX_ITERATIONS, KMEANS_RESTARTS, KMEANS_SEED};
    use ndarray::array;

    fn two_blobs() -> Array2<f32> {
        array![
            [0.0, 0.0],
            [0.1, 0.0],
            [0.0, 0.1],
            [10.0, 10.0],
            [10.1, 10.0],
            [10.0, 10.1],
        ]
    }

    #[test]
    fn test_separated_blobs_split_cleanly() {
        let data = two_blobs();
        let labels = cluster(&data, 2, KMEANS_SEED, KMEANS_RESTARTS, KMEANS_MAX_ITERATIONS);

        assert_eq!(labels.len(), 6);
        assert_eq!(labels[0], labels[1]);
        assert_eq!(labels[1], labels[2]);
        assert_eq!(labels[3], labels[4]);
        assert_eq!(labels[4], labels[5]);
        assert_ne!(labels[0], labels[3]);
    }

    #[test]
    fn test_labels_are_non_negative_and_bounded() {
        let data = two_blobs();
        let labels = cluster(&data, 3, KMEANS_SEED, KMEANS_RESTARTS, KMEANS_MAX_ITERATIONS);
        assert!(labels.iter().all(|&label| (0..3).contains(&label)));
    }

    #[test]
    fn test_k_equal_to_n_gives_one_cluster_per_point() {
        let data = array![[0.0, 0.0], [5.0, 5.0], [10.0, 0.0]];
        let mut labels = cluster(&data, 3, KMEANS_SEED, KMEANS_RESTARTS, KMEANS_MAX_ITERATIONS);
        labels.sort_unstable();
        assert_eq!(labels, vec![0, 1, 2]);
    }

    #[test]
    fn test_deterministic_for_fixed_seed() {
        let data = two_blobs();
        let first = cluster(&data, 2, KMEANS_SEED, KMEANS_RESTARTS, KMEANS_MAX_ITERATIONS);
        let second = cluster(&data, 2, KMEANS_SEED, KMEANS_RESTARTS, KMEANS_MAX_ITERATIONS);
        assert_eq!(first, second);
    }

    #[test]
    fn test_single_cluster() {
        let data = two_blobs();
        let labels = cluster(&data, 1, KMEANS_SEED, 1, KMEANS_MAX_ITERATIONS);
        assert!(labels.iter().all(|&label| label == 0));
    }
}
