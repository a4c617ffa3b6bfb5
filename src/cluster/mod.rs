//! Clustering of fused document vectors.
//!
//! This module provides the two partitioning strategies and the
//! [`Clusterer`] facade that dispatches between them. The strategy is a
//! closed enum rather than an open string, so a typo in configuration is
//! rejected once at the parse boundary instead of surfacing mid-batch.

pub mod dbscan;
pub mod fusion;
pub mod kmeans;

use crate::core::constants::{KMEANS_MAX_ITERATIONS, KMEANS_RESTARTS, KMEANS_SEED};
use crate::core::{ClusteringConfig, PipelineError, PipelineResult};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

pub use fusion::{fuse, standardize};

/// The supported partitioning strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClusteringMethod {
    /// Density-based grouping over cosine distance. Discovers the cluster
    /// count and labels unreachable vectors with the noise sentinel `-1`.
    Density,
    /// Centroid-based partitioning into a requested number of groups.
    /// Every vector gets a non-negative label.
    Centroid,
}

impl ClusteringMethod {
    /// Name used in configuration files and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            ClusteringMethod::Density => "density",
            ClusteringMethod::Centroid => "centroid",
        }
    }
}

impl fmt::Display for ClusteringMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClusteringMethod {
    type Err = PipelineError;

    /// Parses a method name, rejecting anything but the two supported
    /// strategies with [`PipelineError::UnsupportedMethod`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "density" => Ok(ClusteringMethod::Density),
            "centroid" => Ok(ClusteringMethod::Centroid),
            other => Err(PipelineError::unsupported_method(other)),
        }
    }
}

/// Dispatches fused vectors to the configured partitioning strategy.
#[derive(Debug, Clone)]
pub struct Clusterer {
    config: ClusteringConfig,
}

impl Clusterer {
    /// Creates a clusterer with the given configuration.
    pub fn new(config: ClusteringConfig) -> Self {
        Self { config }
    }

    /// Partitions the fused vectors, returning one label per input row.
    ///
    /// `n_clusters` overrides the configured centroid-strategy cluster
    /// count when given; the density strategy ignores it. With fewer
    /// documents than requested clusters the centroid strategy silently
    /// reduces to one cluster per document.
    pub fn cluster(
        &self,
        fused_vectors: &Array2<f32>,
        method: ClusteringMethod,
        n_clusters: Option<usize>,
    ) -> PipelineResult<Vec<i32>> {
        let n = fused_vectors.nrows();
        if n == 0 {
            return Ok(Vec::new());
        }

        let labels = match method {
            ClusteringMethod::Density => {
                debug!(
                    "Density clustering {} vectors (eps {}, min_samples {})",
                    n, self.config.eps, self.config.min_samples
                );
                dbscan::cluster(fused_vectors, self.config.eps, self.config.min_samples)
            }
            ClusteringMethod::Centroid => {
                let requested = n_clusters.unwrap_or(self.config.n_clusters).max(1);
                let k = requested.min(n);
                debug!("Centroid clustering {} vectors into {} groups", n, k);
                kmeans::cluster(
                    fused_vectors,
                    k,
                    KMEANS_SEED,
                    KMEANS_RESTARTS,
                    KMEANS_MAX_ITERATIONS,
                )
            }
        };

        debug_assert_eq!(labels.len(), n);
        Ok(labels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NOISE_CLUSTER_ID;
    use ndarray::Array2;

    #[test]
    fn test_method_parsing() {
        assert_eq!(
            "density".parse::<ClusteringMethod>().unwrap(),
            ClusteringMethod::Density
        );
        assert_eq!(
            "centroid".parse::<ClusteringMethod>().unwrap(),
            ClusteringMethod::Centroid
        );
    }

    #[test]
    fn test_unknown_method_rejected() {
        let err = "spectral".parse::<ClusteringMethod>().unwrap_err();
        match err {
            PipelineError::UnsupportedMethod { method } => assert_eq!(method, "spectral"),
            other => panic!("expected UnsupportedMethod, got {other:?}"),
        }
    }

    #[test]
    fn test_method_serde_round_trip() {
        let json = serde_json::to_string(&ClusteringMethod::Centroid).unwrap();
        assert_eq!(json, "\"centroid\"");
        let parsed: ClusteringMethod = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, ClusteringMethod::Centroid);
    }

    #[test]
    fn test_centroid_count_clamped_to_documents() {
        let clusterer = Clusterer::new(ClusteringConfig::default());
        let data = Array2::from_shape_fn((3, 4), |(row, col)| (row * 4 + col) as f32);
        let mut labels = clusterer
            .cluster(&data, ClusteringMethod::Centroid, Some(5))
            .unwrap();
        labels.sort_unstable();
        assert_eq!(labels, vec![0, 1, 2]);
    }

    #[test]
    fn test_density_never_drops_documents() {
        let clusterer = Clusterer::new(ClusteringConfig::default());
        let data = Array2::from_shape_fn((4, 3), |(row, _)| if row < 2 { 1.0 } else { -1.0 });
        let labels = clusterer
            .cluster(&data, ClusteringMethod::Density, None)
            .unwrap();
        assert_eq!(labels.len(), 4);
        assert!(labels
            .iter()
            .all(|&label| label >= 0 || label == NOISE_CLUSTER_ID));
    }

    #[test]
    fn test_empty_input_yields_no_labels() {
        let clusterer = Clusterer::new(ClusteringConfig::default());
        let data = Array2::<f32>::zeros((0, 8));
        assert!(clusterer
            .cluster(&data, ClusteringMethod::Density, None)
            .unwrap()
            .is_empty());
    }
}
