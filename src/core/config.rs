//! Configuration for the document clustering pipeline.
//!
//! This module provides the configuration structures for each pipeline
//! stage along with validation. Everything here is externally suppliable
//! (TOML/JSON via [`crate::pipeline::ConfigLoader`]) and carries defaults
//! matching the reference deployment.

use crate::cluster::ClusteringMethod;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during configuration validation.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Error indicating that a configuration is invalid.
    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Error indicating that validation failed.
    #[error("validation failed: {message}")]
    ValidationFailed { message: String },
}

impl ConfigError {
    fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}

/// Configuration for the layout descriptor extractor.
///
/// The dilation kernel is wide and short so that intra-line character gaps
/// bridge into contiguous line blobs before contour extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Width of the rectangular dilation kernel in pixels.
    pub dilation_kernel_width: u32,
    /// Height of the rectangular dilation kernel in pixels.
    pub dilation_kernel_height: u32,
    /// Number of dilation passes applied to the binarized ink mask.
    pub dilation_iterations: usize,
    /// Bounding boxes below this fraction of the page area are discarded
    /// as noise.
    pub min_block_area_fraction: f64,
    /// Number of rows in the ink-density grid.
    pub grid_rows: usize,
    /// Number of columns in the ink-density grid.
    pub grid_cols: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            dilation_kernel_width: 30,
            dilation_kernel_height: 10,
            dilation_iterations: 3,
            min_block_area_fraction: 0.001,
            grid_rows: 3,
            grid_cols: 3,
        }
    }
}

impl LayoutConfig {
    /// Length of the layout vector this configuration produces.
    ///
    /// Block count, total area, one density per grid cell, mean and std of
    /// block vertical centers, and two line counts. 15 with the default
    /// 3x3 grid, regardless of document content.
    pub fn feature_len(&self) -> usize {
        6 + self.grid_rows * self.grid_cols
    }

    /// Validates the layout configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dilation_kernel_width == 0 || self.dilation_kernel_height == 0 {
            return Err(ConfigError::invalid(
                "dilation kernel dimensions must be at least 1",
            ));
        }
        if self.dilation_iterations == 0 {
            return Err(ConfigError::invalid("dilation iterations must be at least 1"));
        }
        if !(0.0..1.0).contains(&self.min_block_area_fraction) {
            return Err(ConfigError::invalid(format!(
                "min block area fraction must lie in [0, 1), got {}",
                self.min_block_area_fraction
            )));
        }
        if self.grid_rows == 0 || self.grid_cols == 0 {
            return Err(ConfigError::invalid("density grid must have at least one cell"));
        }
        Ok(())
    }
}

/// Configuration for the text embedding stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Identifier of the sentence-embedding model.
    pub model_id: String,
    /// Directory holding the exported `model.onnx` and `tokenizer.json`.
    pub model_dir: PathBuf,
    /// Token sequences longer than this are truncated before inference.
    pub max_sequence_length: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model_id: "paraphrase-multilingual-MiniLM-L12-v2".to_string(),
            model_dir: PathBuf::from("models"),
            max_sequence_length: 256,
        }
    }
}

impl EmbeddingConfig {
    /// Validates the embedding configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model_id.trim().is_empty() {
            return Err(ConfigError::invalid("embedding model id must not be empty"));
        }
        if self.max_sequence_length == 0 {
            return Err(ConfigError::invalid(
                "max sequence length must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Weights applied to the standardized feature families before fusion.
///
/// The two families have unrelated native scales; standardization puts
/// them on equal footing and the weights tune semantic-vs-visual emphasis.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionConfig {
    /// Weight multiplied into the standardized text embedding columns.
    pub text_weight: f32,
    /// Weight multiplied into the standardized layout feature columns.
    pub layout_weight: f32,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            text_weight: 0.7,
            layout_weight: 0.3,
        }
    }
}

/// Configuration for the clustering stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusteringConfig {
    /// Strategy used to partition the fused vectors.
    pub method: ClusteringMethod,
    /// Neighborhood radius (cosine distance) for the density strategy.
    pub eps: f32,
    /// Minimum neighborhood size, including the point itself, for a dense
    /// core in the density strategy.
    pub min_samples: usize,
    /// Requested cluster count for the centroid strategy. Silently clamped
    /// to the document count at clustering time.
    pub n_clusters: usize,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            method: ClusteringMethod::Density,
            eps: 0.5,
            min_samples: 2,
            n_clusters: 10,
        }
    }
}

impl ClusteringConfig {
    /// Validates the clustering configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.eps > 0.0) {
            return Err(ConfigError::invalid(format!(
                "density radius must be positive, got {}",
                self.eps
            )));
        }
        if self.min_samples == 0 {
            return Err(ConfigError::invalid("min samples must be at least 1"));
        }
        if self.n_clusters == 0 {
            return Err(ConfigError::invalid("cluster count must be at least 1"));
        }
        Ok(())
    }
}

/// Top-level configuration for [`crate::pipeline::ClusterPipeline`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Layout descriptor extraction settings.
    pub layout: LayoutConfig,
    /// Text embedding settings.
    pub embedding: EmbeddingConfig,
    /// Feature fusion weights.
    pub fusion: FusionConfig,
    /// Clustering strategy settings.
    pub clustering: ClusteringConfig,
}

impl PipelineConfig {
    /// Validates every stage configuration.
    ///
    /// Negative fusion weights surface as
    /// [`crate::core::PipelineError::InvalidWeight`] so that bad weights
    /// are rejected at construction time rather than mid-batch; all other
    /// problems surface as configuration errors.
    pub fn validate(&self) -> crate::core::PipelineResult<()> {
        self.layout.validate()?;
        self.embedding.validate()?;
        self.clustering.validate()?;
        if self.fusion.text_weight < 0.0 {
            return Err(crate::core::PipelineError::invalid_weight(
                "text_weight",
                self.fusion.text_weight,
            ));
        }
        if self.fusion.layout_weight < 0.0 {
            return Err(crate::core::PipelineError::invalid_weight(
                "layout_weight",
                self.fusion.layout_weight,
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::PipelineError;

    #[test]
    fn test_defaults_are_valid() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.layout.feature_len(), 15);
        assert_eq!(config.fusion.text_weight, 0.7);
        assert_eq!(config.fusion.layout_weight, 0.3);
        assert_eq!(config.clustering.min_samples, 2);
    }

    #[test]
    fn test_feature_len_follows_grid() {
        let config = LayoutConfig {
            grid_rows: 4,
            grid_cols: 2,
            ..LayoutConfig::default()
        };
        assert_eq!(config.feature_len(), 14);
    }

    #[test]
    fn test_negative_weight_rejected() {
        let mut config = PipelineConfig::default();
        config.fusion.layout_weight = -0.1;
        match config.validate() {
            Err(PipelineError::InvalidWeight { name, .. }) => {
                assert_eq!(name, "layout_weight");
            }
            other => panic!("expected InvalidWeight, got {other:?}"),
        }
    }

    #[test]
    fn test_zero_grid_rejected() {
        let config = LayoutConfig {
            grid_rows: 0,
            ..LayoutConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: PipelineConfig = toml::from_str(
            r#"
            [clustering]
            method = "centroid"
            n_clusters = 4
            "#,
        )
        .unwrap();
        assert_eq!(config.clustering.method, ClusteringMethod::Centroid);
        assert_eq!(config.clustering.n_clusters, 4);
        assert_eq!(config.fusion.text_weight, 0.7);
        assert_eq!(config.layout.grid_rows, 3);
    }
}
