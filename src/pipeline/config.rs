//! Configuration file loading utilities for the clustering pipeline.
//!
//! This module provides utilities for loading pipeline configuration from
//! TOML and JSON files.

use crate::core::{PipelineConfig, PipelineError};
use std::path::Path;

/// Configuration file format
#[derive(Debug, Clone, Copy)]
pub enum ConfigFormat {
    /// TOML format
    Toml,
    /// JSON format
    Json,
}

impl ConfigFormat {
    /// Detect format from file extension
    pub fn from_extension(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Configuration loader for the clustering pipeline
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a file, auto-detecting the format from the
    /// extension
    pub fn load_from_file(path: &Path) -> Result<PipelineConfig, PipelineError> {
        let format = ConfigFormat::from_extension(path).ok_or_else(|| {
            PipelineError::config_error(format!(
                "Unsupported config file extension: {:?}",
                path.extension()
            ))
        })?;

        let content = std::fs::read_to_string(path).map_err(|e| {
            PipelineError::config_error(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        Self::load_from_string(&content, format)
    }

    /// Load configuration from a string with specified format
    pub fn load_from_string(
        content: &str,
        format: ConfigFormat,
    ) -> Result<PipelineConfig, PipelineError> {
        match format {
            ConfigFormat::Toml => toml::from_str(content).map_err(|e| {
                PipelineError::config_error(format!("Failed to parse TOML config: {e}"))
            }),
            ConfigFormat::Json => serde_json::from_str(content).map_err(|e| {
                PipelineError::config_error(format!("Failed to parse JSON config: {e}"))
            }),
        }
    }

    /// Save configuration to a file, auto-detecting the format from the
    /// extension
    pub fn save_to_file(config: &PipelineConfig, path: &Path) -> Result<(), PipelineError> {
        let format = ConfigFormat::from_extension(path).ok_or_else(|| {
            PipelineError::config_error(format!(
                "Unsupported config file extension: {:?}",
                path.extension()
            ))
        })?;

        let content = match format {
            ConfigFormat::Toml => toml::to_string_pretty(config).map_err(|e| {
                PipelineError::config_error(format!("Failed to serialize TOML config: {e}"))
            })?,
            ConfigFormat::Json => serde_json::to_string_pretty(config).map_err(|e| {
                PipelineError::config_error(format!("Failed to serialize JSON config: {e}"))
            })?,
        };

        std::fs::write(path, content).map_err(|e| {
            PipelineError::config_error(format!(
                "Failed to write config file {}: {}",
                path.display(),
                e
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::ClusteringMethod;

    #[test]
    fn test_toml_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pipeline.toml");

        let mut config = PipelineConfig::default();
        config.clustering.method = ClusteringMethod::Centroid;
        config.clustering.n_clusters = 7;
        ConfigLoader::save_to_file(&config, &path).unwrap();

        let loaded = ConfigLoader::load_from_file(&path).unwrap();
        assert_eq!(loaded.clustering.method, ClusteringMethod::Centroid);
        assert_eq!(loaded.clustering.n_clusters, 7);
        assert_eq!(loaded.fusion.text_weight, config.fusion.text_weight);
    }

    #[test]
    fn test_json_string_loads() {
        let config = ConfigLoader::load_from_string(
            r#"{"clustering": {"eps": 0.4}}"#,
            ConfigFormat::Json,
        )
        .unwrap();
        assert_eq!(config.clustering.eps, 0.4);
        assert_eq!(config.clustering.min_samples, 2);
    }

    #[test]
    fn test_unknown_extension_rejected() {
        let err = ConfigLoader::load_from_file(Path::new("pipeline.yaml")).unwrap_err();
        assert!(matches!(err, PipelineError::ConfigError { .. }));
    }

    #[test]
    fn test_bad_method_string_fails_to_parse() {
        let result = ConfigLoader::load_from_string(
            r#"
            [clustering]
            method = "spectral"
            "#,
            ConfigFormat::Toml,
        );
        assert!(result.is_err());
    }
}
