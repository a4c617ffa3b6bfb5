//! Error types for the document clustering pipeline.
//!
//! This module defines the error taxonomy shared by every stage of the
//! pipeline: image decoding and layout analysis, text embedding, feature
//! fusion, and clustering. It also provides utility functions for creating
//! these errors with appropriate context.

use thiserror::Error;

/// Enum representing different stages of processing in the clustering pipeline.
///
/// This enum is used to identify which stage of the pipeline an error occurred in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProcessingStage {
    /// Error occurred during image binarization.
    Binarization,
    /// Error occurred during morphological processing of the ink mask.
    Morphology,
    /// Error occurred during ruling-line detection.
    LineDetection,
    /// Error occurred during feature normalization.
    Normalization,
    /// Error occurred during clustering.
    Clustering,
    /// Error occurred during batch processing.
    BatchProcessing,
    /// Generic processing error.
    Generic,
}

impl std::fmt::Display for ProcessingStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessingStage::Binarization => write!(f, "binarization"),
            ProcessingStage::Morphology => write!(f, "morphology"),
            ProcessingStage::LineDetection => write!(f, "line detection"),
            ProcessingStage::Normalization => write!(f, "normalization"),
            ProcessingStage::Clustering => write!(f, "clustering"),
            ProcessingStage::BatchProcessing => write!(f, "batch processing"),
            ProcessingStage::Generic => write!(f, "processing"),
        }
    }
}

/// Enum representing various errors that can occur in the clustering pipeline.
///
/// The variants follow the pipeline's failure classes: per-document image
/// failures (`ImageLoad`, `ImageDecode`), whole-batch contract violations
/// (`DimensionMismatch`, `Embedding`), and configuration problems caught
/// before any document is touched (`InvalidWeight`, `UnsupportedMethod`,
/// `Config`).
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Error occurred while loading an image from disk.
    #[error("image load")]
    ImageLoad(#[source] image::ImageError),

    /// The supplied raster cannot be used (zero-dimension or corrupt buffer).
    #[error("image decode: {message}")]
    ImageDecode {
        /// A message describing why the raster is unusable.
        message: String,
    },

    /// Two feature collections that must agree in size do not.
    #[error("dimension mismatch in {context}: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Where the mismatch was detected.
        context: String,
        /// The expected count or width.
        expected: usize,
        /// The actual count or width.
        actual: usize,
    },

    /// A fusion weight is negative.
    #[error("invalid weight: {name} must be non-negative, got {value}")]
    InvalidWeight {
        /// The name of the offending weight.
        name: String,
        /// The rejected value.
        value: f32,
    },

    /// The requested clustering method is not one of the supported strategies.
    #[error("unsupported clustering method: {method}")]
    UnsupportedMethod {
        /// The rejected method string.
        method: String,
    },

    /// Error occurred while loading or running the embedding model.
    #[error("embedding failed: {context}")]
    Embedding {
        /// Additional context about the failure.
        context: String,
        /// The underlying error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Error occurred during processing.
    #[error("{kind} failed: {context}")]
    Processing {
        /// The stage of processing where the error occurred.
        kind: ProcessingStage,
        /// Additional context about the error.
        context: String,
        /// The underlying error that caused this error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Error indicating invalid input.
    #[error("invalid input: {message}")]
    InvalidInput {
        /// A message describing the invalid input.
        message: String,
    },

    /// Error indicating a configuration problem.
    #[error("configuration: {message}")]
    ConfigError {
        /// A message describing the configuration error.
        message: String,
    },

    /// Error from tensor operations.
    #[error("tensor operation")]
    Tensor(#[from] ndarray::ShapeError),

    /// IO error.
    #[error("io")]
    Io(#[from] std::io::Error),
}

/// Convenient result alias used throughout the crate.
pub type PipelineResult<T> = Result<T, PipelineError>;

impl PipelineError {
    /// Creates a PipelineError for an unusable raster.
    ///
    /// # Arguments
    ///
    /// * `message` - A message describing why the raster cannot be used.
    ///
    /// # Returns
    ///
    /// A PipelineError instance.
    pub fn image_decode(message: impl Into<String>) -> Self {
        Self::ImageDecode {
            message: message.into(),
        }
    }

    /// Creates a PipelineError for a size disagreement between feature
    /// collections.
    pub fn dimension_mismatch(context: &str, expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch {
            context: context.to_string(),
            expected,
            actual,
        }
    }

    /// Creates a PipelineError for a negative fusion weight.
    pub fn invalid_weight(name: &str, value: f32) -> Self {
        Self::InvalidWeight {
            name: name.to_string(),
            value,
        }
    }

    /// Creates a PipelineError for an unknown clustering method string.
    pub fn unsupported_method(method: impl Into<String>) -> Self {
        Self::UnsupportedMethod {
            method: method.into(),
        }
    }

    /// Creates a PipelineError for embedding-model failures.
    ///
    /// # Arguments
    ///
    /// * `context` - Additional context about the failure.
    /// * `error` - The underlying error that caused this error.
    ///
    /// # Returns
    ///
    /// A PipelineError instance.
    pub fn embedding(
        context: impl Into<String>,
        error: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Embedding {
            context: context.into(),
            source: Box::new(error),
        }
    }

    /// Creates a PipelineError for embedding-model failures from a plain
    /// message, for sources that only report strings (the tokenizer API).
    pub fn embedding_msg(context: impl Into<String>, message: impl Into<String>) -> Self {
        let message: String = message.into();
        Self::Embedding {
            context: context.into(),
            source: message.into(),
        }
    }

    /// Creates a PipelineError for processing operations.
    ///
    /// # Arguments
    ///
    /// * `kind` - The stage of processing where the error occurred.
    /// * `context` - Additional context about the error.
    /// * `error` - The underlying error that caused this error.
    ///
    /// # Returns
    ///
    /// A PipelineError instance.
    pub fn processing_error(
        kind: ProcessingStage,
        context: &str,
        error: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Processing {
            kind,
            context: context.to_string(),
            source: Box::new(error),
        }
    }

    /// Creates a PipelineError for invalid input.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Creates a PipelineError for configuration errors.
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }
}

/// Implementation of From<image::ImageError> for PipelineError.
///
/// This allows image::ImageError to be automatically converted to PipelineError.
impl From<image::ImageError> for PipelineError {
    fn from(error: image::ImageError) -> Self {
        Self::ImageLoad(error)
    }
}

/// Implementation of From<crate::core::config::ConfigError> for PipelineError.
impl From<crate::core::config::ConfigError> for PipelineError {
    fn from(error: crate::core::config::ConfigError) -> Self {
        Self::ConfigError {
            message: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_context() {
        let err = PipelineError::dimension_mismatch("fusion rows", 4, 3);
        let text = err.to_string();
        assert!(text.contains("fusion rows"));
        assert!(text.contains('4'));
        assert!(text.contains('3'));
    }

    #[test]
    fn test_unsupported_method_message() {
        let err = PipelineError::unsupported_method("affinity");
        assert!(err.to_string().contains("affinity"));
    }

    #[test]
    fn test_processing_stage_display() {
        assert_eq!(ProcessingStage::Clustering.to_string(), "clustering");
        assert_eq!(ProcessingStage::Generic.to_string(), "processing");
    }
}
