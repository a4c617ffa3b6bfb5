//! Semantic text embedding.
//!
//! This module defines the embedding capability the pipeline depends on
//! and its ONNX Runtime implementation. The capability is injected into
//! [`crate::pipeline::ClusterPipeline`] at construction, so tests can
//! substitute a stub and no hidden global state is involved.

pub mod onnx;

use crate::core::constants::EMPTY_TEXT_PLACEHOLDER;
use crate::core::PipelineResult;
use ndarray::Array2;

pub use onnx::OnnxTextEmbedder;

/// A source of fixed-dimensionality semantic vectors for document texts.
///
/// Implementations must return one row per input string, in input order,
/// with the same column count on every call within one process. Blank
/// input must still produce a row (see [`prepare_texts`]).
pub trait TextEmbedder: Send + Sync {
    /// Embeds a batch of texts into a `(texts.len(), dim)` matrix.
    fn embed(&self, texts: &[String]) -> PipelineResult<Array2<f32>>;
}

/// Replaces empty or whitespace-only strings with the fixed placeholder so
/// that every document yields an embedding vector.
pub fn prepare_texts(texts: &[String]) -> Vec<String> {
    texts
        .iter()
        .map(|text| {
            if text.trim().is_empty() {
                EMPTY_TEXT_PLACEHOLDER.to_string()
            } else {
                text.clone()
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_texts_are_substituted() {
        let texts = vec![
            "Invoice no. 42".to_string(),
            String::new(),
            "   \n\t ".to_string(),
        ];
        let prepared = prepare_texts(&texts);
        assert_eq!(prepared[0], "Invoice no. 42");
        assert_eq!(prepared[1], EMPTY_TEXT_PLACEHOLDER);
        assert_eq!(prepared[2], EMPTY_TEXT_PLACEHOLDER);
    }

    #[test]
    fn test_prepare_preserves_order_and_length() {
        let texts: Vec<String> = (0..5).map(|i| format!("doc {i}")).collect();
        let prepared = prepare_texts(&texts);
        assert_eq!(prepared, texts);
    }
}
