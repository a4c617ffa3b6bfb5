//! ONNX Runtime embedding backend.
//!
//! Runs an exported sentence-embedding model (the reference deployment
//! uses `paraphrase-multilingual-MiniLM-L12-v2`) through ONNX Runtime.
//! The model directory must contain the exported `model.onnx` and its
//! `tokenizer.json`.
//!
//! Loading the model is an expensive one-time disk read, so the session
//! is created lazily on the first embed call and reused for the process
//! lifetime. Initialization happens inside a mutex: concurrent first
//! callers race safely and exactly one of them loads the model.

use crate::core::{EmbeddingConfig, PipelineError, PipelineResult};
use crate::embedding::{prepare_texts, TextEmbedder};
use ndarray::Array2;
use ort::session::Session;
use ort::value::Value;
use std::path::PathBuf;
use std::sync::Mutex;
use tokenizers::Tokenizer;
use tracing::{debug, info};

/// File name of the exported encoder inside the model directory.
const MODEL_FILE: &str = "model.onnx";

/// File name of the tokenizer definition inside the model directory.
const TOKENIZER_FILE: &str = "tokenizer.json";

/// Intra-op thread count for the ONNX session.
const INTRA_THREADS: usize = 4;

struct EmbedderState {
    session: Session,
    tokenizer: Tokenizer,
}

/// ONNX Runtime-based implementation of [`TextEmbedder`].
pub struct OnnxTextEmbedder {
    config: EmbeddingConfig,
    state: Mutex<Option<EmbedderState>>,
}

impl OnnxTextEmbedder {
    /// Creates an embedder for the given configuration.
    ///
    /// No model files are touched here; loading is deferred to the first
    /// [`TextEmbedder::embed`] call so that pipelines which never process
    /// a document never pay the model load.
    pub fn new(config: EmbeddingConfig) -> Self {
        Self {
            config,
            state: Mutex::new(None),
        }
    }

    fn model_path(&self) -> PathBuf {
        self.config.model_dir.join(MODEL_FILE)
    }

    fn tokenizer_path(&self) -> PathBuf {
        self.config.model_dir.join(TOKENIZER_FILE)
    }

    fn load_state(&self) -> PipelineResult<EmbedderState> {
        let model_path = self.model_path();
        let tokenizer_path = self.tokenizer_path();
        info!(
            "Loading embedding model {} from {}",
            self.config.model_id,
            self.config.model_dir.display()
        );

        if !model_path.is_file() {
            return Err(PipelineError::embedding_msg(
                "model load",
                format!("model file not found: {}", model_path.display()),
            ));
        }
        if !tokenizer_path.is_file() {
            return Err(PipelineError::embedding_msg(
                "model load",
                format!("tokenizer file not found: {}", tokenizer_path.display()),
            ));
        }

        let session = Session::builder()
            .map_err(|e| PipelineError::embedding("create session builder", e))?
            .with_intra_threads(INTRA_THREADS)
            .map_err(|e| PipelineError::embedding("set session threads", e))?
            .commit_from_file(&model_path)
            .map_err(|e| PipelineError::embedding("load model", e))?;

        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| PipelineError::embedding_msg("load tokenizer", e.to_string()))?;

        info!("Embedding model loaded");
        Ok(EmbedderState { session, tokenizer })
    }

    /// Runs one text through the encoder and mean-pools the final hidden
    /// state under the attention mask.
    fn embed_one(&self, state: &mut EmbedderState, text: &str) -> PipelineResult<Vec<f32>> {
        let encoding = state
            .tokenizer
            .encode(text, true)
            .map_err(|e| PipelineError::embedding_msg("tokenize", e.to_string()))?;

        let mut input_ids: Vec<i64> = encoding.get_ids().iter().map(|&id| id as i64).collect();
        if input_ids.len() > self.config.max_sequence_length {
            input_ids.truncate(self.config.max_sequence_length);
        }
        let seq_len = input_ids.len();
        let attention_mask = vec![1i64; seq_len];
        let token_type_ids = vec![0i64; seq_len];

        let ids_value = Value::from_array(Array2::from_shape_vec((1, seq_len), input_ids)?)
            .map_err(|e| PipelineError::embedding("create input_ids tensor", e))?;
        let mask_value = Value::from_array(Array2::from_shape_vec((1, seq_len), attention_mask)?)
            .map_err(|e| PipelineError::embedding("create attention_mask tensor", e))?;
        let types_value = Value::from_array(Array2::from_shape_vec((1, seq_len), token_type_ids)?)
            .map_err(|e| PipelineError::embedding("create token_type_ids tensor", e))?;

        let outputs = state
            .session
            .run(ort::inputs![
                "input_ids" => ids_value,
                "attention_mask" => mask_value,
                "token_type_ids" => types_value
            ])
            .map_err(|e| PipelineError::embedding("run encoder", e))?;

        // Final hidden state: [1, seq_len, hidden]
        let (shape, data) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| PipelineError::embedding("extract hidden state", e))?;
        let dims: Vec<usize> = shape.iter().map(|&d| d as usize).collect();
        if dims.len() != 3 || dims[1] != seq_len {
            return Err(PipelineError::embedding_msg(
                "extract hidden state",
                format!("unexpected output shape {dims:?} for sequence of {seq_len}"),
            ));
        }
        let hidden = dims[2];

        // Mean pooling. Every position carries mask 1 here (no padding in
        // single-sequence inference), but the masked form keeps the
        // pooling faithful to the sentence-transformers recipe.
        let mut pooled = vec![0.0f32; hidden];
        for pos in 0..seq_len {
            let row = &data[pos * hidden..(pos + 1) * hidden];
            for (sum, value) in pooled.iter_mut().zip(row) {
                *sum += value;
            }
        }
        for sum in &mut pooled {
            *sum /= seq_len as f32;
        }
        Ok(pooled)
    }
}

impl TextEmbedder for OnnxTextEmbedder {
    fn embed(&self, texts: &[String]) -> PipelineResult<Array2<f32>> {
        if texts.is_empty() {
            return Ok(Array2::zeros((0, 0)));
        }

        let mut guard = self
            .state
            .lock()
            .map_err(|_| PipelineError::embedding_msg("embedder state", "poisoned lock"))?;
        if guard.is_none() {
            *guard = Some(self.load_state()?);
        }
        let state = guard.as_mut().expect("state initialized above");

        let prepared = prepare_texts(texts);
        debug!("Embedding {} texts", prepared.len());

        let mut rows: Vec<Vec<f32>> = Vec::with_capacity(prepared.len());
        for text in &prepared {
            rows.push(self.embed_one(state, text)?);
        }

        let dim = rows[0].len();
        for (index, row) in rows.iter().enumerate() {
            if row.len() != dim {
                return Err(PipelineError::dimension_mismatch(
                    &format!("embedding width of text {index}"),
                    dim,
                    row.len(),
                ));
            }
        }

        let flat: Vec<f32> = rows.into_iter().flatten().collect();
        Ok(Array2::from_shape_vec((prepared.len(), dim), flat)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_model_fails_without_panicking() {
        let config = EmbeddingConfig {
            model_dir: PathBuf::from("/nonexistent/model/dir"),
            ..EmbeddingConfig::default()
        };
        let embedder = OnnxTextEmbedder::new(config);
        let err = embedder.embed(&["hello".to_string()]).unwrap_err();
        assert!(matches!(err, PipelineError::Embedding { .. }));
    }

    #[test]
    fn test_empty_batch_needs_no_model() {
        let config = EmbeddingConfig {
            model_dir: PathBuf::from("/nonexistent/model/dir"),
            ..EmbeddingConfig::default()
        };
        let embedder = OnnxTextEmbedder::new(config);
        let matrix = embedder.embed(&[]).unwrap();
        assert_eq!(matrix.nrows(), 0);
    }

    /// Compile-time check that the ONNX backend satisfies the capability
    /// trait. It never runs (a real model directory would be required).
    #[allow(dead_code)]
    fn verify_text_embedder_impl() {
        fn requires_embedder<E: TextEmbedder>(_: &E) {}

        fn _check(embedder: &OnnxTextEmbedder) {
            requires_embedder(embedder);
        }
    }
}
