//! # doc-cluster
//!
//! A Rust library that groups scanned document pages into visually and
//! textually similar clusters before expensive per-document processing is
//! applied. One layout descriptor is derived from each page raster, one
//! semantic vector from its OCR text; the two are standardized, weighted,
//! fused, and partitioned with a selectable clustering strategy.
//!
//! ## Features
//!
//! - Layout analysis: text-block geography, ink-density grid, ruling-line
//!   presence, all folded into a fixed-length descriptor
//! - Sentence embeddings via ONNX Runtime, behind an injectable capability
//! - Weighted fusion with independent per-family standardization
//! - Density-based (noise-aware) and centroid-based clustering strategies
//! - Batch processing with per-document failure isolation
//!
//! ## Components
//!
//! - **Layout Descriptor Extractor**: page raster to 15-dim layout vector
//! - **Text Embedder**: OCR text to semantic vector, lazily loaded model
//! - **Feature Fusion**: standardize, weight, concatenate
//! - **Clusterer**: density or centroid partitioning of fused vectors
//! - **Pipeline Orchestrator**: sequences the stages over one batch
//!
//! ## Modules
//!
//! * [`core`] - Configuration, constants, and error handling
//! * [`domain`] - Record types exchanged between stages
//! * [`processors`] - Layout analysis
//! * [`embedding`] - Text embedding capability and ONNX backend
//! * [`cluster`] - Fusion and the clustering strategies
//! * [`pipeline`] - The orchestrator and configuration loading
//! * [`utils`] - Image loading helpers
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use doc_cluster::prelude::*;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Configure and build the pipeline. The embedding model directory
//! // must hold the exported model.onnx and tokenizer.json.
//! let mut config = PipelineConfig::default();
//! config.embedding.model_dir = "models/minilm".into();
//! let pipeline = ClusterPipeline::from_config(config)?;
//!
//! // Collect pages from the rasterizer and OCR collaborators.
//! let inputs = vec![
//!     PageInput::new("contract-001.pdf", "AGREEMENT made this day...",
//!         load_image(Path::new("pages/contract-001.png"))?),
//!     PageInput::new("contract-002.pdf", "AGREEMENT made this day...",
//!         load_image(Path::new("pages/contract-002.png"))?),
//! ];
//!
//! // Extract, cluster, and summarize.
//! let features = pipeline.extract_batch(&inputs);
//! let results = pipeline.process(&features)?;
//! let summary = ClusterPipeline::summarize(&results);
//! println!("{summary}");
//! # Ok(())
//! # }
//! ```
//!
//! ### Strategy selection
//!
//! ```rust,no_run
//! use doc_cluster::prelude::*;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! # let pipeline = ClusterPipeline::from_config(PipelineConfig::default())?;
//! # let features = vec![];
//! // Density clustering discovers the group count and may emit the
//! // noise label -1; centroid clustering always assigns 0..k-1.
//! let results = pipeline.process_with(&features, ClusteringMethod::Centroid, Some(10))?;
//! # Ok(())
//! # }
//! ```

// Core modules
pub mod cluster;
pub mod core;
pub mod domain;
pub mod embedding;
pub mod pipeline;
pub mod processors;
pub mod utils;

/// Prelude module for convenient imports.
///
/// Bring the essentials into scope with a single use statement:
///
/// ```rust
/// use doc_cluster::prelude::*;
/// ```
///
/// Included items focus on the most common tasks:
/// - Pipeline (`ClusterPipeline`, `PipelineConfig`, `ClusteringMethod`)
/// - Records (`PageInput`, `DocumentFeatures`, `ClusterResult`,
///   `ClusterSummary`)
/// - Essential error and result types (`PipelineError`, `PipelineResult`)
/// - Basic image loading (`load_image`)
///
/// For advanced customization (custom embedders, direct strategy access),
/// import directly from the respective modules (e.g.
/// `doc_cluster::embedding`, `doc_cluster::cluster`).
pub mod prelude {
    // Pipeline (essential)
    pub use crate::pipeline::{ClusterPipeline, ConfigLoader};

    // Configuration
    pub use crate::cluster::ClusteringMethod;
    pub use crate::core::PipelineConfig;

    // Records
    pub use crate::domain::{
        ClusterResult, ClusterSummary, DocumentFeatures, PageInput, NOISE_CLUSTER_ID,
    };

    // Error handling (essential)
    pub use crate::core::{PipelineError, PipelineResult};

    // Embedding capability
    pub use crate::embedding::{OnnxTextEmbedder, TextEmbedder};

    // Image utility (minimal)
    pub use crate::utils::load_image;
}
