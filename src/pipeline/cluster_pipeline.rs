//! The clustering pipeline orchestrator.
//!
//! Sequences the stages over one batch of documents: layout extraction,
//! text embedding, feature fusion, clustering, and result assembly. The
//! stages are strictly sequential because fusion and clustering need the
//! whole batch's statistics before producing any output; only the
//! per-image extraction stage is batch-parallel.

use crate::cluster::{fuse, Clusterer, ClusteringMethod};
use crate::core::constants::DEFAULT_PARALLEL_THRESHOLD;
use crate::core::{PipelineConfig, PipelineError, PipelineResult};
use crate::domain::{ClusterResult, ClusterSummary, DocumentFeatures, PageInput};
use crate::embedding::{OnnxTextEmbedder, TextEmbedder};
use crate::processors::LayoutExtractor;
use ndarray::Array2;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// The document clustering pipeline.
///
/// Holds the per-stage components and an injected [`TextEmbedder`]
/// capability. Construction validates the whole configuration, so weight
/// and parameter problems surface before any document is processed.
pub struct ClusterPipeline {
    config: PipelineConfig,
    extractor: LayoutExtractor,
    clusterer: Clusterer,
    embedder: Arc<dyn TextEmbedder>,
}

impl std::fmt::Debug for ClusterPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClusterPipeline")
            .field("config", &self.config)
            .field("extractor", &self.extractor)
            .field("clusterer", &self.clusterer)
            .field("embedder", &"<dyn TextEmbedder>")
            .finish()
    }
}

impl ClusterPipeline {
    /// Creates a pipeline with an explicitly injected embedder.
    ///
    /// # Errors
    ///
    /// Returns a configuration error ([`PipelineError::InvalidWeight`] or
    /// [`PipelineError::ConfigError`]) when the configuration is invalid.
    pub fn new(config: PipelineConfig, embedder: Arc<dyn TextEmbedder>) -> PipelineResult<Self> {
        config.validate()?;
        info!(
            "Initializing clustering pipeline (method: {}, weights: {}/{})",
            config.clustering.method, config.fusion.text_weight, config.fusion.layout_weight
        );
        let extractor = LayoutExtractor::new(config.layout.clone());
        let clusterer = Clusterer::new(config.clustering.clone());
        Ok(Self {
            config,
            extractor,
            clusterer,
            embedder,
        })
    }

    /// Creates a pipeline with the ONNX embedder described by the
    /// configuration's embedding section.
    pub fn from_config(config: PipelineConfig) -> PipelineResult<Self> {
        let embedder = Arc::new(OnnxTextEmbedder::new(config.embedding.clone()));
        Self::new(config, embedder)
    }

    /// The pipeline configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// The layout extractor built from the configuration.
    pub fn extractor(&self) -> &LayoutExtractor {
        &self.extractor
    }

    /// Extracts features for a single page.
    pub fn extract_features(&self, input: &PageInput) -> PipelineResult<DocumentFeatures> {
        let (layout_vector, text_blocks) = self.extractor.extract(&input.image)?;
        Ok(DocumentFeatures {
            document_id: input.document_id.clone(),
            text: input.text.clone(),
            layout_vector,
            text_blocks,
        })
    }

    /// Extracts features for a batch of pages, skipping failures.
    ///
    /// A page whose raster cannot be analyzed is logged and excluded from
    /// the batch; it never aborts the run. Output order follows input
    /// order. Extraction runs in parallel once the batch exceeds a small
    /// threshold, since pages share no mutable state.
    pub fn extract_batch(&self, inputs: &[PageInput]) -> Vec<DocumentFeatures> {
        let extracted: Vec<PipelineResult<DocumentFeatures>> =
            if inputs.len() > DEFAULT_PARALLEL_THRESHOLD {
                use rayon::prelude::*;
                inputs
                    .par_iter()
                    .map(|input| self.extract_features(input))
                    .collect()
            } else {
                inputs
                    .iter()
                    .map(|input| self.extract_features(input))
                    .collect()
            };

        let mut features = Vec::with_capacity(inputs.len());
        for (input, result) in inputs.iter().zip(extracted) {
            match result {
                Ok(doc) => features.push(doc),
                Err(e) => {
                    warn!(
                        "Skipping document {}: feature extraction failed: {}",
                        input.document_id, e
                    );
                }
            }
        }
        features
    }

    /// Runs embedding, fusion, and clustering over a batch of extracted
    /// features, using the configured strategy.
    ///
    /// Returns one [`ClusterResult`] per input document, in input order.
    /// An empty batch is a no-op, not an error.
    pub fn process(&self, doc_features: &[DocumentFeatures]) -> PipelineResult<Vec<ClusterResult>> {
        self.process_with(doc_features, self.config.clustering.method, None)
    }

    /// Like [`Self::process`], with a per-call strategy override.
    ///
    /// `n_clusters` overrides the configured centroid cluster count; the
    /// density strategy ignores it.
    pub fn process_with(
        &self,
        doc_features: &[DocumentFeatures],
        method: ClusteringMethod,
        n_clusters: Option<usize>,
    ) -> PipelineResult<Vec<ClusterResult>> {
        if doc_features.is_empty() {
            return Ok(Vec::new());
        }

        debug!("Embedding {} document texts", doc_features.len());
        let texts: Vec<String> = doc_features.iter().map(|doc| doc.text.clone()).collect();
        let text_vectors = self.embedder.embed(&texts)?;
        if text_vectors.nrows() != doc_features.len() {
            return Err(PipelineError::dimension_mismatch(
                "embedding rows",
                doc_features.len(),
                text_vectors.nrows(),
            ));
        }

        let layout_vectors = self.layout_matrix(doc_features)?;

        debug!("Fusing feature families");
        let fused = fuse(
            &text_vectors,
            &layout_vectors,
            self.config.fusion.text_weight,
            self.config.fusion.layout_weight,
        )?;

        let labels = self.clusterer.cluster(&fused, method, n_clusters)?;

        let results: Vec<ClusterResult> = doc_features
            .iter()
            .zip(labels.iter())
            .enumerate()
            .map(|(index, (doc, &label))| ClusterResult {
                document_id: doc.document_id.clone(),
                cluster_id: label,
                fused_vector: fused.row(index).to_vec(),
            })
            .collect();

        let clusters = labels
            .iter()
            .filter(|&&label| label >= 0)
            .max()
            .map_or(0, |&max| max as usize + 1);
        let noise = results.iter().filter(|r| r.is_noise()).count();
        info!(
            "Clustered {} documents into {} groups ({} noise)",
            results.len(),
            clusters,
            noise
        );

        Ok(results)
    }

    /// Groups document ids by cluster id, preserving result order within
    /// each group.
    pub fn summarize(results: &[ClusterResult]) -> ClusterSummary {
        ClusterSummary::from_results(results)
    }

    /// Stacks the per-document layout vectors into one matrix, failing
    /// fast when any document disagrees on width.
    fn layout_matrix(&self, doc_features: &[DocumentFeatures]) -> PipelineResult<Array2<f32>> {
        let width = doc_features[0].layout_vector.len();
        let mut flat = Vec::with_capacity(doc_features.len() * width);
        for doc in doc_features {
            if doc.layout_vector.len() != width {
                return Err(PipelineError::dimension_mismatch(
                    &format!("layout vector of document {}", doc.document_id),
                    width,
                    doc.layout_vector.len(),
                ));
            }
            flat.extend_from_slice(&doc.layout_vector);
        }
        Ok(Array2::from_shape_vec((doc_features.len(), width), flat)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NOISE_CLUSTER_ID;
    use image::{DynamicImage, GrayImage, Luma};

    /// Maps the first word of each text onto a fixed direction, so tests
    /// control semantic similarity exactly.
    struct StubEmbedder;

    impl TextEmbedder for StubEmbedder {
        fn embed(&self, texts: &[String]) -> PipelineResult<Array2<f32>> {
            let rows: Vec<[f32; 4]> = texts
                .iter()
                .map(|text| match text.split_whitespace().next() {
                    Some("invoice") => [1.0, 0.0, 0.0, 0.0],
                    Some("notice") => [0.0, 1.0, 0.0, 0.0],
                    _ => [0.0, 0.0, 1.0, 0.0],
                })
                .collect();
            Ok(Array2::from_shape_vec(
                (texts.len(), 4),
                rows.into_iter().flatten().collect(),
            )?)
        }
    }

    /// An embedder that always fails, standing in for a broken model.
    struct FailingEmbedder;

    impl TextEmbedder for FailingEmbedder {
        fn embed(&self, _texts: &[String]) -> PipelineResult<Array2<f32>> {
            Err(PipelineError::embedding_msg("model load", "stub failure"))
        }
    }

    fn pipeline() -> ClusterPipeline {
        ClusterPipeline::new(PipelineConfig::default(), Arc::new(StubEmbedder)).unwrap()
    }

    fn document(id: &str, text: &str, layout: Vec<f32>) -> DocumentFeatures {
        DocumentFeatures {
            document_id: id.to_string(),
            text: text.to_string(),
            layout_vector: layout,
            text_blocks: Vec::new(),
        }
    }

    fn invoice_layout() -> Vec<f32> {
        let mut v = vec![0.0; 15];
        v[0] = 4.0;
        v[1] = 0.3;
        v[11] = 0.4;
        v
    }

    fn notice_layout() -> Vec<f32> {
        let mut v = vec![0.0; 15];
        v[0] = 12.0;
        v[1] = 0.7;
        v[11] = 0.6;
        v
    }

    #[test]
    fn test_empty_batch_is_a_noop() {
        assert!(pipeline().process(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_result_count_and_order_match_input() {
        let docs = vec![
            document("a.pdf", "invoice one", invoice_layout()),
            document("b.pdf", "notice two", notice_layout()),
            document("c.pdf", "invoice three", invoice_layout()),
        ];
        let results = pipeline().process(&docs).unwrap();

        assert_eq!(results.len(), docs.len());
        let ids: Vec<&str> = results.iter().map(|r| r.document_id.as_str()).collect();
        assert_eq!(ids, vec!["a.pdf", "b.pdf", "c.pdf"]);
    }

    #[test]
    fn test_fused_dimensionality_is_constant() {
        let docs = vec![
            document("a.pdf", "invoice one", invoice_layout()),
            document("b.pdf", "notice two", notice_layout()),
        ];
        let results = pipeline().process(&docs).unwrap();
        for result in &results {
            assert_eq!(result.fused_vector.len(), 4 + 15);
        }
    }

    #[test]
    fn test_same_template_documents_cluster_together() {
        // Two near-identical invoices and two near-identical notices:
        // the density defaults must never split a template across
        // non-noise clusters.
        let docs = vec![
            document("invoice-a.pdf", "invoice alpha", invoice_layout()),
            document("invoice-b.pdf", "invoice alpha", invoice_layout()),
            document("notice-a.pdf", "notice gamma", notice_layout()),
            document("notice-b.pdf", "notice gamma", notice_layout()),
        ];
        let results = pipeline().process(&docs).unwrap();

        assert_eq!(results[0].cluster_id, results[1].cluster_id);
        assert_eq!(results[2].cluster_id, results[3].cluster_id);
        assert_ne!(results[0].cluster_id, results[2].cluster_id);
        assert!(results.iter().all(|r| r.cluster_id != NOISE_CLUSTER_ID));
    }

    #[test]
    fn test_centroid_count_clamps_to_batch_size() {
        let docs = vec![
            document("a.pdf", "invoice one", invoice_layout()),
            document("b.pdf", "notice two", notice_layout()),
            document("c.pdf", "other three", vec![1.0; 15]),
        ];
        let results = pipeline()
            .process_with(&docs, ClusteringMethod::Centroid, Some(5))
            .unwrap();

        let mut labels: Vec<i32> = results.iter().map(|r| r.cluster_id).collect();
        labels.sort_unstable();
        assert_eq!(labels, vec![0, 1, 2]);
    }

    #[test]
    fn test_summary_partitions_documents() {
        let docs = vec![
            document("a.pdf", "invoice one", invoice_layout()),
            document("b.pdf", "invoice two", invoice_layout()),
            document("c.pdf", "notice three", notice_layout()),
        ];
        let pipeline = pipeline();
        let results = pipeline.process(&docs).unwrap();
        let summary = ClusterPipeline::summarize(&results);

        assert_eq!(summary.document_count(), docs.len());
        let mut all_ids: Vec<&String> = summary.iter().flat_map(|(_, ids)| ids.iter()).collect();
        all_ids.sort();
        all_ids.dedup();
        assert_eq!(all_ids.len(), docs.len());
    }

    #[test]
    fn test_embedder_failure_aborts_batch() {
        let pipeline =
            ClusterPipeline::new(PipelineConfig::default(), Arc::new(FailingEmbedder)).unwrap();
        let docs = vec![document("a.pdf", "invoice one", invoice_layout())];
        let err = pipeline.process(&docs).unwrap_err();
        assert!(matches!(err, PipelineError::Embedding { .. }));
    }

    #[test]
    fn test_uneven_layout_widths_rejected() {
        let docs = vec![
            document("a.pdf", "invoice one", invoice_layout()),
            document("b.pdf", "notice two", vec![0.0; 9]),
        ];
        let err = pipeline().process(&docs).unwrap_err();
        assert!(matches!(err, PipelineError::DimensionMismatch { .. }));
    }

    #[test]
    fn test_extract_batch_skips_unreadable_pages() {
        let pipeline = pipeline();
        let good = DynamicImage::ImageLuma8(GrayImage::from_pixel(100, 150, Luma([255])));
        let inputs = vec![
            PageInput::new("good-1.pdf", "invoice one", good.clone()),
            PageInput::new("bad.pdf", "notice two", DynamicImage::new_luma8(0, 0)),
            PageInput::new("good-2.pdf", "notice three", good),
        ];
        let features = pipeline.extract_batch(&inputs);

        let ids: Vec<&str> = features.iter().map(|f| f.document_id.as_str()).collect();
        assert_eq!(ids, vec!["good-1.pdf", "good-2.pdf"]);
        for doc in &features {
            assert_eq!(doc.layout_vector.len(), 15);
        }
    }

    #[test]
    fn test_invalid_config_rejected_at_construction() {
        let mut config = PipelineConfig::default();
        config.fusion.text_weight = -1.0;
        let err = ClusterPipeline::new(config, Arc::new(StubEmbedder)).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidWeight { .. }));
    }
}
