//! Record types flowing through the clustering pipeline.
//!
//! These are the units exchanged between extraction, fusion, clustering,
//! and downstream consumers. All of them are plain data: created once per
//! pipeline run and immutable afterwards.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Cluster id reserved for documents the density strategy could not place
/// in any sufficiently dense group.
///
/// Only the density strategy emits this value; centroid labels are always
/// non-negative, so downstream code must not conflate noise with cluster
/// zero.
pub const NOISE_CLUSTER_ID: i32 = -1;

/// A detected rectangular region of probable text on a page.
///
/// All coordinates are fractions of the page width/height in `[0, 1]`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TextBlock {
    /// Left edge, as a fraction of page width.
    pub x: f32,
    /// Top edge, as a fraction of page height.
    pub y: f32,
    /// Width, as a fraction of page width.
    pub width: f32,
    /// Height, as a fraction of page height.
    pub height: f32,
    /// Normalized area (`width * height`).
    pub area: f32,
}

impl TextBlock {
    /// Vertical center of the block, as a fraction of page height.
    #[inline]
    pub fn vertical_center(&self) -> f32 {
        self.y + self.height / 2.0
    }
}

/// One batch item for the orchestrator's extraction stage: a decoded page
/// raster with its source identifier and the OCR text produced for it.
#[derive(Debug)]
pub struct PageInput {
    /// Identifier of the source document (a path string or stable id).
    pub document_id: String,
    /// Raw OCR text for the page. May be empty.
    pub text: String,
    /// Decoded page raster.
    pub image: image::DynamicImage,
}

impl PageInput {
    /// Creates a new page input.
    pub fn new(
        document_id: impl Into<String>,
        text: impl Into<String>,
        image: image::DynamicImage,
    ) -> Self {
        Self {
            document_id: document_id.into(),
            text: text.into(),
            image,
        }
    }
}

/// Per-document features produced by extraction, consumed by fusion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentFeatures {
    /// Identifier of the source document. Never mutated.
    pub document_id: String,
    /// Raw OCR text. May be empty.
    pub text: String,
    /// Fixed-length layout descriptor produced by the layout extractor.
    pub layout_vector: Vec<f32>,
    /// Detected text blocks, sorted top to bottom.
    pub text_blocks: Vec<TextBlock>,
}

/// Clustering outcome for one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterResult {
    /// Identifier of the source document.
    pub document_id: String,
    /// Assigned cluster, or [`NOISE_CLUSTER_ID`] under the density
    /// strategy.
    pub cluster_id: i32,
    /// The fused vector that determined the label.
    pub fused_vector: Vec<f32>,
}

impl ClusterResult {
    /// Whether the density strategy marked this document as noise.
    pub fn is_noise(&self) -> bool {
        self.cluster_id == NOISE_CLUSTER_ID
    }
}

/// A mapping from cluster id to the documents assigned to it.
///
/// Derived state: recomputable at any time from a slice of
/// [`ClusterResult`]. Within each group, documents keep the order in which
/// they appear in the results.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClusterSummary {
    groups: BTreeMap<i32, Vec<String>>,
}

impl ClusterSummary {
    /// Builds a summary by grouping document ids by cluster id.
    pub fn from_results(results: &[ClusterResult]) -> Self {
        let mut groups: BTreeMap<i32, Vec<String>> = BTreeMap::new();
        for result in results {
            groups
                .entry(result.cluster_id)
                .or_default()
                .push(result.document_id.clone());
        }
        Self { groups }
    }

    /// Document ids assigned to the given cluster, if any.
    pub fn documents(&self, cluster_id: i32) -> Option<&[String]> {
        self.groups.get(&cluster_id).map(|ids| ids.as_slice())
    }

    /// Iterates over `(cluster_id, document_ids)` pairs in ascending
    /// cluster-id order (noise first, when present).
    pub fn iter(&self) -> impl Iterator<Item = (i32, &[String])> {
        self.groups.iter().map(|(id, ids)| (*id, ids.as_slice()))
    }

    /// Number of groups, counting the noise group when present.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Whether the summary holds no groups at all.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Total number of documents across all groups.
    pub fn document_count(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }
}

impl fmt::Display for ClusterSummary {
    /// Renders a human-readable digest: one section per group, the noise
    /// group labeled distinctly, at most five ids listed per group.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (cluster_id, ids) in self.groups.iter() {
            if *cluster_id == NOISE_CLUSTER_ID {
                writeln!(f, "[noise] ({} documents)", ids.len())?;
            } else {
                writeln!(f, "[cluster {}] ({} documents)", cluster_id, ids.len())?;
            }
            for id in ids.iter().take(5) {
                writeln!(f, "  - {id}")?;
            }
            if ids.len() > 5 {
                writeln!(f, "  ... {} more", ids.len() - 5)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(id: &str, cluster: i32) -> ClusterResult {
        ClusterResult {
            document_id: id.to_string(),
            cluster_id: cluster,
            fused_vector: vec![0.0; 4],
        }
    }

    #[test]
    fn test_vertical_center() {
        let block = TextBlock {
            x: 0.1,
            y: 0.2,
            width: 0.5,
            height: 0.4,
            area: 0.2,
        };
        assert!((block.vertical_center() - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_summary_groups_preserve_order() {
        let results = vec![
            result("a.pdf", 0),
            result("b.pdf", 1),
            result("c.pdf", 0),
            result("d.pdf", -1),
        ];
        let summary = ClusterSummary::from_results(&results);

        assert_eq!(summary.len(), 3);
        assert_eq!(summary.documents(0).unwrap(), &["a.pdf", "c.pdf"]);
        assert_eq!(summary.documents(1).unwrap(), &["b.pdf"]);
        assert_eq!(summary.documents(-1).unwrap(), &["d.pdf"]);
        assert_eq!(summary.document_count(), 4);
    }

    #[test]
    fn test_summary_partitions_every_document_once() {
        let results: Vec<ClusterResult> = (0..10)
            .map(|i| result(&format!("doc{i}"), (i % 3) as i32))
            .collect();
        let summary = ClusterSummary::from_results(&results);

        let mut seen: Vec<&String> = summary.iter().flat_map(|(_, ids)| ids.iter()).collect();
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), results.len());
        assert_eq!(summary.document_count(), results.len());
    }

    #[test]
    fn test_noise_display_label() {
        let summary = ClusterSummary::from_results(&[result("x.pdf", -1)]);
        let text = summary.to_string();
        assert!(text.contains("[noise]"));
        assert!(text.contains("x.pdf"));
    }

    #[test]
    fn test_is_noise() {
        assert!(result("a", NOISE_CLUSTER_ID).is_noise());
        assert!(!result("a", 0).is_noise());
    }
}
