//! The clustering pipeline.
//!
//! This module contains the orchestrator that runs a batch of documents
//! through extraction, embedding, fusion, and clustering, plus the
//! configuration file loader.

pub mod cluster_pipeline;
pub mod config;

pub use cluster_pipeline::ClusterPipeline;
pub use config::{ConfigFormat, ConfigLoader};
