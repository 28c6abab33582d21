//! Metrics collected per loaded model.

pub mod embedding_metrics;

pub use embedding_metrics::EmbeddingMetrics;
