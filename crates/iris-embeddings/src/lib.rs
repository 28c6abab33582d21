//! # iris-embeddings
//!
//! Adaptive image-to-embedding pipeline for vision-language inference:
//! quality-tier resolution, a content-addressed embedding cache, pipelined
//! host-to-device transfer, lazy vision-encoder compilation, and a
//! per-model worker that serializes requests.

pub mod cache;
pub mod compilation;
pub mod engine;
pub mod lifecycle;
pub mod preprocess;
pub mod providers;
pub mod tier;
pub mod transfer;
pub mod worker;

pub use cache::EmbeddingCache;
pub use compilation::CompilationManager;
pub use engine::{EmbedRequest, EmbedResponse, EmbeddingEngine, SlotEmbedding, SlotResult};
pub use lifecycle::{ModelContext, ModelLifecycle};
pub use preprocess::ImagePreprocessor;
pub use transfer::{DeviceBundle, TransferPipeline};
pub use worker::{EmbeddingWorker, WorkerStatus};
