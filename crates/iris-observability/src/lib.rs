//! # iris-observability
//!
//! Performance advisories, embedding metrics, and tracing setup.
//! Advisories are informational only: nothing in this crate can fail a request.

pub mod advisory;
pub mod metrics;
pub mod tracing_setup;

pub use advisory::{advise, compilation_note, warmup_note};
pub use metrics::EmbeddingMetrics;
pub use tracing_setup::init_tracing;
