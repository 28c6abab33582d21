//! # iris-core
//!
//! Foundation crate for the Iris image-embedding subsystem.
//! Defines all types, traits, errors, config, and constants.
//! The embedding pipeline and the observability layer both depend on this.

pub mod config;
pub mod constants;
pub mod errors;
pub mod models;
pub mod traits;

// Re-export the most commonly used types at the crate root.
pub use config::IrisConfig;
pub use errors::{IrisError, IrisResult};
pub use models::{EmbeddingRecord, ImageKey, PixelBounds, QualityTier};
