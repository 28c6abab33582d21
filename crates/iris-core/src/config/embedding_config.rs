use serde::{Deserialize, Serialize};

use super::defaults;
use crate::models::QualityTier;

/// Embedding pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Tier used when a request does not name one.
    pub quality: QualityTier,
    /// Reuse embeddings for byte-identical images within a model's lifetime.
    pub enable_image_cache: bool,
    /// Optional bound on cached records per loaded model. Unbounded by
    /// default; with a bound, a stored record may be evicted or refused
    /// before the model unloads.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_capacity: Option<u64>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            quality: QualityTier::default(),
            enable_image_cache: defaults::DEFAULT_ENABLE_IMAGE_CACHE,
            cache_capacity: None,
        }
    }
}
