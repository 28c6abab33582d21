use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::{DeviceId, ImageKey};

/// Visual embedding of one image: `[tokens, hidden]` values on a device.
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding {
    pub shape: Vec<usize>,
    pub values: Arc<[f32]>,
    pub device: DeviceId,
}

impl Embedding {
    pub fn new(shape: Vec<usize>, values: Vec<f32>, device: DeviceId) -> Self {
        Self {
            shape,
            values: values.into(),
            device,
        }
    }

    /// Number of language-model tokens this embedding occupies.
    pub fn token_count(&self) -> usize {
        self.shape.first().copied().unwrap_or(0)
    }

    pub fn hidden_size(&self) -> usize {
        self.shape.last().copied().unwrap_or(0)
    }
}

/// A cached result of encoding one image at one tier.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingRecord {
    pub key: ImageKey,
    pub embedding: Embedding,
    pub token_count: usize,
    pub created_at: DateTime<Utc>,
}

impl EmbeddingRecord {
    pub fn new(key: ImageKey, embedding: Embedding) -> Self {
        let token_count = embedding.token_count();
        Self {
            key,
            embedding,
            token_count,
            created_at: Utc::now(),
        }
    }
}
