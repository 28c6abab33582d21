use serde::{Deserialize, Serialize};

use crate::constants::SPATIAL_MERGE_SIZE;

/// Patch grid of one preprocessed image: temporal, height, and width in patches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageGrid {
    pub t: u32,
    pub h: u32,
    pub w: u32,
}

impl ImageGrid {
    pub fn patch_count(&self) -> usize {
        (self.t * self.h * self.w) as usize
    }

    /// Tokens after spatial merging, i.e. what the language model sees.
    pub fn token_count(&self) -> usize {
        self.patch_count() / (SPATIAL_MERGE_SIZE * SPATIAL_MERGE_SIZE) as usize
    }
}

/// Output of preprocessing a single image: flattened patches plus its grid.
#[derive(Debug, Clone)]
pub struct PreparedImage {
    pub grid: ImageGrid,
    /// Row-major `[patch_count, patch_dim]`.
    pub patches: Vec<f32>,
    pub patch_dim: usize,
}
