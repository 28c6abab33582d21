//! Fixed numeric constants for preprocessing, caching, and telemetry.

use std::time::Duration;

/// Pixel side length of a vision patch before spatial merging.
pub const PATCH_SIZE: u32 = 14;

/// Number of patches merged along each axis into one language-model token.
pub const SPATIAL_MERGE_SIZE: u32 = 2;

/// Resize granularity: every output side is a multiple of this.
pub const RESIZE_FACTOR: u32 = PATCH_SIZE * SPATIAL_MERGE_SIZE;

/// Frames per temporal patch. Still images use a single frame.
pub const TEMPORAL_PATCH_SIZE: u32 = 1;

/// Images more elongated than this are rejected before resizing.
pub const MAX_ASPECT_RATIO: f64 = 200.0;

/// CLIP normalization mean (RGB).
pub const IMAGE_MEAN: [f32; 3] = [0.481_454_66, 0.457_827_5, 0.408_210_73];

/// CLIP normalization standard deviation (RGB).
pub const IMAGE_STD: [f32; 3] = [0.268_629_54, 0.261_302_6, 0.275_777_1];

/// Name of the flattened patch tensor in the encoder input bundle.
pub const PIXEL_VALUES_INPUT: &str = "pixel_values";

/// Name of the per-image `(t, h, w)` patch grid tensor in the encoder input bundle.
pub const GRID_THW_INPUT: &str = "image_grid_thw";

/// Per-image latency above which a request counts as slow.
pub const SLOW_IMAGE_THRESHOLD: Duration = Duration::from_secs(2);

/// Minimum runtime version that supports ahead-of-time encoder optimization.
pub const DEFAULT_MIN_RUNTIME_VERSION: &str = "2.0";

/// Depth of the per-model request queue.
pub const WORKER_QUEUE_DEPTH: usize = 32;
