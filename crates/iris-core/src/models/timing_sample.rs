use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::QualityTier;

/// One measured embedding request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimingSample {
    pub duration: Duration,
    pub image_count: usize,
    pub tier: QualityTier,
    /// True when every image was served from the cache.
    pub cache_hit: bool,
}

impl TimingSample {
    pub fn per_image(&self) -> Duration {
        if self.image_count == 0 {
            return Duration::ZERO;
        }
        match u32::try_from(self.image_count) {
            Ok(count) => self.duration / count,
            Err(_) => Duration::from_secs_f64(self.duration.as_secs_f64() / self.image_count as f64),
        }
    }

    pub fn summary(&self) -> TimingSummary {
        TimingSummary {
            total: self.duration,
            per_image: self.per_image(),
            image_count: self.image_count,
        }
    }
}

/// Timing exposed to callers for external instrumentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TimingSummary {
    pub total: Duration,
    pub per_image: Duration,
    pub image_count: usize,
}
