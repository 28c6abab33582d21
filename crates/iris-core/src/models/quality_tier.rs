use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::RESIZE_FACTOR;
use crate::errors::IrisError;

const UNIT: u64 = (RESIZE_FACTOR * RESIZE_FACTOR) as u64;

/// A named preprocessing budget bounding image resolution before encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityTier {
    /// Simple captioning.
    Fast,
    /// General-purpose default.
    #[default]
    Balanced,
    /// Detail-sensitive tasks.
    High,
    /// OCR and fine-detail analysis.
    Ultra,
}

/// Inclusive pixel-count range used to constrain resizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelBounds {
    pub min_pixels: u64,
    pub max_pixels: u64,
}

impl PixelBounds {
    pub fn contains(&self, pixels: u64) -> bool {
        (self.min_pixels..=self.max_pixels).contains(&pixels)
    }
}

impl QualityTier {
    pub const ALL: [QualityTier; 4] = [Self::Fast, Self::Balanced, Self::High, Self::Ultra];

    pub fn label(self) -> &'static str {
        match self {
            Self::Fast => "fast",
            Self::Balanced => "balanced",
            Self::High => "high",
            Self::Ultra => "ultra",
        }
    }

    /// Pixel bounds for this tier, in units of 28×28 merged patches.
    pub fn bounds(self) -> PixelBounds {
        let (min_units, max_units) = match self {
            Self::Fast => (128, 256),
            Self::Balanced => (256, 512),
            Self::High => (256, 768),
            Self::Ultra => (256, 1024),
        };
        PixelBounds {
            min_pixels: min_units * UNIT,
            max_pixels: max_units * UNIT,
        }
    }

    /// The next cheaper tier, or `None` for `fast`.
    pub fn lower(self) -> Option<Self> {
        match self {
            Self::Fast => None,
            Self::Balanced => Some(Self::Fast),
            Self::High => Some(Self::Balanced),
            Self::Ultra => Some(Self::High),
        }
    }

    fn allowed_labels() -> String {
        Self::ALL
            .iter()
            .map(|t| t.label())
            .collect::<Vec<_>>()
            .join("|")
    }
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for QualityTier {
    type Err = IrisError;

    /// Exact, case-sensitive match. Substituting a tier would change cache keys,
    /// so unknown labels are rejected outright.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.label() == s)
            .ok_or_else(|| {
                IrisError::invalid_config(format!(
                    "unknown quality tier `{s}`, expected one of {}",
                    Self::allowed_labels()
                ))
            })
    }
}
