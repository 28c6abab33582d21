use std::fmt;

use serde::{Deserialize, Serialize};

use super::QualityTier;

/// blake3-256 fingerprint of raw image bytes.
///
/// Two inputs with the same digest are treated as the same image. At 256 bits
/// the collision probability is accepted as negligible; there is no secondary
/// comparison of the underlying bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContentDigest([u8; 32]);

impl ContentDigest {
    pub fn of(bytes: &[u8]) -> Self {
        Self(*blake3::hash(bytes).as_bytes())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        blake3::Hash::from(self.0).to_hex().to_string()
    }
}

impl fmt::Debug for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentDigest({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Cache identity of one source image at one quality tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageKey {
    pub digest: ContentDigest,
    pub tier: QualityTier,
}

impl ImageKey {
    pub fn new(digest: ContentDigest, tier: QualityTier) -> Self {
        Self { digest, tier }
    }

    /// Derive the key from raw bytes. Callers validate the bytes first.
    pub fn from_bytes(bytes: &[u8], tier: QualityTier) -> Self {
        Self::new(ContentDigest::of(bytes), tier)
    }
}

impl fmt::Display for ImageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", &self.digest.to_hex()[..16], self.tier)
    }
}
