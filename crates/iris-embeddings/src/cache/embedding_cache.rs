//! In-memory embedding cache using moka.
//!
//! One instance per loaded model. No TTL and, by default, no size bound:
//! entries live until the model is unloaded. A configured bound lets moka
//! evict or refuse admission under pressure.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use iris_core::errors::{IrisError, IrisResult};
use iris_core::models::{EmbeddingRecord, ImageKey, QualityTier};
use moka::sync::Cache;
use tracing::debug;

/// Derive the cache key for raw image bytes.
///
/// Only the header is sniffed here; a full decode happens later and only on
/// a miss. Unrecognizable bytes never reach the cache.
///
/// # Errors
/// `IrisError::DecodeError` if the bytes are empty or not a known image format.
pub fn image_key(bytes: &[u8], tier: QualityTier) -> IrisResult<ImageKey> {
    if bytes.is_empty() {
        return Err(IrisError::decode("image buffer is empty"));
    }
    image::guess_format(bytes).map_err(|e| IrisError::decode(e.to_string()))?;
    Ok(ImageKey::from_bytes(bytes, tier))
}

/// Per-model store of embedding records.
///
/// Cloning yields another handle to the same store.
#[derive(Clone)]
pub struct EmbeddingCache {
    cache: Cache<ImageKey, Arc<EmbeddingRecord>>,
    enabled: Arc<AtomicBool>,
}

impl EmbeddingCache {
    /// Create a cache, unbounded unless `max_entries` is set.
    pub fn new(max_entries: Option<u64>, enabled: bool) -> Self {
        let builder = Cache::builder();
        let builder = match max_entries {
            Some(max) => builder.max_capacity(max),
            None => builder,
        };
        Self {
            cache: builder.build(),
            enabled: Arc::new(AtomicBool::new(enabled)),
        }
    }

    /// Look up the record for raw image bytes at a tier.
    ///
    /// Misses whenever the cache is disabled.
    pub fn lookup(&self, bytes: &[u8], tier: QualityTier) -> IrisResult<Option<Arc<EmbeddingRecord>>> {
        let key = image_key(bytes, tier)?;
        Ok(self.get(&key))
    }

    /// Store a record for raw image bytes at a tier. No-op when disabled.
    pub fn store(&self, bytes: &[u8], tier: QualityTier, record: Arc<EmbeddingRecord>) -> IrisResult<()> {
        let key = image_key(bytes, tier)?;
        self.insert(key, record);
        Ok(())
    }

    /// Look up by precomputed key.
    pub fn get(&self, key: &ImageKey) -> Option<Arc<EmbeddingRecord>> {
        if !self.is_enabled() {
            return None;
        }
        let hit = self.cache.get(key);
        if hit.is_some() {
            debug!(key = %key, "embedding cache hit");
        }
        hit
    }

    /// Insert by precomputed key, overwriting any existing record.
    pub fn insert(&self, key: ImageKey, record: Arc<EmbeddingRecord>) {
        if !self.is_enabled() {
            return;
        }
        self.cache.insert(key, record);
    }

    /// Drop every record. Called once per model unload.
    pub fn clear(&self) {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks();
    }

    /// Toggle the cache without discarding existing records.
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Number of records currently held.
    pub fn len(&self) -> u64 {
        self.cache.run_pending_tasks();
        self.cache.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for EmbeddingCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingCache")
            .field("entries", &self.cache.entry_count())
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use iris_core::config::EmbeddingConfig;
    use iris_core::models::{DeviceId, Embedding};

    use super::*;

    const PNG_MAGIC: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    fn png_like(tail: &[u8]) -> Vec<u8> {
        let mut bytes = PNG_MAGIC.to_vec();
        bytes.extend_from_slice(tail);
        bytes
    }

    fn record(bytes: &[u8], tier: QualityTier, fill: f32) -> Arc<EmbeddingRecord> {
        let key = image_key(bytes, tier).unwrap();
        let embedding = Embedding::new(vec![2, 3], vec![fill; 6], DeviceId::cpu());
        Arc::new(EmbeddingRecord::new(key, embedding))
    }

    #[test]
    fn store_then_lookup() {
        let cache = EmbeddingCache::new(None, true);
        let img = png_like(b"one");
        let rec = record(&img, QualityTier::Balanced, 1.0);
        cache.store(&img, QualityTier::Balanced, rec.clone()).unwrap();
        let got = cache.lookup(&img, QualityTier::Balanced).unwrap().unwrap();
        assert_eq!(*got, *rec);
    }

    #[test]
    fn miss_returns_none() {
        let cache = EmbeddingCache::new(None, true);
        assert!(cache.lookup(&png_like(b"x"), QualityTier::Fast).unwrap().is_none());
    }

    #[test]
    fn tiers_are_isolated() {
        let cache = EmbeddingCache::new(None, true);
        let img = png_like(b"tiered");
        cache
            .store(&img, QualityTier::High, record(&img, QualityTier::High, 2.0))
            .unwrap();
        assert!(cache.lookup(&img, QualityTier::Ultra).unwrap().is_none());
        assert!(cache.lookup(&img, QualityTier::High).unwrap().is_some());
    }

    #[test]
    fn clear_empties_cache() {
        let cache = EmbeddingCache::new(None, true);
        let a = png_like(b"a");
        let b = png_like(b"b");
        cache.store(&a, QualityTier::Fast, record(&a, QualityTier::Fast, 1.0)).unwrap();
        cache.store(&b, QualityTier::Fast, record(&b, QualityTier::Fast, 2.0)).unwrap();
        assert_eq!(cache.len(), 2);
        cache.clear();
        assert!(cache.lookup(&a, QualityTier::Fast).unwrap().is_none());
        assert!(cache.lookup(&b, QualityTier::Fast).unwrap().is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn disable_hides_but_keeps_entries() {
        let cache = EmbeddingCache::new(None, true);
        let img = png_like(b"toggle");
        cache
            .store(&img, QualityTier::Fast, record(&img, QualityTier::Fast, 3.0))
            .unwrap();

        cache.set_enabled(false);
        assert!(cache.lookup(&img, QualityTier::Fast).unwrap().is_none());
        // Stores while disabled are dropped.
        let other = png_like(b"other");
        cache
            .store(&other, QualityTier::Fast, record(&other, QualityTier::Fast, 4.0))
            .unwrap();

        cache.set_enabled(true);
        assert!(cache.lookup(&img, QualityTier::Fast).unwrap().is_some());
        assert!(cache.lookup(&other, QualityTier::Fast).unwrap().is_none());
    }

    #[test]
    fn overwrite_replaces() {
        let cache = EmbeddingCache::new(None, true);
        let img = png_like(b"over");
        cache.store(&img, QualityTier::Fast, record(&img, QualityTier::Fast, 1.0)).unwrap();
        cache.store(&img, QualityTier::Fast, record(&img, QualityTier::Fast, 9.0)).unwrap();
        assert_eq!(cache.len(), 1);
        let got = cache.lookup(&img, QualityTier::Fast).unwrap().unwrap();
        assert_eq!(got.embedding.values[0], 9.0);
    }

    #[test]
    fn unreadable_bytes_fail_before_cache() {
        let cache = EmbeddingCache::new(None, true);
        assert!(matches!(
            cache.lookup(b"not an image", QualityTier::Fast),
            Err(IrisError::DecodeError { .. })
        ));
        assert!(matches!(
            cache.lookup(&[], QualityTier::Fast),
            Err(IrisError::DecodeError { .. })
        ));
        assert!(cache.is_empty());
    }

    #[test]
    fn clones_share_storage() {
        let cache = EmbeddingCache::new(None, true);
        let handle = cache.clone();
        let img = png_like(b"shared");
        cache.store(&img, QualityTier::Fast, record(&img, QualityTier::Fast, 1.0)).unwrap();
        assert!(handle.lookup(&img, QualityTier::Fast).unwrap().is_some());
        handle.set_enabled(false);
        assert!(!cache.is_enabled());
    }

    #[test]
    fn default_cache_admits_after_heavy_reuse() {
        let cache = EmbeddingCache::new(EmbeddingConfig::default().cache_capacity, true);
        let hot: Vec<Vec<u8>> = (0..64u8).map(|i| png_like(&[i])).collect();
        for img in &hot {
            cache.store(img, QualityTier::Fast, record(img, QualityTier::Fast, 1.0)).unwrap();
        }
        for _ in 0..5 {
            for img in &hot {
                assert!(cache.lookup(img, QualityTier::Fast).unwrap().is_some());
            }
        }

        let fresh = png_like(b"fresh");
        let rec = record(&fresh, QualityTier::Fast, 7.0);
        cache.store(&fresh, QualityTier::Fast, Arc::clone(&rec)).unwrap();
        assert_eq!(cache.len(), 65);
        assert_eq!(cache.lookup(&fresh, QualityTier::Fast).unwrap(), Some(rec));
        for img in &hot {
            assert!(cache.lookup(img, QualityTier::Fast).unwrap().is_some());
        }
    }
}
