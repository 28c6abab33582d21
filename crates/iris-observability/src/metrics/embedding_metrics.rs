//! Per-model embedding counters: cache efficiency, encoder load, and latency.

use std::time::Duration;

use iris_core::models::TimingSample;
use serde::{Deserialize, Serialize};

/// Aggregated embedding metrics over a model instance's lifetime.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmbeddingMetrics {
    pub requests: u64,
    pub images: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    /// Calls into the vision encoder, one per request with at least one miss.
    pub encoder_invocations: u64,
    pub decode_failures: u64,
    pub failed_requests: u64,
    total_latency_us: u64,
}

impl EmbeddingMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed request.
    pub fn record_request(&mut self, sample: &TimingSample, hits: usize, misses: usize) {
        self.requests += 1;
        self.images += sample.image_count as u64;
        self.cache_hits += hits as u64;
        self.cache_misses += misses as u64;
        self.total_latency_us += sample.duration.as_micros() as u64;
    }

    pub fn record_encoder_invocation(&mut self) {
        self.encoder_invocations += 1;
    }

    pub fn record_decode_failures(&mut self, count: usize) {
        self.decode_failures += count as u64;
    }

    pub fn record_failed_request(&mut self) {
        self.failed_requests += 1;
    }

    /// Fraction of looked-up images served from cache.
    pub fn cache_hit_rate(&self) -> f64 {
        let total = self.cache_hits + self.cache_misses;
        if total == 0 {
            return 0.0;
        }
        self.cache_hits as f64 / total as f64
    }

    /// Mean wall time per completed request.
    pub fn avg_request_latency(&self) -> Duration {
        if self.requests == 0 {
            return Duration::ZERO;
        }
        Duration::from_micros(self.total_latency_us / self.requests)
    }

    /// Mean wall time per image across completed requests.
    pub fn avg_image_latency(&self) -> Duration {
        if self.images == 0 {
            return Duration::ZERO;
        }
        Duration::from_micros(self.total_latency_us / self.images)
    }

    /// JSON view for external instrumentation.
    pub fn snapshot(&self) -> serde_json::Value {
        serde_json::json!({
            "requests": self.requests,
            "images": self.images,
            "cache_hits": self.cache_hits,
            "cache_misses": self.cache_misses,
            "cache_hit_rate": self.cache_hit_rate(),
            "encoder_invocations": self.encoder_invocations,
            "decode_failures": self.decode_failures,
            "failed_requests": self.failed_requests,
            "avg_request_latency_ms": self.avg_request_latency().as_millis() as u64,
            "avg_image_latency_ms": self.avg_image_latency().as_millis() as u64,
        })
    }
}
