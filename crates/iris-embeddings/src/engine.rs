//! EmbeddingEngine: sequences one embedding request end to end.
//!
//! resolve tier → cache lookup → preprocess misses → transfer → encode via
//! the compilation manager → cache store → timing sample → advisories.

use std::sync::Arc;
use std::time::Instant;

use iris_core::config::IrisConfig;
use iris_core::constants::{GRID_THW_INPUT, PIXEL_VALUES_INPUT};
use iris_core::errors::{IrisError, IrisResult};
use iris_core::models::{
    Advisory, DeviceId, EmbeddingRecord, HostTensor, ImageKey, PreparedImage, QualityTier,
    TimingSample, TimingSummary, TransferBatch,
};
use iris_core::traits::IImagePreprocessor;
use iris_observability::{advise, embed_request_span};
use rayon::prelude::*;
use tracing::{debug, info};
use uuid::Uuid;

use crate::cache::image_key;
use crate::lifecycle::ModelContext;
use crate::transfer::TransferPipeline;

/// A batch of raw images to embed at one quality tier.
#[derive(Debug, Clone)]
pub struct EmbedRequest {
    pub images: Vec<Vec<u8>>,
    /// Tier label; `None` uses the configured default.
    pub tier: Option<String>,
}

impl EmbedRequest {
    pub fn new(images: Vec<Vec<u8>>, tier: QualityTier) -> Self {
        Self {
            images,
            tier: Some(tier.label().to_string()),
        }
    }

    pub fn with_label(images: Vec<Vec<u8>>, label: impl Into<String>) -> Self {
        Self {
            images,
            tier: Some(label.into()),
        }
    }
}

/// One image's outcome.
#[derive(Debug, Clone)]
pub struct SlotEmbedding {
    pub record: Arc<EmbeddingRecord>,
    /// Served from cache rather than encoded by this request.
    pub cached: bool,
}

/// Per-image result: a decode failure affects only its own slot.
pub type SlotResult = IrisResult<SlotEmbedding>;

/// Ordered per-image results plus advisories and timing.
#[derive(Debug)]
pub struct EmbedResponse {
    pub request_id: Uuid,
    pub tier: QualityTier,
    pub slots: Vec<SlotResult>,
    pub advisories: Vec<Advisory>,
    pub timing: TimingSummary,
}

impl EmbedResponse {
    pub fn cache_hits(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| matches!(s, Ok(slot) if slot.cached))
            .count()
    }

    pub fn failures(&self) -> usize {
        self.slots.iter().filter(|s| s.is_err()).count()
    }

    /// Advisory lines for display or logging.
    pub fn advisory_text(&self) -> Vec<String> {
        self.advisories.iter().map(|a| a.message.clone()).collect()
    }
}

/// A miss that decoded successfully and is waiting to be encoded.
struct PendingImage {
    slot: usize,
    key: ImageKey,
    prepared: PreparedImage,
}

/// Orchestrates embedding requests against a model context.
pub struct EmbeddingEngine {
    preprocessor: Arc<dyn IImagePreprocessor>,
    transfer: TransferPipeline,
    default_tier: QualityTier,
}

impl EmbeddingEngine {
    pub fn new(config: &IrisConfig, preprocessor: Arc<dyn IImagePreprocessor>) -> Self {
        Self {
            preprocessor,
            transfer: TransferPipeline::new(&config.transfer),
            default_tier: config.embedding.quality,
        }
    }

    /// Embed a request to completion.
    pub fn embed(&self, ctx: &mut ModelContext, request: &EmbedRequest) -> IrisResult<EmbedResponse> {
        self.embed_cancellable(ctx, request, &|| false)
    }

    /// Embed a request, checking `abandoned` before each blocking stage.
    ///
    /// An abandoned request releases its device tensors and stores nothing.
    pub fn embed_cancellable(
        &self,
        ctx: &mut ModelContext,
        request: &EmbedRequest,
        abandoned: &dyn Fn() -> bool,
    ) -> IrisResult<EmbedResponse> {
        let result = self.run(ctx, request, abandoned);
        if result.is_err() {
            ctx.metrics.record_failed_request();
        }
        result
    }

    fn run(
        &self,
        ctx: &mut ModelContext,
        request: &EmbedRequest,
        abandoned: &dyn Fn() -> bool,
    ) -> IrisResult<EmbedResponse> {
        let started = Instant::now();
        let request_id = Uuid::new_v4();
        let tier = match &request.tier {
            Some(label) => label.parse::<QualityTier>()?,
            None => self.default_tier,
        };
        let bounds = tier.bounds();
        let span = embed_request_span!(request_id, tier, request.images.len());
        let _guard = span.enter();

        let image_count = request.images.len();
        let mut slots: Vec<Option<SlotResult>> = (0..image_count).map(|_| None).collect();

        // Cache lookup, partitioning into hits and misses.
        let mut misses = Vec::new();
        for (slot, bytes) in request.images.iter().enumerate() {
            match image_key(bytes, tier) {
                Err(e) => slots[slot] = Some(Err(e)),
                Ok(key) => match ctx.cache.get(&key) {
                    Some(record) => {
                        slots[slot] = Some(Ok(SlotEmbedding {
                            record,
                            cached: true,
                        }))
                    }
                    None => misses.push((slot, key)),
                },
            }
        }
        let hits = slots.iter().filter(|s| matches!(s, Some(Ok(_)))).count();
        let miss_count = misses.len();

        // Decode and resize misses in parallel; failures stay in their slot.
        let preprocessor = &self.preprocessor;
        let prepared: Vec<(usize, ImageKey, IrisResult<PreparedImage>)> = misses
            .into_par_iter()
            .map(|(slot, key)| (slot, key, preprocessor.preprocess(&request.images[slot], bounds)))
            .collect();

        let mut pending = Vec::with_capacity(prepared.len());
        for (slot, key, outcome) in prepared {
            match outcome {
                Ok(prepared) => pending.push(PendingImage { slot, key, prepared }),
                Err(e) => {
                    debug!(slot, error = %e, "image preprocessing failed");
                    slots[slot] = Some(Err(e));
                }
            }
        }
        let decode_failures = slots
            .iter()
            .filter(|s| matches!(s, Some(Err(e)) if e.is_slot_local()))
            .count();
        ctx.metrics.record_decode_failures(decode_failures);

        if !pending.is_empty() {
            let records = self.encode_pending(ctx, &pending, abandoned)?;
            if abandoned() {
                return Err(IrisError::Cancelled);
            }
            for (image, record) in pending.iter().zip(records) {
                let record = Arc::new(record);
                ctx.cache.insert(image.key, Arc::clone(&record));
                slots[image.slot] = Some(Ok(SlotEmbedding {
                    record,
                    cached: false,
                }));
            }
        }

        let sample = TimingSample {
            duration: started.elapsed(),
            image_count,
            tier,
            cache_hit: image_count > 0 && hits == image_count,
        };
        ctx.metrics.record_request(&sample, hits, miss_count);

        let mut advisories = ctx.compilation.drain_notes();
        advisories.extend(advise(&sample, ctx.compilation.state()));
        for advisory in &advisories {
            info!(code = ?advisory.code, "{}", advisory.message);
        }

        debug!(
            hits,
            misses = miss_count,
            elapsed_ms = sample.duration.as_millis() as u64,
            "embedding request complete"
        );

        Ok(EmbedResponse {
            request_id,
            tier,
            slots: slots
                .into_iter()
                .map(|s| s.unwrap_or_else(|| Err(IrisError::encode("slot left unfilled"))))
                .collect(),
            advisories,
            timing: sample.summary(),
        })
    }

    /// Transfer and encode every pending miss as one batch.
    fn encode_pending(
        &self,
        ctx: &mut ModelContext,
        pending: &[PendingImage],
        abandoned: &dyn Fn() -> bool,
    ) -> IrisResult<Vec<EmbeddingRecord>> {
        let batch = assemble_batch(ctx.device.id().clone(), pending);
        if abandoned() {
            return Err(IrisError::Cancelled);
        }

        let bundle = self.transfer.transfer(batch, &ctx.device)?;
        if abandoned() {
            return Err(IrisError::Cancelled);
        }

        ctx.metrics.record_encoder_invocation();
        let embeddings = ctx
            .compilation
            .encode(ctx.encoder.as_mut(), bundle.tensors())?;
        drop(bundle);

        if embeddings.len() != pending.len() {
            return Err(IrisError::encode(format!(
                "encoder returned {} embeddings for {} images",
                embeddings.len(),
                pending.len()
            )));
        }

        Ok(pending
            .iter()
            .zip(embeddings)
            .map(|(image, embedding)| EmbeddingRecord::new(image.key, embedding))
            .collect())
    }
}

/// Concatenate prepared images into the encoder's two-tensor input bundle.
fn assemble_batch(device: DeviceId, pending: &[PendingImage]) -> TransferBatch {
    let patch_dim = pending.first().map(|p| p.prepared.patch_dim).unwrap_or(0);
    let total_patches: usize = pending.iter().map(|p| p.prepared.grid.patch_count()).sum();

    let mut pixels = Vec::with_capacity(total_patches * patch_dim);
    let mut grid = Vec::with_capacity(pending.len() * 3);
    for image in pending {
        pixels.extend_from_slice(&image.prepared.patches);
        let g = image.prepared.grid;
        grid.extend([i64::from(g.t), i64::from(g.h), i64::from(g.w)]);
    }

    let mut batch = TransferBatch::new(device);
    batch.push(HostTensor::f32(
        PIXEL_VALUES_INPUT,
        vec![total_patches, patch_dim],
        pixels,
    ));
    batch.push(HostTensor::i64(GRID_THW_INPUT, vec![pending.len(), 3], grid));
    batch
}
