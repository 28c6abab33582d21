//! Per-model state and the load/unload hooks that own it.
//!
//! Everything cached or decided for a model lives in its [`ModelContext`]:
//! the embedding cache, the compilation state, and the metrics. Unloading
//! clears the cache and drops the context, so no record outlives its model.

use std::sync::Arc;

use iris_core::config::IrisConfig;
use iris_core::errors::{IrisError, IrisResult};
use iris_core::models::{CompilationStatus, DeviceId};
use iris_core::traits::{ICapabilityProbe, IDevice, IImagePreprocessor, IVisionEncoder};
use iris_observability::EmbeddingMetrics;
use tracing::info;

use crate::cache::EmbeddingCache;
use crate::compilation::CompilationManager;
use crate::engine::{EmbedRequest, EmbedResponse, EmbeddingEngine};

/// State owned by one loaded model instance.
pub struct ModelContext {
    pub(crate) encoder: Box<dyn IVisionEncoder>,
    pub(crate) device: Arc<dyn IDevice>,
    pub(crate) cache: EmbeddingCache,
    pub(crate) compilation: CompilationManager,
    pub(crate) metrics: EmbeddingMetrics,
}

impl ModelContext {
    pub fn new(
        config: &IrisConfig,
        encoder: Box<dyn IVisionEncoder>,
        device: Arc<dyn IDevice>,
        probe: Arc<dyn ICapabilityProbe>,
    ) -> IrisResult<Self> {
        Ok(Self {
            encoder,
            device,
            cache: EmbeddingCache::new(
                config.embedding.cache_capacity,
                config.embedding.enable_image_cache,
            ),
            compilation: CompilationManager::new(&config.compilation, probe)?,
            metrics: EmbeddingMetrics::new(),
        })
    }

    pub fn cache(&self) -> &EmbeddingCache {
        &self.cache
    }

    pub fn compilation_status(&self) -> CompilationStatus {
        self.compilation.status()
    }

    pub fn metrics(&self) -> &EmbeddingMetrics {
        &self.metrics
    }

    pub fn device_id(&self) -> &DeviceId {
        self.device.id()
    }

    pub fn encoder_name(&self) -> &str {
        self.encoder.name()
    }
}

impl std::fmt::Debug for ModelContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelContext")
            .field("encoder", &self.encoder.name())
            .field("device", self.device.id())
            .field("cache", &self.cache)
            .field("compilation", &self.compilation)
            .finish()
    }
}

/// Receives model lifecycle signals and routes requests to the live model.
pub struct ModelLifecycle {
    config: IrisConfig,
    engine: EmbeddingEngine,
    probe: Arc<dyn ICapabilityProbe>,
    context: Option<ModelContext>,
}

impl ModelLifecycle {
    /// # Errors
    /// `IrisError::InvalidConfiguration` if the configuration does not validate.
    pub fn new(
        config: IrisConfig,
        preprocessor: Arc<dyn IImagePreprocessor>,
        probe: Arc<dyn ICapabilityProbe>,
    ) -> IrisResult<Self> {
        config.validate()?;
        let engine = EmbeddingEngine::new(&config, preprocessor);
        Ok(Self {
            config,
            engine,
            probe,
            context: None,
        })
    }

    /// "Model loaded" signal. A load while already loaded is a reload: the
    /// previous context is unloaded first and compilation starts over.
    pub fn on_load(&mut self, encoder: Box<dyn IVisionEncoder>, device: Arc<dyn IDevice>) -> IrisResult<()> {
        if self.context.is_some() {
            self.on_unload();
        }
        let context = ModelContext::new(&self.config, encoder, device, Arc::clone(&self.probe))?;
        info!(
            encoder = context.encoder_name(),
            device = %context.device_id(),
            cache_enabled = context.cache.is_enabled(),
            "model loaded"
        );
        self.context = Some(context);
        Ok(())
    }

    /// "Model unloaded" signal. Returns whether a model was loaded.
    pub fn on_unload(&mut self) -> bool {
        match self.context.take() {
            Some(context) => {
                context.cache.clear();
                info!(
                    encoder = context.encoder_name(),
                    requests = context.metrics.requests,
                    cache_hit_rate = context.metrics.cache_hit_rate(),
                    "model unloaded"
                );
                true
            }
            None => false,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.context.is_some()
    }

    pub fn context(&self) -> Option<&ModelContext> {
        self.context.as_ref()
    }

    /// Toggle caching for the live model and for future loads.
    pub fn set_cache_enabled(&mut self, enabled: bool) {
        self.config.embedding.enable_image_cache = enabled;
        if let Some(context) = &self.context {
            context.cache.set_enabled(enabled);
        }
    }

    pub fn embed(&mut self, request: &EmbedRequest) -> IrisResult<EmbedResponse> {
        self.embed_cancellable(request, &|| false)
    }

    pub fn embed_cancellable(
        &mut self,
        request: &EmbedRequest,
        abandoned: &dyn Fn() -> bool,
    ) -> IrisResult<EmbedResponse> {
        let context = self.context.as_mut().ok_or(IrisError::ModelNotLoaded)?;
        self.engine.embed_cancellable(context, request, abandoned)
    }
}

impl Drop for ModelLifecycle {
    fn drop(&mut self) {
        self.on_unload();
    }
}
