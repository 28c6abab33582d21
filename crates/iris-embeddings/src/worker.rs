//! Single-worker actor per model instance.
//!
//! All requests for a model are queued on one channel and processed to
//! completion in arrival order on a dedicated blocking thread that owns the
//! [`ModelLifecycle`]. Separate workers run independently.
//!
//! A caller that drops its pending `embed` future abandons the request: the
//! worker notices the closed reply channel, releases any device tensors, and
//! stores nothing.

use std::sync::Arc;

use iris_core::constants::WORKER_QUEUE_DEPTH;
use iris_core::errors::{IrisError, IrisResult};
use iris_core::models::CompilationStatus;
use iris_core::traits::{IDevice, IVisionEncoder};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::engine::{EmbedRequest, EmbedResponse};
use crate::lifecycle::ModelLifecycle;

enum Command {
    Embed {
        request: EmbedRequest,
        reply: oneshot::Sender<IrisResult<EmbedResponse>>,
    },
    Load {
        encoder: Box<dyn IVisionEncoder>,
        device: Arc<dyn IDevice>,
        reply: oneshot::Sender<IrisResult<()>>,
    },
    Unload {
        reply: oneshot::Sender<bool>,
    },
    SetCacheEnabled {
        enabled: bool,
        reply: oneshot::Sender<()>,
    },
    Status {
        reply: oneshot::Sender<Option<WorkerStatus>>,
    },
}

/// Point-in-time view of the worker's loaded model.
#[derive(Debug, Clone)]
pub struct WorkerStatus {
    pub compilation: CompilationStatus,
    pub cached_embeddings: u64,
    pub cache_enabled: bool,
    pub metrics: serde_json::Value,
}

/// Handle to a model's embedding worker.
pub struct EmbeddingWorker {
    tx: mpsc::Sender<Command>,
    handle: JoinHandle<()>,
}

impl EmbeddingWorker {
    /// Start the worker on tokio's blocking pool. Must be called from within a
    /// tokio runtime.
    pub fn spawn(lifecycle: ModelLifecycle) -> Self {
        let (tx, rx) = mpsc::channel(WORKER_QUEUE_DEPTH);
        let handle = tokio::task::spawn_blocking(move || run(lifecycle, rx));
        Self { tx, handle }
    }

    pub async fn embed(&self, request: EmbedRequest) -> IrisResult<EmbedResponse> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Embed { request, reply }).await?;
        rx.await.map_err(|_| IrisError::WorkerStopped)?
    }

    pub async fn load(&self, encoder: Box<dyn IVisionEncoder>, device: Arc<dyn IDevice>) -> IrisResult<()> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Load {
            encoder,
            device,
            reply,
        })
        .await?;
        rx.await.map_err(|_| IrisError::WorkerStopped)?
    }

    /// Returns whether a model was loaded.
    pub async fn unload(&self) -> IrisResult<bool> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Unload { reply }).await?;
        rx.await.map_err(|_| IrisError::WorkerStopped)
    }

    pub async fn set_cache_enabled(&self, enabled: bool) -> IrisResult<()> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::SetCacheEnabled { enabled, reply }).await?;
        rx.await.map_err(|_| IrisError::WorkerStopped)
    }

    /// `None` when no model is loaded.
    pub async fn status(&self) -> IrisResult<Option<WorkerStatus>> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Status { reply }).await?;
        rx.await.map_err(|_| IrisError::WorkerStopped)
    }

    /// Stop accepting requests, drain the queue, and unload the model.
    pub async fn shutdown(self) -> IrisResult<()> {
        drop(self.tx);
        self.handle.await.map_err(|_| IrisError::WorkerStopped)
    }

    async fn send(&self, command: Command) -> IrisResult<()> {
        self.tx
            .send(command)
            .await
            .map_err(|_| IrisError::WorkerStopped)
    }
}

fn run(mut lifecycle: ModelLifecycle, mut rx: mpsc::Receiver<Command>) {
    while let Some(command) = rx.blocking_recv() {
        match command {
            Command::Embed { request, reply } => {
                if reply.is_closed() {
                    debug!("skipping embedding request abandoned while queued");
                    continue;
                }
                let result = {
                    let abandoned = || reply.is_closed();
                    lifecycle.embed_cancellable(&request, &abandoned)
                };
                let _ = reply.send(result);
            }
            Command::Load {
                encoder,
                device,
                reply,
            } => {
                let _ = reply.send(lifecycle.on_load(encoder, device));
            }
            Command::Unload { reply } => {
                let _ = reply.send(lifecycle.on_unload());
            }
            Command::SetCacheEnabled { enabled, reply } => {
                lifecycle.set_cache_enabled(enabled);
                let _ = reply.send(());
            }
            Command::Status { reply } => {
                let status = lifecycle.context().map(|ctx| WorkerStatus {
                    compilation: ctx.compilation_status(),
                    cached_embeddings: ctx.cache().len(),
                    cache_enabled: ctx.cache().is_enabled(),
                    metrics: ctx.metrics().snapshot(),
                });
                let _ = reply.send(status);
            }
        }
    }
    debug!("embedding worker stopped");
}
