//! Lazy ahead-of-time optimization of the vision encoder.
//!
//! State machine per loaded model:
//! `Uncompiled → Compiling → Compiled`, or `Uncompiled → Unsupported`.
//! The capability probe runs once, on the first encode; every later call
//! reads the settled state. A model reload is the only way back to
//! `Uncompiled`.

use std::sync::Arc;

use iris_core::config::CompilationConfig;
use iris_core::errors::IrisResult;
use iris_core::models::{
    Advisory, CapabilityFlags, CompilationStatus, CompileMode, CompileState, DeviceTensor,
    Embedding, ExecutionPath, RuntimeVersion, UnsupportedReason,
};
use iris_core::traits::{ICapabilityProbe, IVisionEncoder};
use iris_observability::{compilation_note, compile_span, encode_span, warmup_note};
use tracing::{info, warn};

/// Wraps encoder calls with one-time capability probing and optimization.
pub struct CompilationManager {
    state: CompileState,
    flags: Option<CapabilityFlags>,
    warmed_up: bool,
    enabled: bool,
    min_version: RuntimeVersion,
    mode: CompileMode,
    probe: Arc<dyn ICapabilityProbe>,
    /// Advisory notes accumulated since the last drain.
    notes: Vec<Advisory>,
}

impl CompilationManager {
    pub fn new(config: &CompilationConfig, probe: Arc<dyn ICapabilityProbe>) -> IrisResult<Self> {
        Ok(Self {
            state: CompileState::Uncompiled,
            flags: None,
            warmed_up: false,
            enabled: config.enabled,
            min_version: config.min_runtime_version()?,
            mode: config.mode,
            probe,
            notes: Vec::new(),
        })
    }

    pub fn state(&self) -> CompileState {
        self.state
    }

    pub fn status(&self) -> CompilationStatus {
        CompilationStatus {
            state: self.state,
            flags: self.flags,
            warmed_up: self.warmed_up,
        }
    }

    /// Encode through the optimized path when available.
    ///
    /// The first call after load settles the compilation decision and pays the
    /// optimization cost. If the optimized encoder fails on that first call,
    /// the call is retried once on the eager path and the model stays on the
    /// eager path from then on. Failures after warmup are surfaced as-is.
    pub fn encode(
        &mut self,
        encoder: &mut dyn IVisionEncoder,
        inputs: &[DeviceTensor],
    ) -> IrisResult<Vec<Embedding>> {
        if self.state == CompileState::Uncompiled {
            self.settle(encoder);
        }

        if self.state != CompileState::Compiled {
            let _span = encode_span!(encoder.name(), ExecutionPath::Eager, inputs.len()).entered();
            return encoder.encode(inputs, ExecutionPath::Eager);
        }

        let optimized = {
            let _span =
                encode_span!(encoder.name(), ExecutionPath::Optimized, inputs.len()).entered();
            encoder.encode(inputs, ExecutionPath::Optimized)
        };

        match optimized {
            Ok(embeddings) => {
                if !self.warmed_up {
                    self.warmed_up = true;
                    self.notes.push(warmup_note());
                }
                Ok(embeddings)
            }
            Err(e) if !self.warmed_up => {
                warn!(
                    encoder = encoder.name(),
                    error = %e,
                    "optimized encoder failed on first call, retrying on eager path"
                );
                self.mark_unsupported(UnsupportedReason::WarmupFailed);
                let _span = encode_span!(encoder.name(), ExecutionPath::Eager, inputs.len()).entered();
                encoder.encode(inputs, ExecutionPath::Eager)
            }
            Err(e) => Err(e),
        }
    }

    /// Reset to `Uncompiled`. Only valid when the model is reloaded.
    pub fn reset(&mut self) {
        self.state = CompileState::Uncompiled;
        self.flags = None;
        self.warmed_up = false;
        self.notes.clear();
    }

    /// Take the advisory notes accumulated since the last drain.
    pub fn drain_notes(&mut self) -> Vec<Advisory> {
        std::mem::take(&mut self.notes)
    }

    fn settle(&mut self, encoder: &mut dyn IVisionEncoder) {
        if !self.enabled {
            self.mark_unsupported(UnsupportedReason::Disabled);
            return;
        }

        let flags = CapabilityFlags::evaluate(self.probe.probe(), self.min_version);
        self.flags = Some(flags);
        if let Some(reason) = flags.unsupported_reason() {
            self.mark_unsupported(reason);
            return;
        }

        self.state = CompileState::Compiling;
        let _span = compile_span!(encoder.name(), self.mode).entered();
        match encoder.optimize(self.mode) {
            Ok(()) => {
                self.state = CompileState::Compiled;
                info!(encoder = encoder.name(), mode = ?self.mode, "vision encoder compiled");
            }
            Err(e) => {
                warn!(encoder = encoder.name(), error = %e, "vision encoder optimization failed");
                self.mark_unsupported(UnsupportedReason::OptimizationFailed);
            }
        }
    }

    fn mark_unsupported(&mut self, reason: UnsupportedReason) {
        self.state = CompileState::Unsupported { reason };
        info!(%reason, "vision encoder running without optimization");
        self.notes.push(compilation_note(reason));
    }
}

impl std::fmt::Debug for CompilationManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompilationManager")
            .field("state", &self.state)
            .field("flags", &self.flags)
            .field("warmed_up", &self.warmed_up)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use iris_core::errors::IrisError;
    use iris_core::models::{AdvisoryCode, DeviceId};

    use super::*;
    use crate::providers::StaticCapabilityProbe;

    #[derive(Default)]
    struct Counters {
        optimize: AtomicUsize,
        optimized_calls: AtomicUsize,
        eager_calls: AtomicUsize,
    }

    struct ScriptedEncoder {
        counters: Arc<Counters>,
        fail_optimize: bool,
        optimized_failures_left: usize,
    }

    impl ScriptedEncoder {
        fn new(counters: Arc<Counters>) -> Self {
            Self {
                counters,
                fail_optimize: false,
                optimized_failures_left: 0,
            }
        }
    }

    impl IVisionEncoder for ScriptedEncoder {
        fn name(&self) -> &str {
            "scripted"
        }

        fn optimize(&mut self, _mode: CompileMode) -> IrisResult<()> {
            self.counters.optimize.fetch_add(1, Ordering::SeqCst);
            if self.fail_optimize {
                return Err(IrisError::encode("no compiler backend"));
            }
            Ok(())
        }

        fn encode(&mut self, _inputs: &[DeviceTensor], path: ExecutionPath) -> IrisResult<Vec<Embedding>> {
            match path {
                ExecutionPath::Optimized => {
                    self.counters.optimized_calls.fetch_add(1, Ordering::SeqCst);
                    if self.optimized_failures_left > 0 {
                        self.optimized_failures_left -= 1;
                        return Err(IrisError::encode("graph capture failed"));
                    }
                }
                ExecutionPath::Eager => {
                    self.counters.eager_calls.fetch_add(1, Ordering::SeqCst);
                }
            }
            Ok(vec![Embedding::new(vec![1, 1], vec![0.0], DeviceId::cpu())])
        }
    }

    fn manager(probe: StaticCapabilityProbe) -> CompilationManager {
        CompilationManager::new(&CompilationConfig::default(), Arc::new(probe)).unwrap()
    }

    fn capable() -> StaticCapabilityProbe {
        StaticCapabilityProbe::new(RuntimeVersion::new(2, 1), true)
    }

    #[test]
    fn compiles_once_and_reuses_decision() {
        let counters = Arc::new(Counters::default());
        let mut encoder = ScriptedEncoder::new(counters.clone());
        let mut mgr = manager(capable());

        assert_eq!(mgr.state(), CompileState::Uncompiled);
        mgr.encode(&mut encoder, &[]).unwrap();
        assert_eq!(mgr.state(), CompileState::Compiled);
        mgr.encode(&mut encoder, &[]).unwrap();
        mgr.encode(&mut encoder, &[]).unwrap();

        assert_eq!(counters.optimize.load(Ordering::SeqCst), 1);
        assert_eq!(counters.optimized_calls.load(Ordering::SeqCst), 3);
        assert_eq!(counters.eager_calls.load(Ordering::SeqCst), 0);
        assert!(mgr.status().warmed_up);

        let notes = mgr.drain_notes();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].code, AdvisoryCode::WarmupLatency);
        assert!(mgr.drain_notes().is_empty());
    }

    #[test]
    fn old_runtime_is_unsupported_without_optimizing() {
        let counters = Arc::new(Counters::default());
        let mut encoder = ScriptedEncoder::new(counters.clone());
        let mut mgr = manager(StaticCapabilityProbe::new(RuntimeVersion::new(1, 13), true));

        mgr.encode(&mut encoder, &[]).unwrap();
        assert_eq!(
            mgr.state(),
            CompileState::Unsupported {
                reason: UnsupportedReason::RuntimeTooOld
            }
        );
        assert_eq!(counters.optimize.load(Ordering::SeqCst), 0);
        assert_eq!(counters.eager_calls.load(Ordering::SeqCst), 1);
        assert!(matches!(
            mgr.drain_notes()[0].code,
            AdvisoryCode::OptimizationUnavailable { .. }
        ));
    }

    #[test]
    fn disabled_config_skips_probe() {
        let counters = Arc::new(Counters::default());
        let mut encoder = ScriptedEncoder::new(counters.clone());
        let config = CompilationConfig {
            enabled: false,
            ..Default::default()
        };
        let mut mgr = CompilationManager::new(&config, Arc::new(capable())).unwrap();
        mgr.encode(&mut encoder, &[]).unwrap();
        assert_eq!(
            mgr.state(),
            CompileState::Unsupported {
                reason: UnsupportedReason::Disabled
            }
        );
        assert!(mgr.status().flags.is_none());
    }

    #[test]
    fn optimization_failure_settles_unsupported() {
        let counters = Arc::new(Counters::default());
        let mut encoder = ScriptedEncoder::new(counters.clone());
        encoder.fail_optimize = true;
        let mut mgr = manager(capable());

        mgr.encode(&mut encoder, &[]).unwrap();
        mgr.encode(&mut encoder, &[]).unwrap();
        assert_eq!(
            mgr.state(),
            CompileState::Unsupported {
                reason: UnsupportedReason::OptimizationFailed
            }
        );
        assert_eq!(counters.optimize.load(Ordering::SeqCst), 1);
        assert_eq!(counters.eager_calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn warmup_failure_retries_once_on_eager() {
        let counters = Arc::new(Counters::default());
        let mut encoder = ScriptedEncoder::new(counters.clone());
        encoder.optimized_failures_left = 1;
        let mut mgr = manager(capable());

        mgr.encode(&mut encoder, &[]).unwrap();
        assert_eq!(counters.optimized_calls.load(Ordering::SeqCst), 1);
        assert_eq!(counters.eager_calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            mgr.state(),
            CompileState::Unsupported {
                reason: UnsupportedReason::WarmupFailed
            }
        );

        // Stays on the eager path afterwards.
        mgr.encode(&mut encoder, &[]).unwrap();
        assert_eq!(counters.optimized_calls.load(Ordering::SeqCst), 1);
        assert_eq!(counters.eager_calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn failure_after_warmup_is_surfaced() {
        let counters = Arc::new(Counters::default());
        let mut encoder = ScriptedEncoder::new(counters.clone());
        let mut mgr = manager(capable());
        mgr.encode(&mut encoder, &[]).unwrap();

        encoder.optimized_failures_left = 1;
        let err = mgr.encode(&mut encoder, &[]).unwrap_err();
        assert!(matches!(err, IrisError::EncodeError { .. }));
        assert_eq!(mgr.state(), CompileState::Compiled);
        assert_eq!(counters.eager_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn reset_returns_to_uncompiled() {
        let counters = Arc::new(Counters::default());
        let mut encoder = ScriptedEncoder::new(counters.clone());
        let mut mgr = manager(capable());
        mgr.encode(&mut encoder, &[]).unwrap();
        mgr.reset();
        assert_eq!(mgr.state(), CompileState::Uncompiled);
        mgr.encode(&mut encoder, &[]).unwrap();
        assert_eq!(counters.optimize.load(Ordering::SeqCst), 2);
    }
}
