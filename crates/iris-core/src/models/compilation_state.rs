use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::IrisError;

/// Why the optimized encoder path is not in use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnsupportedReason {
    RuntimeTooOld,
    NoAccelerator,
    Disabled,
    OptimizationFailed,
    WarmupFailed,
}

impl fmt::Display for UnsupportedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::RuntimeTooOld => "runtime version below the optimization threshold",
            Self::NoAccelerator => "no accelerator available",
            Self::Disabled => "optimization disabled in configuration",
            Self::OptimizationFailed => "ahead-of-time optimization failed",
            Self::WarmupFailed => "optimized encoder failed on its first call",
        };
        f.write_str(s)
    }
}

/// Encoder optimization state for one loaded model.
///
/// Moves away from `Uncompiled` exactly once; only a model reload resets it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CompileState {
    #[default]
    Uncompiled,
    Compiling,
    Compiled,
    Unsupported { reason: UnsupportedReason },
}

impl CompileState {
    /// Whether requests run on the plain encoder path.
    pub fn is_unoptimized(&self) -> bool {
        matches!(self, Self::Uncompiled | Self::Unsupported { .. })
    }
}

/// Which encoder path executes a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionPath {
    Optimized,
    Eager,
}

/// Optimization mode requested from the encoder backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompileMode {
    /// Favor low per-call overhead over peak throughput.
    #[default]
    ReduceOverhead,
    Default,
    MaxAutotune,
}

/// `major.minor` runtime version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RuntimeVersion {
    pub major: u32,
    pub minor: u32,
}

impl RuntimeVersion {
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }
}

impl fmt::Display for RuntimeVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl FromStr for RuntimeVersion {
    type Err = IrisError;

    /// Accepts `2`, `2.1`, or `2.1.3` (patch ignored).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || IrisError::invalid_config(format!("invalid runtime version `{s}`"));
        let mut parts = s.trim().split('.');
        let major = parts
            .next()
            .and_then(|p| p.parse().ok())
            .ok_or_else(bad)?;
        let minor = match parts.next() {
            Some(p) => p.parse().map_err(|_| bad())?,
            None => 0,
        };
        Ok(Self { major, minor })
    }
}

/// What the capability probe reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeCapabilities {
    pub runtime_version: RuntimeVersion,
    pub accelerator_present: bool,
}

/// Capability flags derived from a probe against the configured threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityFlags {
    pub runtime_version_ok: bool,
    pub accelerator_present: bool,
}

impl CapabilityFlags {
    pub fn evaluate(caps: RuntimeCapabilities, minimum: RuntimeVersion) -> Self {
        Self {
            runtime_version_ok: caps.runtime_version >= minimum,
            accelerator_present: caps.accelerator_present,
        }
    }

    /// First unmet requirement, if any.
    pub fn unsupported_reason(&self) -> Option<UnsupportedReason> {
        if !self.runtime_version_ok {
            Some(UnsupportedReason::RuntimeTooOld)
        } else if !self.accelerator_present {
            Some(UnsupportedReason::NoAccelerator)
        } else {
            None
        }
    }
}

/// Snapshot of the compilation manager for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilationStatus {
    pub state: CompileState,
    pub flags: Option<CapabilityFlags>,
    pub warmed_up: bool,
}
