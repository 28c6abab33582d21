use std::fmt;

use serde::{Deserialize, Serialize};

use super::{QualityTier, UnsupportedReason};

/// How much attention an advisory deserves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
}

/// Machine-readable advisory kind. Callers branch on this, never on the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum AdvisoryCode {
    LowerTier {
        current: QualityTier,
        suggested: QualityTier,
    },
    EnableOptimization,
    OptimizationUnavailable {
        reason: UnsupportedReason,
    },
    WarmupLatency,
}

/// A non-binding suggestion surfaced alongside an embedding result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Advisory {
    pub code: AdvisoryCode,
    pub severity: Severity,
    pub message: String,
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}
