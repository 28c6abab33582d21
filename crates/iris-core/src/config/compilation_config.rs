use serde::{Deserialize, Serialize};

use super::defaults;
use crate::errors::IrisResult;
use crate::models::{CompileMode, RuntimeVersion};

/// Vision-encoder optimization configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilationConfig {
    pub enabled: bool,
    /// Lowest runtime version (`major.minor`) allowed to optimize.
    pub min_runtime_version: String,
    pub mode: CompileMode,
}

impl CompilationConfig {
    pub fn min_runtime_version(&self) -> IrisResult<RuntimeVersion> {
        self.min_runtime_version.parse()
    }
}

impl Default for CompilationConfig {
    fn default() -> Self {
        Self {
            enabled: defaults::DEFAULT_COMPILATION_ENABLED,
            min_runtime_version: defaults::DEFAULT_MIN_RUNTIME_VERSION.to_string(),
            mode: CompileMode::default(),
        }
    }
}
