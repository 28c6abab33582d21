//! TOML-backed configuration. Every section and field has a default, so an
//! empty document is a valid configuration.

pub mod defaults;

mod compilation_config;
mod embedding_config;
mod observability_config;
mod transfer_config;

pub use compilation_config::CompilationConfig;
pub use embedding_config::EmbeddingConfig;
pub use observability_config::ObservabilityConfig;
pub use transfer_config::TransferConfig;

use serde::{Deserialize, Serialize};

use crate::errors::{IrisError, IrisResult};

/// Root configuration for the image-embedding subsystem.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IrisConfig {
    pub embedding: EmbeddingConfig,
    pub compilation: CompilationConfig,
    pub transfer: TransferConfig,
    pub observability: ObservabilityConfig,
}

impl IrisConfig {
    /// Parse and validate a TOML document.
    ///
    /// # Errors
    /// `IrisError::InvalidConfiguration` for syntax errors, unknown tier
    /// labels, wrongly typed fields, or an unparseable runtime version.
    pub fn from_toml(source: &str) -> IrisResult<Self> {
        let config: Self =
            toml::from_str(source).map_err(|e| IrisError::invalid_config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> IrisResult<String> {
        toml::to_string(self).map_err(|e| IrisError::invalid_config(e.to_string()))
    }

    pub fn validate(&self) -> IrisResult<()> {
        self.compilation.min_runtime_version()?;
        if self.embedding.cache_capacity == Some(0) {
            return Err(IrisError::invalid_config(
                "embedding.cache_capacity must be greater than zero when set",
            ));
        }
        Ok(())
    }
}
