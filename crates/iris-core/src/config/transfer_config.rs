use serde::{Deserialize, Serialize};

use super::defaults;

/// Host-to-device transfer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferConfig {
    /// Request non-blocking copies where the device supports them.
    pub non_blocking: bool,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            non_blocking: defaults::DEFAULT_NON_BLOCKING_TRANSFER,
        }
    }
}
