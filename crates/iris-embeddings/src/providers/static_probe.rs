//! Capability probe with fixed answers.

use iris_core::models::{RuntimeCapabilities, RuntimeVersion};
use iris_core::traits::ICapabilityProbe;

/// Reports capabilities decided by the host application at startup.
#[derive(Debug, Clone, Copy)]
pub struct StaticCapabilityProbe {
    capabilities: RuntimeCapabilities,
}

impl StaticCapabilityProbe {
    pub fn new(runtime_version: RuntimeVersion, accelerator_present: bool) -> Self {
        Self {
            capabilities: RuntimeCapabilities {
                runtime_version,
                accelerator_present,
            },
        }
    }

    /// A probe that never allows optimization.
    pub fn unsupported() -> Self {
        Self::new(RuntimeVersion::new(0, 0), false)
    }
}

impl ICapabilityProbe for StaticCapabilityProbe {
    fn probe(&self) -> RuntimeCapabilities {
        self.capabilities
    }
}
