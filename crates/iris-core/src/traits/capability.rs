use crate::models::RuntimeCapabilities;

/// Reports whether ahead-of-time optimization can run in this process.
pub trait ICapabilityProbe: Send + Sync {
    fn probe(&self) -> RuntimeCapabilities;
}
