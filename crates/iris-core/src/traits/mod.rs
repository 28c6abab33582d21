mod capability;
mod device;
mod encoder;
mod preprocessor;

pub use capability::ICapabilityProbe;
pub use device::IDevice;
pub use encoder::IVisionEncoder;
pub use preprocessor::IImagePreprocessor;
