//! Reference backends for the device, encoder, and capability seams.

pub mod host_device;
pub mod onnx_encoder;
pub mod static_probe;

pub use host_device::HostDevice;
pub use onnx_encoder::OnnxVisionEncoder;
pub use static_probe::StaticCapabilityProbe;
