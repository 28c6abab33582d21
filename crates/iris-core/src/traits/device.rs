use crate::errors::TransferError;
use crate::models::{DeviceId, DeviceTensor, HostTensor};

/// A place tensors can live, supplied by the host application.
pub trait IDevice: Send + Sync {
    fn id(&self) -> &DeviceId;

    /// Whether the device can currently accept transfers.
    fn is_available(&self) -> bool;

    /// Whether `copy_to_device(.., true)` may return before the copy completes.
    fn supports_non_blocking(&self) -> bool;

    /// Start copying one tensor to the device.
    ///
    /// With `non_blocking`, the returned handle is only safe to read after
    /// [`IDevice::synchronize`].
    fn copy_to_device(
        &self,
        tensor: &HostTensor,
        non_blocking: bool,
    ) -> Result<DeviceTensor, TransferError>;

    /// Wait for every outstanding copy on this device.
    fn synchronize(&self) -> Result<(), TransferError>;

    /// Free the device memory behind a tensor handle.
    fn release(&self, tensor: &DeviceTensor);
}
