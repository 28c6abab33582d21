//! Host-to-device transfer of the encoder input bundle.
//!
//! Every tensor is enqueued without waiting on the previous one; a single
//! synchronization closes the transfer window before the bundle is handed to
//! the encoder.

use std::sync::Arc;

use iris_core::config::TransferConfig;
use iris_core::errors::{IrisError, IrisResult, TransferError};
use iris_core::models::{DeviceTensor, TransferBatch};
use iris_core::traits::IDevice;
use iris_observability::transfer_span;
use tracing::warn;

/// Device-resident tensors for one encode call.
///
/// Releases every tensor back to its device on drop, so partially transferred
/// or abandoned bundles never leak device memory.
pub struct DeviceBundle {
    device: Arc<dyn IDevice>,
    tensors: Vec<DeviceTensor>,
}

impl DeviceBundle {
    fn new(device: Arc<dyn IDevice>, capacity: usize) -> Self {
        Self {
            device,
            tensors: Vec::with_capacity(capacity),
        }
    }

    pub fn tensors(&self) -> &[DeviceTensor] {
        &self.tensors
    }

    pub fn get(&self, name: &str) -> Option<&DeviceTensor> {
        self.tensors.iter().find(|t| t.name == name)
    }

    pub fn len(&self) -> usize {
        self.tensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tensors.is_empty()
    }
}

impl Drop for DeviceBundle {
    fn drop(&mut self) {
        for tensor in self.tensors.drain(..) {
            self.device.release(&tensor);
        }
    }
}

impl std::fmt::Debug for DeviceBundle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceBundle")
            .field("device", self.device.id())
            .field("tensors", &self.tensors.iter().map(|t| &t.name).collect::<Vec<_>>())
            .finish()
    }
}

/// Moves a [`TransferBatch`] onto a device.
#[derive(Debug, Clone)]
pub struct TransferPipeline {
    non_blocking: bool,
}

impl TransferPipeline {
    pub fn new(config: &TransferConfig) -> Self {
        Self {
            non_blocking: config.non_blocking,
        }
    }

    /// Transfer every tensor in `batch` to `device`.
    ///
    /// # Errors
    /// `IrisError::DeviceTransferError` naming the tensor that failed. Tensors
    /// already placed are released before returning.
    pub fn transfer(&self, batch: TransferBatch, device: &Arc<dyn IDevice>) -> IrisResult<DeviceBundle> {
        let first = batch
            .tensors
            .first()
            .map(|t| t.name.clone())
            .unwrap_or_default();

        if &batch.device != device.id() {
            return Err(IrisError::DeviceTransferError {
                tensor: first,
                source: TransferError::Backend {
                    device: device.id().to_string(),
                    reason: format!("batch targets {}", batch.device),
                },
            });
        }
        if !device.is_available() {
            return Err(IrisError::DeviceTransferError {
                tensor: first,
                source: TransferError::DeviceUnavailable {
                    device: device.id().to_string(),
                },
            });
        }

        let non_blocking = self.non_blocking && device.supports_non_blocking();
        let span = transfer_span!(device.id(), batch.len(), batch.total_bytes());
        let _guard = span.enter();

        let mut bundle = DeviceBundle::new(Arc::clone(device), batch.len());
        for tensor in &batch.tensors {
            match device.copy_to_device(tensor, non_blocking) {
                Ok(placed) => bundle.tensors.push(placed),
                Err(source) => {
                    warn!(tensor = %tensor.name, error = %source, "device transfer failed");
                    return Err(IrisError::DeviceTransferError {
                        tensor: tensor.name.clone(),
                        source,
                    });
                }
            }
        }

        if non_blocking {
            if let Err(source) = device.synchronize() {
                // The device cannot say which copy failed; report the last one enqueued.
                let tensor = bundle
                    .tensors
                    .last()
                    .map(|t| t.name.clone())
                    .unwrap_or(first);
                warn!(tensor = %tensor, error = %source, "device synchronization failed");
                return Err(IrisError::DeviceTransferError { tensor, source });
            }
        }

        Ok(bundle)
    }
}

#[cfg(test)]
mod tests {
    use iris_core::models::{DeviceId, HostTensor};

    use super::*;
    use crate::providers::HostDevice;

    fn batch(device: DeviceId) -> TransferBatch {
        let mut batch = TransferBatch::new(device);
        batch.push(HostTensor::f32("pixel_values", vec![2, 4], vec![0.5; 8]));
        batch.push(HostTensor::i64("image_grid_thw", vec![1, 3], vec![1, 2, 2]));
        batch
    }

    #[test]
    fn transfers_in_order_with_one_sync() {
        let host = Arc::new(HostDevice::new(DeviceId::cpu()));
        let device: Arc<dyn IDevice> = host.clone();
        let pipeline = TransferPipeline::new(&TransferConfig::default());

        let bundle = pipeline.transfer(batch(DeviceId::cpu()), &device).unwrap();
        assert_eq!(bundle.len(), 2);
        assert_eq!(bundle.tensors()[0].name, "pixel_values");
        assert!(bundle.get("image_grid_thw").is_some());
        assert_eq!(host.sync_count(), 1);
        assert_eq!(host.pending_transfers(), 0);
        assert_eq!(host.live_allocations(), 2);

        drop(bundle);
        assert_eq!(host.live_allocations(), 0);
    }

    #[test]
    fn blocking_mode_skips_sync() {
        let host = Arc::new(HostDevice::new(DeviceId::cpu()));
        let device: Arc<dyn IDevice> = host.clone();
        let pipeline = TransferPipeline::new(&TransferConfig {
            non_blocking: false,
        });
        let _bundle = pipeline.transfer(batch(DeviceId::cpu()), &device).unwrap();
        assert_eq!(host.sync_count(), 0);
    }

    #[test]
    fn oom_names_tensor_and_releases_partial_bundle() {
        // Room for the 32-byte pixel tensor but not the 24-byte grid after it.
        let host = Arc::new(HostDevice::new(DeviceId::cpu()).with_memory_limit(40));
        let device: Arc<dyn IDevice> = host.clone();
        let pipeline = TransferPipeline::new(&TransferConfig::default());

        let err = pipeline.transfer(batch(DeviceId::cpu()), &device).unwrap_err();
        match err {
            IrisError::DeviceTransferError { tensor, source } => {
                assert_eq!(tensor, "image_grid_thw");
                assert!(matches!(source, TransferError::OutOfMemory { .. }));
            }
            other => panic!("expected DeviceTransferError, got {other:?}"),
        }
        assert_eq!(host.live_allocations(), 0);
    }

    #[test]
    fn unavailable_device_fails_fast() {
        let host = Arc::new(HostDevice::new(DeviceId::cpu()));
        host.set_available(false);
        let device: Arc<dyn IDevice> = host.clone();
        let pipeline = TransferPipeline::new(&TransferConfig::default());

        let err = pipeline.transfer(batch(DeviceId::cpu()), &device).unwrap_err();
        assert!(matches!(
            err,
            IrisError::DeviceTransferError {
                source: TransferError::DeviceUnavailable { .. },
                ..
            }
        ));
        assert_eq!(host.live_allocations(), 0);
    }

    #[test]
    fn mismatched_device_is_rejected() {
        let device: Arc<dyn IDevice> = Arc::new(HostDevice::new(DeviceId::cpu()));
        let pipeline = TransferPipeline::new(&TransferConfig::default());
        assert!(pipeline.transfer(batch(DeviceId::new("cuda:0")), &device).is_err());
    }
}
