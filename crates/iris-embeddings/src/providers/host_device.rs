//! Host-memory device.
//!
//! Tensors stay in process memory. Allocations are tracked so callers can
//! verify that every transferred tensor is released, and an optional memory
//! limit reproduces out-of-memory behavior.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use iris_core::errors::TransferError;
use iris_core::models::{DeviceId, DeviceTensor, HostTensor};
use iris_core::traits::IDevice;

/// A device backed by host memory.
pub struct HostDevice {
    id: DeviceId,
    available: AtomicBool,
    memory_limit: Option<usize>,
    next_allocation: AtomicU64,
    /// allocation id → bytes
    live: Mutex<HashMap<u64, usize>>,
    pending: AtomicUsize,
    syncs: AtomicUsize,
}

impl HostDevice {
    pub fn new(id: DeviceId) -> Self {
        Self {
            id,
            available: AtomicBool::new(true),
            memory_limit: None,
            next_allocation: AtomicU64::new(1),
            live: Mutex::new(HashMap::new()),
            pending: AtomicUsize::new(0),
            syncs: AtomicUsize::new(0),
        }
    }

    /// Cap the bytes that may be resident at once.
    pub fn with_memory_limit(mut self, bytes: usize) -> Self {
        self.memory_limit = Some(bytes);
        self
    }

    /// Simulate the device disappearing or coming back.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Tensors transferred and not yet released.
    pub fn live_allocations(&self) -> usize {
        self.live.lock().map(|live| live.len()).unwrap_or(0)
    }

    pub fn live_bytes(&self) -> usize {
        self.live
            .lock()
            .map(|live| live.values().sum())
            .unwrap_or(0)
    }

    /// Non-blocking copies enqueued since the last synchronization.
    pub fn pending_transfers(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// Number of synchronization points observed.
    pub fn sync_count(&self) -> usize {
        self.syncs.load(Ordering::SeqCst)
    }

    fn unavailable(&self) -> TransferError {
        TransferError::DeviceUnavailable {
            device: self.id.to_string(),
        }
    }
}

impl IDevice for HostDevice {
    fn id(&self) -> &DeviceId {
        &self.id
    }

    fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    fn supports_non_blocking(&self) -> bool {
        true
    }

    fn copy_to_device(
        &self,
        tensor: &HostTensor,
        non_blocking: bool,
    ) -> Result<DeviceTensor, TransferError> {
        if !self.is_available() {
            return Err(self.unavailable());
        }

        let bytes = tensor.byte_len();
        let mut live = self.live.lock().map_err(|e| TransferError::Backend {
            device: self.id.to_string(),
            reason: format!("allocation table poisoned: {e}"),
        })?;
        if let Some(limit) = self.memory_limit {
            let used: usize = live.values().sum();
            if used + bytes > limit {
                return Err(TransferError::OutOfMemory {
                    device: self.id.to_string(),
                    requested_bytes: bytes,
                    available_bytes: limit.saturating_sub(used),
                });
            }
        }

        let allocation = self.next_allocation.fetch_add(1, Ordering::SeqCst);
        live.insert(allocation, bytes);
        if non_blocking {
            self.pending.fetch_add(1, Ordering::SeqCst);
        }

        Ok(DeviceTensor {
            name: tensor.name.clone(),
            shape: tensor.shape.clone(),
            device: self.id.clone(),
            allocation,
            data: Arc::new(tensor.data.clone()),
        })
    }

    fn synchronize(&self) -> Result<(), TransferError> {
        if !self.is_available() {
            return Err(self.unavailable());
        }
        self.pending.store(0, Ordering::SeqCst);
        self.syncs.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn release(&self, tensor: &DeviceTensor) {
        if let Ok(mut live) = self.live.lock() {
            live.remove(&tensor.allocation);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copy_and_release_track_allocations() {
        let device = HostDevice::new(DeviceId::cpu());
        let tensor = HostTensor::f32("x", vec![4], vec![1.0; 4]);
        let placed = device.copy_to_device(&tensor, false).unwrap();
        assert_eq!(device.live_allocations(), 1);
        assert_eq!(device.live_bytes(), 16);
        assert_eq!(placed.data.as_f32().unwrap(), &[1.0; 4]);
        device.release(&placed);
        assert_eq!(device.live_allocations(), 0);
    }

    #[test]
    fn unavailable_device_rejects_copies() {
        let device = HostDevice::new(DeviceId::cpu());
        device.set_available(false);
        let tensor = HostTensor::f32("x", vec![1], vec![1.0]);
        assert!(matches!(
            device.copy_to_device(&tensor, true),
            Err(TransferError::DeviceUnavailable { .. })
        ));
        assert!(device.synchronize().is_err());
    }
}
