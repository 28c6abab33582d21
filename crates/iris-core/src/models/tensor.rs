use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Opaque identifier of where tensors should live, e.g. `cpu` or `cuda:0`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceId(String);

impl DeviceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn cpu() -> Self {
        Self::new("cpu")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Element storage of a tensor.
#[derive(Debug, Clone, PartialEq)]
pub enum TensorData {
    F32(Vec<f32>),
    I64(Vec<i64>),
}

impl TensorData {
    pub fn len(&self) -> usize {
        match self {
            Self::F32(v) => v.len(),
            Self::I64(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn byte_len(&self) -> usize {
        match self {
            Self::F32(v) => v.len() * std::mem::size_of::<f32>(),
            Self::I64(v) => v.len() * std::mem::size_of::<i64>(),
        }
    }

    pub fn as_f32(&self) -> Option<&[f32]> {
        match self {
            Self::F32(v) => Some(v),
            Self::I64(_) => None,
        }
    }

    pub fn as_i64(&self) -> Option<&[i64]> {
        match self {
            Self::I64(v) => Some(v),
            Self::F32(_) => None,
        }
    }
}

/// A named host-resident tensor, one entry of the encoder input bundle.
#[derive(Debug, Clone, PartialEq)]
pub struct HostTensor {
    pub name: String,
    pub shape: Vec<usize>,
    pub data: TensorData,
}

impl HostTensor {
    pub fn f32(name: impl Into<String>, shape: Vec<usize>, data: Vec<f32>) -> Self {
        Self {
            name: name.into(),
            shape,
            data: TensorData::F32(data),
        }
    }

    pub fn i64(name: impl Into<String>, shape: Vec<usize>, data: Vec<i64>) -> Self {
        Self {
            name: name.into(),
            shape,
            data: TensorData::I64(data),
        }
    }

    pub fn byte_len(&self) -> usize {
        self.data.byte_len()
    }
}

/// Handle to a tensor placed on a device.
///
/// `allocation` is the device's own identifier for the backing memory and is
/// what [`crate::traits::IDevice::release`] frees. `data` is the host-visible
/// view; accelerator backends may keep it empty.
#[derive(Debug, Clone)]
pub struct DeviceTensor {
    pub name: String,
    pub shape: Vec<usize>,
    pub device: DeviceId,
    pub allocation: u64,
    pub data: Arc<TensorData>,
}

/// Host tensors prepared for one encode call, in bundle order.
#[derive(Debug, Clone)]
pub struct TransferBatch {
    pub device: DeviceId,
    pub tensors: Vec<HostTensor>,
}

impl TransferBatch {
    pub fn new(device: DeviceId) -> Self {
        Self {
            device,
            tensors: Vec::new(),
        }
    }

    pub fn push(&mut self, tensor: HostTensor) {
        self.tensors.push(tensor);
    }

    pub fn len(&self) -> usize {
        self.tensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tensors.is_empty()
    }

    pub fn total_bytes(&self) -> usize {
        self.tensors.iter().map(HostTensor::byte_len).sum()
    }
}
