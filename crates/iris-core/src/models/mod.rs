mod advisory;
mod compilation_state;
mod embedding_record;
mod image_grid;
mod image_key;
mod quality_tier;
mod tensor;
mod timing_sample;

pub use advisory::{Advisory, AdvisoryCode, Severity};
pub use compilation_state::{
    CapabilityFlags, CompilationStatus, CompileMode, CompileState, ExecutionPath,
    RuntimeCapabilities, RuntimeVersion, UnsupportedReason,
};
pub use embedding_record::{Embedding, EmbeddingRecord};
pub use image_grid::{ImageGrid, PreparedImage};
pub use image_key::{ContentDigest, ImageKey};
pub use quality_tier::{PixelBounds, QualityTier};
pub use tensor::{DeviceId, DeviceTensor, HostTensor, TensorData, TransferBatch};
pub use timing_sample::{TimingSample, TimingSummary};
