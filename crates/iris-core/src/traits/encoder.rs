use crate::errors::IrisResult;
use crate::models::{CompileMode, DeviceTensor, Embedding, ExecutionPath};

/// The vision tower of a vision-language model.
pub trait IVisionEncoder: Send {
    /// Human-readable encoder name.
    fn name(&self) -> &str;

    /// Apply ahead-of-time optimization to the vision encoder only.
    ///
    /// May be slow; the cost lands on the first request after load.
    fn optimize(&mut self, mode: CompileMode) -> IrisResult<()>;

    /// Encode a device-resident input bundle, returning one embedding per
    /// image in the order the images appear in the bundle.
    fn encode(&mut self, inputs: &[DeviceTensor], path: ExecutionPath)
        -> IrisResult<Vec<Embedding>>;
}
