/// Device-layer failure modes surfaced by the transfer pipeline.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransferError {
    #[error("device {device} is unavailable")]
    DeviceUnavailable { device: String },

    #[error("out of memory on {device}: requested {requested_bytes} bytes, {available_bytes} available")]
    OutOfMemory {
        device: String,
        requested_bytes: usize,
        available_bytes: usize,
    },

    #[error("device {device} reported: {reason}")]
    Backend { device: String, reason: String },
}
