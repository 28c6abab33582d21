use super::TransferError;

/// Top-level error for the image-embedding subsystem.
#[derive(Debug, thiserror::Error)]
pub enum IrisError {
    /// Unknown tier label or malformed configuration. Aborts the whole request.
    #[error("invalid configuration: {reason}")]
    InvalidConfiguration { reason: String },

    /// Image bytes could not be interpreted. Fails only the affected slot.
    #[error("image decode failed: {reason}")]
    DecodeError { reason: String },

    /// Moving the encoder input bundle to the device failed. Aborts the batch.
    #[error("device transfer failed for tensor `{tensor}`: {source}")]
    DeviceTransferError {
        tensor: String,
        #[source]
        source: TransferError,
    },

    #[error("vision encoder failed: {reason}")]
    EncodeError { reason: String },

    #[error("request abandoned before completion")]
    Cancelled,

    #[error("no model is loaded")]
    ModelNotLoaded,

    #[error("embedding worker stopped")]
    WorkerStopped,
}

impl IrisError {
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            reason: reason.into(),
        }
    }

    pub fn decode(reason: impl Into<String>) -> Self {
        Self::DecodeError {
            reason: reason.into(),
        }
    }

    pub fn encode(reason: impl Into<String>) -> Self {
        Self::EncodeError {
            reason: reason.into(),
        }
    }

    /// Whether the error is confined to a single image slot.
    pub fn is_slot_local(&self) -> bool {
        matches!(self, Self::DecodeError { .. })
    }
}
