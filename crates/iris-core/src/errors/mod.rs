mod iris_error;
mod transfer_error;

pub use iris_error::IrisError;
pub use transfer_error::TransferError;

/// Result alias used across every Iris crate.
pub type IrisResult<T> = Result<T, IrisError>;
