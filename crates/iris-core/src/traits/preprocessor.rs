use crate::errors::IrisResult;
use crate::models::{PixelBounds, PreparedImage};

/// Turns raw image bytes into encoder-ready patches.
pub trait IImagePreprocessor: Send + Sync {
    /// Decode, resize to `bounds`, normalize, and patchify.
    ///
    /// # Errors
    /// `IrisError::DecodeError` when the bytes are not a decodable image or
    /// the image cannot be resized within `bounds`.
    fn preprocess(&self, bytes: &[u8], bounds: PixelBounds) -> IrisResult<PreparedImage>;
}
