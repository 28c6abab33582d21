//! Image decoding, tier-bounded resizing, normalization, and patchification.

use image::imageops::FilterType;
use image::{GenericImageView, RgbImage};
use iris_core::constants::{
    IMAGE_MEAN, IMAGE_STD, PATCH_SIZE, SPATIAL_MERGE_SIZE, TEMPORAL_PATCH_SIZE,
};
use iris_core::errors::{IrisError, IrisResult};
use iris_core::models::{ImageGrid, PixelBounds, PreparedImage};
use iris_core::traits::IImagePreprocessor;

use crate::tier::smart_resize;

/// Values per flattened patch: RGB × temporal × patch × patch.
pub const PATCH_DIM: usize =
    (3 * TEMPORAL_PATCH_SIZE * PATCH_SIZE * PATCH_SIZE) as usize;

/// Decodes images with the `image` crate and emits merge-ordered patches.
#[derive(Debug, Clone, Copy)]
pub struct ImagePreprocessor {
    filter: FilterType,
}

impl ImagePreprocessor {
    pub fn new() -> Self {
        Self {
            filter: FilterType::CatmullRom,
        }
    }

    pub fn with_filter(filter: FilterType) -> Self {
        Self { filter }
    }
}

impl Default for ImagePreprocessor {
    fn default() -> Self {
        Self::new()
    }
}

impl IImagePreprocessor for ImagePreprocessor {
    fn preprocess(&self, bytes: &[u8], bounds: PixelBounds) -> IrisResult<PreparedImage> {
        let decoded = image::load_from_memory(bytes).map_err(|e| IrisError::decode(e.to_string()))?;
        let (width, height) = decoded.dimensions();
        let (target_h, target_w) = smart_resize(height, width, bounds)?;
        let rgb = decoded.resize_exact(target_w, target_h, self.filter).to_rgb8();
        Ok(patchify(&rgb))
    }
}

/// Normalize and flatten into `[patches, PATCH_DIM]`.
///
/// Patches are ordered so that each 2×2 merge window is contiguous, which is
/// the layout the vision encoder's patch merger expects.
fn patchify(rgb: &RgbImage) -> PreparedImage {
    let width = rgb.width() as usize;
    let patch = PATCH_SIZE as usize;
    let merge = SPATIAL_MERGE_SIZE as usize;
    let grid = ImageGrid {
        t: 1,
        h: rgb.height() / PATCH_SIZE,
        w: rgb.width() / PATCH_SIZE,
    };
    let raw = rgb.as_raw();

    let mut patches = Vec::with_capacity(grid.patch_count() * PATCH_DIM);
    for block_row in 0..grid.h as usize / merge {
        for block_col in 0..grid.w as usize / merge {
            for sub_row in 0..merge {
                for sub_col in 0..merge {
                    let y0 = (block_row * merge + sub_row) * patch;
                    let x0 = (block_col * merge + sub_col) * patch;
                    for channel in 0..3 {
                        for _t in 0..TEMPORAL_PATCH_SIZE {
                            for dy in 0..patch {
                                let row = (y0 + dy) * width;
                                for dx in 0..patch {
                                    let value = raw[(row + x0 + dx) * 3 + channel];
                                    patches.push(
                                        (f32::from(value) / 255.0 - IMAGE_MEAN[channel])
                                            / IMAGE_STD[channel],
                                    );
                                }
                            }
                        }
                    }
                }
            }
        }
    }

    PreparedImage {
        grid,
        patches,
        patch_dim: PATCH_DIM,
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use image::{DynamicImage, ImageFormat, Rgb};
    use iris_core::models::QualityTier;

    use super::*;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 128]));
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn grid_follows_tier_bounds() {
        let pre = ImagePreprocessor::with_filter(FilterType::Triangle);
        let bytes = png(600, 450);

        let balanced = pre.preprocess(&bytes, QualityTier::Balanced.bounds()).unwrap();
        assert_eq!(balanced.grid, ImageGrid { t: 1, h: 32, w: 42 });
        assert_eq!(balanced.patches.len(), 32 * 42 * PATCH_DIM);

        let fast = pre.preprocess(&bytes, QualityTier::Fast.bounds()).unwrap();
        assert_eq!(fast.grid, ImageGrid { t: 1, h: 26, w: 36 });
        assert!(fast.grid.token_count() < balanced.grid.token_count());
    }

    #[test]
    fn values_are_normalized() {
        let pre = ImagePreprocessor::new();
        let out = pre.preprocess(&png(64, 64), QualityTier::Fast.bounds()).unwrap();
        let max = out.patches.iter().cloned().fold(f32::MIN, f32::max);
        let min = out.patches.iter().cloned().fold(f32::MAX, f32::min);
        assert!(max <= (1.0 - IMAGE_MEAN[2]) / IMAGE_STD[2] + 1e-3);
        assert!(min >= -IMAGE_MEAN[0] / IMAGE_STD[0] - 1e-3);
    }

    #[test]
    fn garbage_bytes_are_decode_errors() {
        let pre = ImagePreprocessor::new();
        let err = pre
            .preprocess(b"\x89PNG\r\n\x1a\ntruncated", QualityTier::Fast.bounds())
            .unwrap_err();
        assert!(matches!(err, IrisError::DecodeError { .. }));
    }
}
