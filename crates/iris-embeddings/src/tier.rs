//! Quality tier resolution and patch-aligned resize planning.

use iris_core::constants::{MAX_ASPECT_RATIO, RESIZE_FACTOR};
use iris_core::errors::{IrisError, IrisResult};
use iris_core::models::{PixelBounds, QualityTier};

/// Resolve a tier label to its inclusive pixel bounds.
///
/// # Errors
/// `IrisError::InvalidConfiguration` naming the allowed labels.
pub fn resolve(label: &str) -> IrisResult<PixelBounds> {
    label.parse::<QualityTier>().map(QualityTier::bounds)
}

/// Target `(height, width)` for an image so that both sides are multiples of
/// the resize factor and the area lies within `bounds`, keeping the aspect
/// ratio as close as possible.
pub fn smart_resize(height: u32, width: u32, bounds: PixelBounds) -> IrisResult<(u32, u32)> {
    if height == 0 || width == 0 {
        return Err(IrisError::decode(format!("image has zero size ({width}x{height})")));
    }
    let (h, w) = (f64::from(height), f64::from(width));
    if h.max(w) / h.min(w) > MAX_ASPECT_RATIO {
        return Err(IrisError::decode(format!(
            "aspect ratio of {width}x{height} exceeds {MAX_ASPECT_RATIO}"
        )));
    }

    let factor = f64::from(RESIZE_FACTOR);
    let snap = |v: f64| (v.round() as u32).max(1) * RESIZE_FACTOR;
    let mut h_bar = snap(h / factor);
    let mut w_bar = snap(w / factor);
    let area = u64::from(h_bar) * u64::from(w_bar);

    if area > bounds.max_pixels {
        let beta = (h * w / bounds.max_pixels as f64).sqrt();
        h_bar = ((h / beta / factor).floor() as u32).max(1) * RESIZE_FACTOR;
        w_bar = ((w / beta / factor).floor() as u32).max(1) * RESIZE_FACTOR;
    } else if area < bounds.min_pixels {
        let beta = (bounds.min_pixels as f64 / (h * w)).sqrt();
        h_bar = (h * beta / factor).ceil() as u32 * RESIZE_FACTOR;
        w_bar = (w * beta / factor).ceil() as u32 * RESIZE_FACTOR;
    }

    Ok((h_bar, w_bar))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_known_and_unknown() {
        assert_eq!(resolve("fast").unwrap(), QualityTier::Fast.bounds());
        assert!(matches!(
            resolve("turbo"),
            Err(IrisError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn within_bounds_only_snaps() {
        let (h, w) = smart_resize(450, 600, QualityTier::Balanced.bounds()).unwrap();
        assert_eq!((h, w), (448, 588));
        assert!(QualityTier::Balanced.bounds().contains(u64::from(h) * u64::from(w)));
    }

    #[test]
    fn above_max_scales_down() {
        let (h, w) = smart_resize(450, 600, QualityTier::Fast.bounds()).unwrap();
        assert_eq!((h, w), (364, 504));
        assert!(QualityTier::Fast.bounds().contains(u64::from(h) * u64::from(w)));
    }

    #[test]
    fn below_min_scales_up() {
        let bounds = QualityTier::Balanced.bounds();
        let (h, w) = smart_resize(32, 32, bounds).unwrap();
        assert_eq!((h, w), (448, 448));
        assert!(bounds.contains(u64::from(h) * u64::from(w)));
    }

    #[test]
    fn results_are_factor_aligned() {
        for tier in QualityTier::ALL {
            for (h, w) in [(17, 931), (1080, 1920), (3000, 2000), (299, 301)] {
                let (rh, rw) = smart_resize(h, w, tier.bounds()).unwrap();
                assert_eq!(rh % RESIZE_FACTOR, 0);
                assert_eq!(rw % RESIZE_FACTOR, 0);
            }
        }
    }

    #[test]
    fn extreme_aspect_ratio_is_rejected() {
        assert!(matches!(
            smart_resize(1, 500, QualityTier::Fast.bounds()),
            Err(IrisError::DecodeError { .. })
        ));
        assert!(smart_resize(0, 10, QualityTier::Fast.bounds()).is_err());
    }
}
