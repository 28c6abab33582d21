//! Latency-driven tier and optimization suggestions.
//!
//! Pure functions of a [`TimingSample`]; no state is kept between calls.

use iris_core::constants::SLOW_IMAGE_THRESHOLD;
use iris_core::models::{
    Advisory, AdvisoryCode, CompileState, Severity, TimingSample, UnsupportedReason,
};

/// Evaluate one request's timing against the slow threshold.
///
/// A request served entirely from cache is already optimal and yields nothing.
pub fn advise(sample: &TimingSample, compile_state: CompileState) -> Vec<Advisory> {
    let mut advisories = Vec::new();

    if sample.cache_hit {
        return advisories;
    }

    let per_image = sample.per_image();
    if per_image <= SLOW_IMAGE_THRESHOLD {
        return advisories;
    }
    let secs = per_image.as_secs_f64();

    if let Some(lower) = sample.tier.lower() {
        advisories.push(Advisory {
            code: AdvisoryCode::LowerTier {
                current: sample.tier,
                suggested: lower,
            },
            severity: Severity::Warning,
            message: format!(
                "image embedding took {secs:.2}s per image at `{}` quality; consider `{lower}` for faster processing",
                sample.tier
            ),
        });
    }

    if compile_state.is_unoptimized() {
        advisories.push(Advisory {
            code: AdvisoryCode::EnableOptimization,
            severity: Severity::Info,
            message: format!(
                "image embedding took {secs:.2}s per image without an optimized vision encoder; \
                 a runtime with ahead-of-time compilation support would reduce this"
            ),
        });
    }

    advisories
}

/// Note surfaced when the encoder runs permanently on the plain path.
pub fn compilation_note(reason: UnsupportedReason) -> Advisory {
    Advisory {
        code: AdvisoryCode::OptimizationUnavailable { reason },
        severity: Severity::Info,
        message: format!("vision encoder optimization unavailable ({reason}); using the standard path"),
    }
}

/// Note surfaced on the first optimized call, whose latency includes compilation.
pub fn warmup_note() -> Advisory {
    Advisory {
        code: AdvisoryCode::WarmupLatency,
        severity: Severity::Info,
        message: "first call after load included vision encoder compilation; later calls will be faster"
            .to_string(),
    }
}
