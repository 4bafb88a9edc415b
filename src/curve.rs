//! Recovery curve extraction and normalization.

use ndarray::Array1;

use crate::error::{FrapError, Result};
use crate::measure::{mean_in_circle, mean_outside_spot};
use crate::segmentation::{segment_largest_region, SegmentationBackend};
use crate::stack::ImageStack;
use crate::SpotCenter;

/// Normalized recovery values, one per analyzed timepoint.
pub type RecoveryCurve = Array1<f64>;

/// Extracts a normalized recovery curve for the spot at `center`.
///
/// For each of the first `time_count` frames the mean inside the
/// measurement disk and the mean over the rest of the droplet are sampled,
/// then normalized as in Taylor et al. (2019):
///
/// ```text
/// normalized[t] = (inside[t] - inside[bleach]) / (outside[t] - inside[bleach])
/// ```
///
/// so the bleach frame reads 0 and full recovery to the droplet level reads
/// 1. The droplet boundary is segmented once, from the frame immediately
/// before the bleach, and reused for every timepoint; a drifting boundary
/// would fold segmentation noise into the curve.
///
/// Degenerate droplets can make a denominator zero; the affected values are
/// kept as-is (NaN or infinite) and logged rather than silently dropped,
/// which would desynchronize the curve from the caller's time axis.
pub fn extract_curve<B: SegmentationBackend>(
    backend: &B,
    stack: &ImageStack,
    center: SpotCenter,
    bleach_frame: usize,
    radius: f64,
    time_count: usize,
) -> Result<RecoveryCurve> {
    stack.validate_bleach_frame(bleach_frame)?;
    if time_count > stack.len() {
        return Err(FrapError::TimeCountExceedsStack {
            count: time_count,
            frames: stack.len(),
        });
    }
    if bleach_frame >= time_count {
        return Err(FrapError::BleachFrameOutsideWindow {
            index: bleach_frame,
            count: time_count,
        });
    }

    let droplet_mask = segment_largest_region(backend, &stack.frame(bleach_frame - 1))?;

    let mut inside = Array1::zeros(time_count);
    let mut outside = Array1::zeros(time_count);
    for t in 0..time_count {
        let frame = stack.frame(t);
        inside[t] = mean_in_circle(&frame, center, radius)?;
        outside[t] = mean_outside_spot(&frame, &droplet_mask.view(), center, radius)?;
    }

    let bleach_value = inside[bleach_frame];
    let normalized = (inside - bleach_value) / (outside - bleach_value);

    for (t, &value) in normalized.iter().enumerate() {
        if !value.is_finite() {
            log::warn!("non-finite recovery value {value} at timepoint {t}");
        }
    }

    Ok(normalized)
}
