//! Droplet and burn-spot segmentation.
//!
//! The droplet boundary comes from Otsu thresholding a frame with a 1.25x
//! bias and keeping the largest 4-connected component; the burn spot comes
//! from Yen thresholding the droplet-masked bleach difference image with a
//! 1.2x bias. Threshold selection and labeling sit behind the
//! [`SegmentationBackend`] trait so tests can substitute a deterministic
//! stand-in.

pub mod regions;
pub mod thresholding;

use ndarray::{Array2, ArrayView2};

pub use regions::{regions, select_largest, Region};
pub use thresholding::{apply_threshold, connected_components, otsu_threshold, yen_threshold};

use crate::error::{FrapError, Result, SegmentationStage};

/// Bias applied to the Otsu threshold when binarizing droplet frames.
/// Stricter than the raw threshold to exclude halo/glow pixels around the
/// droplet rim.
pub const DROPLET_THRESHOLD_BIAS: f64 = 1.25;

/// Bias applied to the Yen threshold when binarizing the masked difference
/// image, playing the same stricter-selection role as the droplet bias.
pub const SPOT_THRESHOLD_BIAS: f64 = 1.2;

/// Threshold selection and component labeling as an injectable capability.
pub trait SegmentationBackend {
    /// Otsu threshold on a raw frame.
    fn otsu_threshold(&self, image: &ArrayView2<f64>) -> f64;
    /// Yen threshold on a difference image.
    fn yen_threshold(&self, image: &ArrayView2<f64>) -> f64;
    /// 4-connected component labeling of a binary mask.
    fn label(&self, mask: &ArrayView2<bool>) -> Array2<usize>;
}

/// Default backend: the histogram algorithms from [`thresholding`].
#[derive(Debug, Clone, Copy, Default)]
pub struct HistogramBackend;

impl SegmentationBackend for HistogramBackend {
    fn otsu_threshold(&self, image: &ArrayView2<f64>) -> f64 {
        otsu_threshold(image)
    }

    fn yen_threshold(&self, image: &ArrayView2<f64>) -> f64 {
        yen_threshold(image)
    }

    fn label(&self, mask: &ArrayView2<bool>) -> Array2<usize> {
        connected_components(mask)
    }
}

/// Segment the single largest thresholded connected component of a frame.
///
/// Foreground is `pixel > 1.25 * otsu`, components are 4-connected, and the
/// largest by pixel-count area wins (ties keep the first label). An image
/// with no foreground component is a fatal condition: there is no droplet
/// to measure.
pub fn segment_largest_region<B: SegmentationBackend>(
    backend: &B,
    frame: &ArrayView2<f64>,
) -> Result<Array2<bool>> {
    let threshold = backend.otsu_threshold(frame);
    let foreground = apply_threshold(frame, DROPLET_THRESHOLD_BIAS * threshold);
    let labels = backend.label(&foreground.view());
    let regs = regions(&labels.view());
    let largest = select_largest(&regs, |r| r.area() as f64).ok_or(FrapError::NoForeground {
        stage: SegmentationStage::Droplet,
    })?;
    Ok(largest.to_mask(frame.dim()))
}
