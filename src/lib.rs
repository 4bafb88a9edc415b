//! Fluorescence recovery after photobleaching (FRAP) analysis.
//!
//! Takes multi-frame grayscale TIFF stacks of a bleaching experiment and
//! produces normalized recovery curves: the droplet is segmented with a
//! biased Otsu threshold, the burn spot is localized from the
//! pre-bleach/bleach intensity drop with a biased Yen threshold, and
//! per-frame inside/outside means are normalized following Taylor et al.
//! (2019).
//!
//! The pipeline is assembled from injectable pieces: a
//! [`SegmentationBackend`] supplies thresholds and labeling, a
//! [`DiagnosticRenderer`] decides whether localization writes diagnostic
//! images, and an [`OverwritePolicy`] decides whether a batch may write
//! into an existing directory. [`BatchRunner`] wires them together over a
//! directory of stacks.

pub mod batch;
pub mod burn_spot;
pub mod curve;
pub mod diagnostics;
pub mod error;
pub mod measure;
pub mod segmentation;
pub mod stack;
pub mod synthetic;

pub use batch::{AlwaysProceed, BatchConfig, BatchOutcome, BatchRunner, OverwritePolicy, StdinPrompt};
pub use burn_spot::{locate_burn_spot, BurnSpot, DiagnosticContext, DiagnosticRenderer, NoopRenderer};
pub use curve::{extract_curve, RecoveryCurve};
pub use diagnostics::PanelRenderer;
pub use error::{FrapError, Result, SegmentationStage};
pub use segmentation::{segment_largest_region, HistogramBackend, SegmentationBackend};
pub use stack::ImageStack;

/// Sub-pixel position in image coordinates: `x` along columns, `y` along
/// rows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpotCenter {
    pub x: f64,
    pub y: f64,
}

impl SpotCenter {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to an integer pixel coordinate `(row, col)`.
    pub fn distance_to_pixel(&self, row: usize, col: usize) -> f64 {
        let dx = col as f64 - self.x;
        let dy = row as f64 - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

impl std::fmt::Display for SpotCenter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.2}, {:.2})", self.x, self.y)
    }
}
