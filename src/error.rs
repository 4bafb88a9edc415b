use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Pipeline stage at which a segmentation produced no foreground.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentationStage {
    /// Otsu-thresholded droplet boundary detection.
    Droplet,
    /// Yen-thresholded burn-spot detection on the difference image.
    BurnSpot,
}

impl fmt::Display for SegmentationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SegmentationStage::Droplet => write!(f, "droplet"),
            SegmentationStage::BurnSpot => write!(f, "burn-spot"),
        }
    }
}

/// Errors produced by the FRAP extraction pipeline.
#[derive(Error, Debug)]
pub enum FrapError {
    /// Bleach frame index outside the valid range for the stack.
    #[error("bleach frame {index} out of range for a {frames}-frame stack (need 0 < index < frames)")]
    InvalidBleachFrame {
        /// Requested bleach frame index.
        index: usize,
        /// Number of frames in the stack.
        frames: usize,
    },

    /// The bleach frame is not covered by the analyzed time window.
    #[error("bleach frame {index} not covered by {count} analyzed timepoints")]
    BleachFrameOutsideWindow {
        /// Requested bleach frame index.
        index: usize,
        /// Number of analyzed timepoints.
        count: usize,
    },

    /// More timepoints requested than frames available.
    #[error("{count} timepoints requested but stack has only {frames} frames")]
    TimeCountExceedsStack {
        /// Requested timepoint count.
        count: usize,
        /// Number of frames in the stack.
        frames: usize,
    },

    /// Input directory contains no droplet stacks.
    #[error("no droplet stacks found in {dir}")]
    EmptyReadDir {
        /// The directory that was scanned.
        dir: PathBuf,
    },

    /// A stack was constructed with no frames at all.
    #[error("stack contains no frames")]
    EmptyStack,

    /// A frame in the stack does not match the shape of the first frame.
    #[error("frame {index} is {got:?}, expected {want:?}")]
    ShapeMismatch {
        /// Offending frame index.
        index: usize,
        /// Shape of the offending frame (height, width).
        got: (usize, usize),
        /// Expected shape (height, width).
        want: (usize, usize),
    },

    /// Thresholding found no connected foreground component.
    #[error("no foreground component found at the {stage} segmentation stage")]
    NoForeground {
        /// Stage that failed.
        stage: SegmentationStage,
    },

    /// The circular sampling aperture covers no pixel.
    #[error("circular aperture at ({x:.2}, {y:.2}) with radius {radius} selects no pixels")]
    EmptyAperture {
        /// Aperture center x-coordinate.
        x: f64,
        /// Aperture center y-coordinate.
        y: f64,
        /// Aperture radius in pixels.
        radius: f64,
    },

    /// No droplet pixels remain outside the burn spot to use as reference.
    #[error("no droplet pixels outside the burn spot to use as normalization reference")]
    EmptyReference,

    /// Stack pages are not in a supported grayscale format.
    #[error("unsupported pixel format: {0}")]
    UnsupportedPixelFormat(String),

    /// Underlying filesystem failure.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// TIFF decode failure while loading a stack.
    #[error(transparent)]
    Tiff(#[from] tiff::TiffError),

    /// Diagnostic image encode failure.
    #[error(transparent)]
    Image(#[from] image::ImageError),

    /// Per-file wrapper attaching the offending stack's filename.
    #[error("{name}: {source}")]
    File {
        /// Filename of the droplet stack being processed.
        name: String,
        /// The underlying failure.
        #[source]
        source: Box<FrapError>,
    },
}

impl FrapError {
    /// Wrap an error with the filename of the droplet stack it came from.
    pub fn for_file(self, name: impl Into<String>) -> FrapError {
        FrapError::File {
            name: name.into(),
            source: Box::new(self),
        }
    }
}

/// Standard result type for the FRAP extraction pipeline.
pub type Result<T> = std::result::Result<T, FrapError>;
