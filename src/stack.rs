//! Droplet image stacks and multi-page TIFF loading.
//!
//! A FRAP recording is one multi-frame grayscale stack per droplet. Frames
//! are held as `f64` arrays regardless of the on-disk sample format so the
//! thresholding and sampling stages operate in a single numeric domain.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use ndarray::{Array2, ArrayView2};
use tiff::decoder::{Decoder, DecodingResult, Limits};

use crate::error::{FrapError, Result};

/// Ordered sequence of 2D grayscale frames with identical dimensions.
///
/// Immutable after construction; time index `t` is 0-based.
#[derive(Debug, Clone)]
pub struct ImageStack {
    frames: Vec<Array2<f64>>,
}

impl ImageStack {
    /// Build a stack from pre-decoded frames, validating uniform shape.
    pub fn from_frames(frames: Vec<Array2<f64>>) -> Result<Self> {
        let first = frames.first().ok_or(FrapError::EmptyStack)?;
        let want = first.dim();
        for (index, frame) in frames.iter().enumerate() {
            if frame.dim() != want {
                return Err(FrapError::ShapeMismatch {
                    index,
                    got: frame.dim(),
                    want,
                });
            }
        }
        Ok(Self { frames })
    }

    /// Load a multi-page grayscale TIFF stack, one page per time index.
    ///
    /// Supports unsigned 8/16/32-bit and 32-bit float samples; everything is
    /// widened to `f64`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let mut decoder = Decoder::new(BufReader::new(file))?.with_limits(Limits::unlimited());

        let mut frames = Vec::new();
        loop {
            frames.push(decode_page(&mut decoder)?);
            if !decoder.more_images() {
                break;
            }
            decoder.next_image()?;
        }
        Self::from_frames(frames)
    }

    /// Number of frames in the stack.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// True when the stack holds no frames. `from_frames` rejects this case,
    /// so a constructed stack is never empty.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Frame dimensions as (height, width).
    pub fn dim(&self) -> (usize, usize) {
        self.frames[0].dim()
    }

    /// View of the frame at time index `t`.
    ///
    /// # Panics
    /// Panics if `t` is out of range; callers validate indices up front via
    /// [`ImageStack::validate_bleach_frame`].
    pub fn frame(&self, t: usize) -> ArrayView2<'_, f64> {
        self.frames[t].view()
    }

    /// All frames in time order.
    pub fn frames(&self) -> &[Array2<f64>] {
        &self.frames
    }

    /// Check that `index` designates a valid bleach frame: the pre-bleach
    /// frame at `index - 1` must exist.
    pub fn validate_bleach_frame(&self, index: usize) -> Result<()> {
        if index == 0 || index >= self.frames.len() {
            return Err(FrapError::InvalidBleachFrame {
                index,
                frames: self.frames.len(),
            });
        }
        Ok(())
    }
}

fn decode_page<R: std::io::Read + std::io::Seek>(decoder: &mut Decoder<R>) -> Result<Array2<f64>> {
    let colortype = decoder.colortype()?;
    if !matches!(colortype, tiff::ColorType::Gray(_)) {
        return Err(FrapError::UnsupportedPixelFormat(format!("{colortype:?}")));
    }

    let (width, height) = decoder.dimensions()?;
    let values: Vec<f64> = match decoder.read_image()? {
        DecodingResult::U8(buf) => buf.iter().map(|&v| v as f64).collect(),
        DecodingResult::U16(buf) => buf.iter().map(|&v| v as f64).collect(),
        DecodingResult::U32(buf) => buf.iter().map(|&v| v as f64).collect(),
        DecodingResult::F32(buf) => buf.iter().map(|&v| v as f64).collect(),
        other => {
            return Err(FrapError::UnsupportedPixelFormat(format!(
                "TIFF sample format not supported: {other:?}"
            )))
        }
    };

    Array2::from_shape_vec((height as usize, width as usize), values).map_err(|_| {
        FrapError::UnsupportedPixelFormat(format!(
            "page data does not match {width}x{height} dimensions"
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_frames_uniform_shape() {
        let frames = vec![Array2::zeros((4, 6)), Array2::ones((4, 6))];
        let stack = ImageStack::from_frames(frames).unwrap();
        assert_eq!(stack.len(), 2);
        assert!(!stack.is_empty());
        assert_eq!(stack.dim(), (4, 6));
        assert_eq!(stack.frame(1)[[0, 0]], 1.0);
    }

    #[test]
    fn test_from_frames_rejects_shape_mismatch() {
        let frames = vec![Array2::zeros((4, 6)), Array2::zeros((4, 7))];
        let err = ImageStack::from_frames(frames).unwrap_err();
        assert!(matches!(
            err,
            FrapError::ShapeMismatch {
                index: 1,
                got: (4, 7),
                want: (4, 6),
            }
        ));
    }

    #[test]
    fn test_from_frames_rejects_empty() {
        let err = ImageStack::from_frames(Vec::new()).unwrap_err();
        assert!(matches!(err, FrapError::EmptyStack));
    }

    #[test]
    fn test_bleach_frame_validation() {
        let stack = ImageStack::from_frames(vec![Array2::zeros((2, 2)); 5]).unwrap();
        assert!(stack.validate_bleach_frame(0).is_err());
        assert!(stack.validate_bleach_frame(1).is_ok());
        assert!(stack.validate_bleach_frame(4).is_ok());
        assert!(stack.validate_bleach_frame(5).is_err());
    }
}
