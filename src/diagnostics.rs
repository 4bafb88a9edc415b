//! Diagnostic rendering for burn spot localization.

use std::path::Path;

use image::{Rgb, RgbImage};
use ndarray::{Array2, ArrayView2};

use crate::burn_spot::{DiagnosticContext, DiagnosticRenderer};
use crate::error::Result;
use crate::SpotCenter;

const PANEL_GAP: u32 = 4;
const MARKER: Rgb<u8> = Rgb([255, 40, 40]);
const APERTURE: Rgb<u8> = Rgb([60, 120, 255]);
const DROPLET_TINT: Rgb<u8> = Rgb([40, 180, 90]);

/// Renders a four-panel localization summary as a single PNG.
///
/// Left to right: the bleach frame, the droplet-masked difference image,
/// the selected spot component, and the bleach frame with the droplet
/// outline. The last two panels carry a cross at the weighted centroid,
/// the measurement circle, and a wider context circle at 1.5x the radius.
#[derive(Debug, Clone, Copy, Default)]
pub struct PanelRenderer;

impl DiagnosticRenderer for PanelRenderer {
    fn render(&self, context: &DiagnosticContext<'_>, path: &Path) -> Result<()> {
        let (height, width) = context.raw.dim();
        let (h, w) = (height as u32, width as u32);
        let mut canvas = RgbImage::from_pixel(4 * w + 3 * PANEL_GAP, h, Rgb([20, 20, 20]));

        blit_grayscale(&mut canvas, 0, &context.raw);
        blit_grayscale(&mut canvas, w + PANEL_GAP, &context.spot.masked_diff.view());

        let spot_only = Array2::from_shape_fn((height, width), |idx| {
            if context.spot.spot_mask[idx] {
                context.spot.masked_diff[idx]
            } else {
                0.0
            }
        });
        let spot_x = 2 * (w + PANEL_GAP);
        blit_grayscale(&mut canvas, spot_x, &spot_only.view());

        let droplet_x = 3 * (w + PANEL_GAP);
        blit_grayscale(&mut canvas, droplet_x, &context.raw);
        for ((row, col), &inside) in context.spot.droplet_mask.indexed_iter() {
            if inside && on_boundary(&context.spot.droplet_mask, row, col) {
                canvas.put_pixel(droplet_x + col as u32, row as u32, DROPLET_TINT);
            }
        }

        for x in [spot_x, droplet_x] {
            draw_circle(&mut canvas, x, context.spot.center, context.radius, APERTURE);
            draw_circle(&mut canvas, x, context.spot.center, context.radius * 1.5, MARKER);
            draw_cross(&mut canvas, x, context.spot.center, MARKER);
        }

        canvas.save(path)?;
        Ok(())
    }
}

/// Copy a frame into the canvas at column offset `x0`, auto-scaling its
/// value range to 0..=255.
fn blit_grayscale(canvas: &mut RgbImage, x0: u32, frame: &ArrayView2<f64>) {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for &value in frame.iter() {
        min = min.min(value);
        max = max.max(value);
    }
    let span = if max > min { max - min } else { 1.0 };

    for ((row, col), &value) in frame.indexed_iter() {
        let level = (((value - min) / span) * 255.0).round().clamp(0.0, 255.0) as u8;
        canvas.put_pixel(x0 + col as u32, row as u32, Rgb([level, level, level]));
    }
}

fn on_boundary(mask: &Array2<bool>, row: usize, col: usize) -> bool {
    let (height, width) = mask.dim();
    row == 0
        || col == 0
        || row + 1 == height
        || col + 1 == width
        || !mask[[row - 1, col]]
        || !mask[[row + 1, col]]
        || !mask[[row, col - 1]]
        || !mask[[row, col + 1]]
}

fn draw_cross(canvas: &mut RgbImage, x0: u32, center: SpotCenter, color: Rgb<u8>) {
    let cx = center.x.round() as i64;
    let cy = center.y.round() as i64;
    for offset in -4i64..=4 {
        put_panel_pixel(canvas, x0, cx + offset, cy, color);
        put_panel_pixel(canvas, x0, cx, cy + offset, color);
    }
}

fn draw_circle(canvas: &mut RgbImage, x0: u32, center: SpotCenter, radius: f64, color: Rgb<u8>) {
    let row_span = (center.y - radius - 1.0).floor() as i64..=(center.y + radius + 1.0).ceil() as i64;
    for row in row_span {
        for col in (center.x - radius - 1.0).floor() as i64..=(center.x + radius + 1.0).ceil() as i64
        {
            if row < 0 || col < 0 {
                continue;
            }
            let distance = center.distance_to_pixel(row as usize, col as usize);
            if (distance - radius).abs() <= 0.5 {
                put_panel_pixel(canvas, x0, col, row, color);
            }
        }
    }
}

/// Clipped put_pixel within one panel: the panel starts at canvas column
/// `x0` and is as wide as the source frame.
fn put_panel_pixel(canvas: &mut RgbImage, x0: u32, col: i64, row: i64, color: Rgb<u8>) {
    if col < 0 || row < 0 {
        return;
    }
    let panel_width = (canvas.width() - 3 * PANEL_GAP) / 4;
    let (col, row) = (col as u32, row as u32);
    if col < panel_width && row < canvas.height() {
        canvas.put_pixel(x0 + col, row, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::burn_spot::{locate_burn_spot, NoopRenderer};
    use crate::segmentation::HistogramBackend;
    use crate::synthetic::bleach_recovery_stack;

    #[test]
    fn test_panel_renderer_writes_png() {
        let stack = bleach_recovery_stack(
            40,
            40,
            (20.0, 20.0),
            15.0,
            200.0,
            10.0,
            (20.0, 20.0),
            4.0,
            1,
            &[50.0, 120.0],
        )
        .unwrap();
        let spot = locate_burn_spot(&HistogramBackend, &NoopRenderer, &stack, 1, 4.0, None)
            .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spot.png");
        let context = DiagnosticContext {
            raw: stack.frame(1),
            spot: &spot,
            radius: 4.0,
        };
        PanelRenderer.render(&context, &path).unwrap();

        let written = image::open(&path).unwrap().to_rgb8();
        assert_eq!(written.width(), 4 * 40 + 3 * PANEL_GAP);
        assert_eq!(written.height(), 40);
    }
}
