//! Synthetic frame and stack generators for tests and examples.

use ndarray::Array2;

use crate::error::Result;
use crate::stack::ImageStack;

/// Frame containing a filled disk of `foreground` on a `background` field.
///
/// `center` is `(x, y)` in pixel coordinates; a pixel belongs to the disk
/// when its distance to the center is at most `radius`.
pub fn disk_frame(
    height: usize,
    width: usize,
    center: (f64, f64),
    radius: f64,
    foreground: f64,
    background: f64,
) -> Array2<f64> {
    Array2::from_shape_fn((height, width), |(row, col)| {
        let dx = col as f64 - center.0;
        let dy = row as f64 - center.1;
        if (dx * dx + dy * dy).sqrt() <= radius {
            foreground
        } else {
            background
        }
    })
}

/// Disk frame with a second, smaller disk stamped inside it at `spot_value`.
pub fn bleached_disk_frame(
    height: usize,
    width: usize,
    center: (f64, f64),
    radius: f64,
    foreground: f64,
    background: f64,
    spot_center: (f64, f64),
    spot_radius: f64,
    spot_value: f64,
) -> Array2<f64> {
    let mut frame = disk_frame(height, width, center, radius, foreground, background);
    for ((row, col), value) in frame.indexed_iter_mut() {
        let dx = col as f64 - spot_center.0;
        let dy = row as f64 - spot_center.1;
        if (dx * dx + dy * dy).sqrt() <= spot_radius {
            *value = spot_value;
        }
    }
    frame
}

/// Stack modelling a photobleaching experiment on a single droplet.
///
/// Frames before `bleach_frame` show the undisturbed droplet at
/// `foreground`; at `bleach_frame` and after, a spot of `spot_radius`
/// around `spot_center` takes the corresponding value from `spot_values`
/// (indexed from the bleach frame onward) while the rest of the droplet
/// stays at `foreground`. Errors only when the stack would be empty.
#[allow(clippy::too_many_arguments)]
pub fn bleach_recovery_stack(
    height: usize,
    width: usize,
    center: (f64, f64),
    radius: f64,
    foreground: f64,
    background: f64,
    spot_center: (f64, f64),
    spot_radius: f64,
    bleach_frame: usize,
    spot_values: &[f64],
) -> Result<ImageStack> {
    let total = bleach_frame + spot_values.len();
    let mut frames = Vec::with_capacity(total);
    for _ in 0..bleach_frame {
        frames.push(disk_frame(height, width, center, radius, foreground, background));
    }
    for &spot_value in spot_values {
        frames.push(bleached_disk_frame(
            height,
            width,
            center,
            radius,
            foreground,
            background,
            spot_center,
            spot_radius,
            spot_value,
        ));
    }
    ImageStack::from_frames(frames)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_disk_frame_values() {
        let frame = disk_frame(20, 20, (10.0, 10.0), 5.0, 100.0, 2.0);
        assert_relative_eq!(frame[[10, 10]], 100.0);
        assert_relative_eq!(frame[[10, 15]], 100.0);
        assert_relative_eq!(frame[[0, 0]], 2.0);
    }

    #[test]
    fn test_bleached_disk_stamps_spot() {
        let frame =
            bleached_disk_frame(30, 30, (15.0, 15.0), 10.0, 100.0, 2.0, (15.0, 15.0), 3.0, 25.0);
        assert_relative_eq!(frame[[15, 15]], 25.0);
        assert_relative_eq!(frame[[15, 20]], 100.0);
    }

    #[test]
    fn test_recovery_stack_frame_count() {
        let stack = bleach_recovery_stack(
            20,
            20,
            (10.0, 10.0),
            8.0,
            100.0,
            2.0,
            (10.0, 10.0),
            2.0,
            2,
            &[20.0, 50.0, 80.0],
        )
        .unwrap();
        assert_eq!(stack.len(), 5);
        assert_relative_eq!(stack.frame(1)[[10, 10]], 100.0);
        assert_relative_eq!(stack.frame(2)[[10, 10]], 20.0);
        assert_relative_eq!(stack.frame(4)[[10, 10]], 80.0);
    }
}
