//! Circular-region intensity statistics.
//!
//! Both samplers use the center-inclusion rule: a pixel belongs to the disk
//! when the distance from its integer coordinate to the (possibly
//! sub-pixel) center is `<= radius`. At radius 0 this admits only a pixel
//! exactly at the center, so an integer-coordinate center selects that
//! single pixel and a fractional center selects nothing and errors.

use ndarray::ArrayView2;

use crate::error::{FrapError, Result};
use crate::SpotCenter;

/// Mean intensity within a disk of `radius` pixels around `center`.
///
/// Supports sub-pixel centers. Scans only the disk's bounding box clipped
/// to the image. An empty selection (disk entirely off-image) is an error,
/// never a silent NaN.
pub fn mean_in_circle(frame: &ArrayView2<f64>, center: SpotCenter, radius: f64) -> Result<f64> {
    let (height, width) = frame.dim();

    let col_min = ((center.x - radius).floor().max(0.0)) as usize;
    let col_max = (((center.x + radius).ceil() as isize + 1).min(width as isize)).max(0) as usize;
    let row_min = ((center.y - radius).floor().max(0.0)) as usize;
    let row_max = (((center.y + radius).ceil() as isize + 1).min(height as isize)).max(0) as usize;

    let mut sum = 0.0;
    let mut count = 0usize;
    for row in row_min..row_max {
        for col in col_min..col_max {
            if center.distance_to_pixel(row, col) <= radius {
                sum += frame[[row, col]];
                count += 1;
            }
        }
    }

    if count == 0 {
        return Err(FrapError::EmptyAperture {
            x: center.x,
            y: center.y,
            radius,
        });
    }
    Ok(sum / count as f64)
}

/// Mean intensity over droplet pixels outside the burn spot.
///
/// Includes a pixel when it lies inside the droplet mask's nonzero
/// footprint (mask set and frame value nonzero) and strictly farther than
/// `radius` from `center`. An empty intersection is an error: without a
/// reference population the normalization is undefined.
pub fn mean_outside_spot(
    frame: &ArrayView2<f64>,
    droplet_mask: &ArrayView2<bool>,
    center: SpotCenter,
    radius: f64,
) -> Result<f64> {
    let mut sum = 0.0;
    let mut count = 0usize;
    for ((row, col), &inside_droplet) in droplet_mask.indexed_iter() {
        if !inside_droplet || frame[[row, col]] == 0.0 {
            continue;
        }
        if center.distance_to_pixel(row, col) > radius {
            sum += frame[[row, col]];
            count += 1;
        }
    }

    if count == 0 {
        return Err(FrapError::EmptyReference);
    }
    Ok(sum / count as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::Array2;

    #[test]
    fn test_uniform_image_mean_is_exact() {
        let frame = Array2::from_elem((30, 30), 123.5);
        for radius in [1.0, 4.5, 9.0] {
            let mean =
                mean_in_circle(&frame.view(), SpotCenter::new(15.0, 15.0), radius).unwrap();
            assert_relative_eq!(mean, 123.5);
        }
    }

    #[test]
    fn test_subpixel_center_includes_nearest_pixels() {
        let mut frame = Array2::zeros((10, 10));
        frame[[5, 5]] = 80.0;
        let mean = mean_in_circle(&frame.view(), SpotCenter::new(5.3, 4.8), 0.6).unwrap();
        assert_relative_eq!(mean, 80.0);
    }

    #[test]
    fn test_radius_zero_integer_center_is_single_pixel() {
        let mut frame = Array2::zeros((6, 6));
        frame[[2, 3]] = 42.0;
        let mean = mean_in_circle(&frame.view(), SpotCenter::new(3.0, 2.0), 0.0).unwrap();
        assert_relative_eq!(mean, 42.0);
    }

    #[test]
    fn test_radius_zero_fractional_center_is_empty() {
        let frame = Array2::ones((6, 6));
        let err = mean_in_circle(&frame.view(), SpotCenter::new(3.5, 2.0), 0.0).unwrap_err();
        assert!(matches!(err, FrapError::EmptyAperture { .. }));
    }

    #[test]
    fn test_disk_off_image_is_empty() {
        let frame = Array2::ones((10, 10));
        let err = mean_in_circle(&frame.view(), SpotCenter::new(-50.0, -50.0), 2.0).unwrap_err();
        assert!(matches!(err, FrapError::EmptyAperture { .. }));
    }

    #[test]
    fn test_mean_non_increasing_when_growing_into_zeros() {
        // A bright pixel surrounded by zeros: widening the disk only adds
        // zero-valued pixels, so the mean must not increase.
        let mut frame = Array2::zeros((20, 20));
        frame[[10, 10]] = 100.0;
        let center = SpotCenter::new(10.0, 10.0);
        let mut previous = f64::INFINITY;
        for radius in [0.0, 1.0, 2.0, 4.0, 8.0] {
            let mean = mean_in_circle(&frame.view(), center, radius).unwrap();
            assert!(mean <= previous, "mean grew at radius {radius}");
            previous = mean;
        }
    }

    #[test]
    fn test_mean_is_reproducible() {
        let frame = Array2::from_shape_fn((25, 25), |(r, c)| ((r * 7 + c * 13) % 50) as f64);
        let center = SpotCenter::new(12.2, 11.7);
        let a = mean_in_circle(&frame.view(), center, 6.3).unwrap();
        let b = mean_in_circle(&frame.view(), center, 6.3).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_outside_mean_excludes_spot_and_background() {
        let mut frame = Array2::from_elem((20, 20), 200.0);
        let mut mask = Array2::from_elem((20, 20), false);
        for row in 5..15 {
            for col in 5..15 {
                mask[[row, col]] = true;
            }
        }
        // Dim the spot; its pixels sit within radius 2 of the center.
        for row in 9..12 {
            for col in 9..12 {
                frame[[row, col]] = 50.0;
            }
        }
        let mean =
            mean_outside_spot(&frame.view(), &mask.view(), SpotCenter::new(10.0, 10.0), 2.5)
                .unwrap();
        assert_relative_eq!(mean, 200.0);
    }

    #[test]
    fn test_outside_mean_empty_intersection_is_error() {
        let frame = Array2::ones((10, 10));
        let mask = Array2::from_elem((10, 10), false);
        let err =
            mean_outside_spot(&frame.view(), &mask.view(), SpotCenter::new(5.0, 5.0), 1.0)
                .unwrap_err();
        assert!(matches!(err, FrapError::EmptyReference));
    }
}
