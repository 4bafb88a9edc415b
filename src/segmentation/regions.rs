//! Per-region properties over a labeled image.
//!
//! A [`Region`] is the pixel set of one connected component. Properties the
//! pipeline needs are plain pixel-count area, intensity-weighted area, and
//! the intensity-weighted centroid used for sub-pixel burn-spot location.

use ndarray::{Array2, ArrayView2};

use crate::SpotCenter;

/// One connected component of a labeled image.
#[derive(Debug, Clone)]
pub struct Region {
    /// Label assigned by `connected_components`, starting from 1.
    pub label: usize,
    /// Member pixels as (row, col) coordinates in raster-scan order.
    pub pixels: Vec<(usize, usize)>,
}

impl Region {
    /// Pixel-count area.
    pub fn area(&self) -> usize {
        self.pixels.len()
    }

    /// Sum of `intensity` over the region's pixels.
    pub fn weighted_area(&self, intensity: &ArrayView2<f64>) -> f64 {
        self.pixels
            .iter()
            .map(|&(row, col)| intensity[[row, col]])
            .sum()
    }

    /// Intensity-weighted centroid of the region.
    ///
    /// Falls back to the geometric centroid when the region carries zero
    /// total intensity, so the result is always a point inside the region's
    /// bounding box.
    pub fn weighted_centroid(&self, intensity: &ArrayView2<f64>) -> SpotCenter {
        let mut m00 = 0.0;
        let mut m10 = 0.0;
        let mut m01 = 0.0;
        for &(row, col) in &self.pixels {
            let weight = intensity[[row, col]];
            m00 += weight;
            m10 += col as f64 * weight;
            m01 += row as f64 * weight;
        }

        if m00.abs() < f64::EPSILON {
            let n = self.pixels.len() as f64;
            let (sum_row, sum_col) = self
                .pixels
                .iter()
                .fold((0.0, 0.0), |(r, c), &(row, col)| {
                    (r + row as f64, c + col as f64)
                });
            return SpotCenter::new(sum_col / n, sum_row / n);
        }

        SpotCenter::new(m10 / m00, m01 / m00)
    }

    /// Binary mask of the region at the given frame shape.
    pub fn to_mask(&self, shape: (usize, usize)) -> Array2<bool> {
        let mut mask = Array2::from_elem(shape, false);
        for &(row, col) in &self.pixels {
            mask[[row, col]] = true;
        }
        mask
    }
}

/// Collect all regions of a labeled image, ordered by ascending label.
pub fn regions(labels: &ArrayView2<usize>) -> Vec<Region> {
    let max_label = labels.iter().copied().max().unwrap_or(0);
    let mut pixel_sets: Vec<Vec<(usize, usize)>> = vec![Vec::new(); max_label];
    for ((row, col), &label) in labels.indexed_iter() {
        if label > 0 {
            pixel_sets[label - 1].push((row, col));
        }
    }
    pixel_sets
        .into_iter()
        .enumerate()
        .filter(|(_, pixels)| !pixels.is_empty())
        .map(|(i, pixels)| Region {
            label: i + 1,
            pixels,
        })
        .collect()
}

/// First region (in label order) maximizing `measure`; ties keep the
/// earlier label so selection is deterministic.
pub fn select_largest<F>(regions: &[Region], measure: F) -> Option<&Region>
where
    F: Fn(&Region) -> f64,
{
    let mut best: Option<(&Region, f64)> = None;
    for region in regions {
        let value = measure(region);
        match best {
            Some((_, best_value)) if value <= best_value => {}
            _ => best = Some((region, value)),
        }
    }
    best.map(|(region, _)| region)
}
