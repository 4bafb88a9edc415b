//! Histogram-based threshold selection and connected-component labeling.
//!
//! Both threshold algorithms build a 256-bin histogram spanning the image's
//! own value range and return the selected bin center in image units, so
//! they behave identically on 8-bit, 16-bit and difference-image data.
//! Component labeling uses a two-pass union-find scan with 4-connectivity
//! (horizontal and vertical neighbors only), consistently across the
//! pipeline.

use ndarray::{Array2, ArrayView2};

/// Number of bins used by the threshold histograms.
pub const HISTOGRAM_BINS: usize = 256;

struct ValueHistogram {
    counts: Vec<usize>,
    min: f64,
    bin_width: f64,
}

impl ValueHistogram {
    /// Build the histogram over `[min, max]` of the image. Returns `None`
    /// for empty or constant images, where no threshold separates anything.
    fn build(image: &ArrayView2<f64>) -> Option<Self> {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for &v in image.iter() {
            min = min.min(v);
            max = max.max(v);
        }
        if !min.is_finite() || !max.is_finite() || max <= min {
            return None;
        }

        let bin_width = (max - min) / HISTOGRAM_BINS as f64;
        let mut counts = vec![0usize; HISTOGRAM_BINS];
        for &v in image.iter() {
            let bin = (((v - min) / bin_width) as usize).min(HISTOGRAM_BINS - 1);
            counts[bin] += 1;
        }
        Some(Self {
            counts,
            min,
            bin_width,
        })
    }

    fn bin_center(&self, bin: usize) -> f64 {
        self.min + (bin as f64 + 0.5) * self.bin_width
    }

    fn total(&self) -> usize {
        self.counts.iter().sum()
    }
}

/// Compute a global threshold with Otsu's method.
///
/// Scans all candidate bins and picks the one maximizing the between-class
/// variance of the background/foreground split. Constant images yield their
/// single value, which downstream strict-`>` binarization turns into an
/// empty foreground.
pub fn otsu_threshold(image: &ArrayView2<f64>) -> f64 {
    let hist = match ValueHistogram::build(image) {
        Some(h) => h,
        None => return image.first().copied().unwrap_or(0.0),
    };

    let total = hist.total() as f64;
    let weighted_sum: f64 = hist
        .counts
        .iter()
        .enumerate()
        .map(|(i, &c)| i as f64 * c as f64)
        .sum();

    let mut sum_below = 0.0;
    let mut weight_below = 0.0;
    let mut best_variance = 0.0;
    let mut best_bin = 0;

    for (i, &count) in hist.counts.iter().enumerate() {
        weight_below += count as f64;
        if weight_below == 0.0 {
            continue;
        }
        let weight_above = total - weight_below;
        if weight_above == 0.0 {
            break;
        }

        sum_below += i as f64 * count as f64;
        let mean_below = sum_below / weight_below;
        let mean_above = (weighted_sum - sum_below) / weight_above;
        let variance = weight_below * weight_above * (mean_below - mean_above).powi(2);

        if variance > best_variance {
            best_variance = variance;
            best_bin = i;
        }
    }

    hist.bin_center(best_bin)
}

/// Compute a global threshold with Yen's entropic method.
///
/// Maximizes Yen's criterion over candidate splits; used on the
/// bleach-transition difference image where the burn spot is a small bright
/// population over a zero-heavy background.
pub fn yen_threshold(image: &ArrayView2<f64>) -> f64 {
    let hist = match ValueHistogram::build(image) {
        Some(h) => h,
        None => return image.first().copied().unwrap_or(0.0),
    };

    let total = hist.total() as f64;
    let pmf: Vec<f64> = hist.counts.iter().map(|&c| c as f64 / total).collect();

    // Cumulative probability and cumulative squared-probability from below;
    // squared-probability tail from above.
    let mut p1 = vec![0.0; HISTOGRAM_BINS];
    let mut p1_sq = vec![0.0; HISTOGRAM_BINS];
    let mut acc = 0.0;
    let mut acc_sq = 0.0;
    for i in 0..HISTOGRAM_BINS {
        acc += pmf[i];
        acc_sq += pmf[i] * pmf[i];
        p1[i] = acc;
        p1_sq[i] = acc_sq;
    }
    let mut p2_sq = vec![0.0; HISTOGRAM_BINS + 1];
    for i in (0..HISTOGRAM_BINS).rev() {
        p2_sq[i] = p2_sq[i + 1] + pmf[i] * pmf[i];
    }

    let mut best_criterion = f64::NEG_INFINITY;
    let mut best_bin = 0;
    for i in 0..HISTOGRAM_BINS - 1 {
        let split = p1_sq[i] * p2_sq[i + 1];
        let spread = p1[i] * (1.0 - p1[i]);
        if split <= 0.0 || spread <= 0.0 {
            continue;
        }
        let criterion = (spread * spread / split).ln();
        if criterion > best_criterion {
            best_criterion = criterion;
            best_bin = i;
        }
    }

    hist.bin_center(best_bin)
}

/// Binarize an image with a strict `>` cut.
///
/// The pipeline always applies its bias multipliers (1.25x Otsu, 1.2x Yen)
/// before calling this, so the threshold argument is the final cut value.
pub fn apply_threshold(image: &ArrayView2<f64>, threshold: f64) -> Array2<bool> {
    image.mapv(|v| v > threshold)
}

fn find_root(parents: &mut [usize], label: usize) -> usize {
    let mut current = label;
    while parents[current] != current {
        // Path halving keeps the union-find near-constant time.
        parents[current] = parents[parents[current]];
        current = parents[current];
    }
    current
}

fn union(parents: &mut [usize], a: usize, b: usize) {
    let root_a = find_root(parents, a);
    let root_b = find_root(parents, b);
    if root_a < root_b {
        parents[root_b] = root_a;
    } else if root_b < root_a {
        parents[root_a] = root_b;
    }
}

/// Label 4-connected components of a binary mask.
///
/// Background pixels get label 0; each component gets a consecutive label
/// starting from 1, assigned in raster-scan order of the component's first
/// pixel. That ordering makes largest-region tie-breaking deterministic.
pub fn connected_components(mask: &ArrayView2<bool>) -> Array2<usize> {
    let (height, width) = mask.dim();
    let mut labels = Array2::<usize>::zeros((height, width));
    let mut parents = vec![0usize];

    // First pass: provisional labels plus equivalences from the up/left
    // neighbors.
    for row in 0..height {
        for col in 0..width {
            if !mask[[row, col]] {
                continue;
            }
            let up = if row > 0 { labels[[row - 1, col]] } else { 0 };
            let left = if col > 0 { labels[[row, col - 1]] } else { 0 };

            match (up, left) {
                (0, 0) => {
                    let label = parents.len();
                    parents.push(label);
                    labels[[row, col]] = label;
                }
                (0, l) => labels[[row, col]] = l,
                (u, 0) => labels[[row, col]] = u,
                (u, l) => {
                    labels[[row, col]] = u.min(l);
                    if u != l {
                        union(&mut parents, u, l);
                    }
                }
            }
        }
    }

    // Resolve every provisional label to its root, then compact roots into
    // consecutive final labels.
    let mut final_label = vec![0usize; parents.len()];
    let mut next = 0usize;
    for label in 1..parents.len() {
        let root = find_root(&mut parents, label);
        if final_label[root] == 0 {
            next += 1;
            final_label[root] = next;
        }
        final_label[label] = final_label[root];
    }

    labels.mapv_inplace(|l| if l == 0 { 0 } else { final_label[l] });
    labels
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::Array2;

    fn mask_from(pattern: &[&[u8]]) -> Array2<bool> {
        let height = pattern.len();
        let width = pattern[0].len();
        Array2::from_shape_fn((height, width), |(r, c)| pattern[r][c] != 0)
    }

    fn assert_labels(labeled: &Array2<usize>, expected: &[&[usize]]) {
        for (r, row) in expected.iter().enumerate() {
            for (c, &want) in row.iter().enumerate() {
                assert_eq!(
                    labeled[[r, c]],
                    want,
                    "label mismatch at [{r}, {c}]: expected {want}, got {}",
                    labeled[[r, c]],
                );
            }
        }
    }

    #[test]
    fn test_otsu_separates_bimodal_image() {
        let image = Array2::from_shape_fn((20, 20), |(r, _)| if r < 10 { 10.0 } else { 200.0 });
        let threshold = otsu_threshold(&image.view());
        assert!(threshold > 10.0 && threshold < 200.0, "got {threshold}");
    }

    #[test]
    fn test_otsu_constant_image_yields_empty_foreground() {
        let image = Array2::from_elem((8, 8), 42.0);
        let threshold = otsu_threshold(&image.view());
        let mask = apply_threshold(&image.view(), 1.25 * threshold);
        assert!(mask.iter().all(|&v| !v));
    }

    #[test]
    fn test_yen_cut_isolates_bright_population() {
        // Zero-heavy difference image with a small bright spot population,
        // the shape yen sees in this pipeline.
        let mut image = Array2::zeros((30, 30));
        for r in 12..18 {
            for c in 12..18 {
                image[[r, c]] = 150.0;
            }
        }
        let threshold = yen_threshold(&image.view());
        assert!(1.2 * threshold < 150.0, "cut {} too strict", 1.2 * threshold);
        let mask = apply_threshold(&image.view(), 1.2 * threshold);
        assert_eq!(mask.iter().filter(|&&v| v).count(), 36);
    }

    #[test]
    fn test_threshold_is_strict() {
        let image = Array2::from_elem((2, 2), 5.0);
        let mask = apply_threshold(&image.view(), 5.0);
        assert!(mask.iter().all(|&v| !v));
    }

    #[test]
    fn test_thresholds_deterministic() {
        let image = Array2::from_shape_fn((16, 16), |(r, c)| ((r * 31 + c * 7) % 97) as f64);
        assert_relative_eq!(
            otsu_threshold(&image.view()),
            otsu_threshold(&image.view())
        );
        assert_relative_eq!(yen_threshold(&image.view()), yen_threshold(&image.view()));
    }

    #[test]
    fn test_label_empty_mask() {
        let mask = Array2::from_elem((4, 4), false);
        let labeled = connected_components(&mask.view());
        assert!(labeled.iter().all(|&l| l == 0));
    }

    #[test]
    fn test_label_two_components() {
        let mask = mask_from(&[
            &[0, 1, 1, 0, 0],
            &[0, 1, 1, 0, 0],
            &[0, 0, 0, 0, 1],
            &[0, 0, 0, 0, 1],
        ]);
        let labeled = connected_components(&mask.view());
        let expected: &[&[usize]] = &[
            &[0, 1, 1, 0, 0],
            &[0, 1, 1, 0, 0],
            &[0, 0, 0, 0, 2],
            &[0, 0, 0, 0, 2],
        ];
        assert_labels(&labeled, expected);
    }

    #[test]
    fn test_label_u_shape_merges() {
        // The two arms acquire different provisional labels that must be
        // unified at the bottom row.
        let mask = mask_from(&[
            &[1, 0, 1], //
            &[1, 0, 1],
            &[1, 1, 1],
        ]);
        let labeled = connected_components(&mask.view());
        let expected: &[&[usize]] = &[
            &[1, 0, 1], //
            &[1, 0, 1],
            &[1, 1, 1],
        ];
        assert_labels(&labeled, expected);
    }

    #[test]
    fn test_label_diagonal_not_connected() {
        let mask = mask_from(&[
            &[1, 0], //
            &[0, 1],
        ]);
        let labeled = connected_components(&mask.view());
        assert_eq!(labeled[[0, 0]], 1);
        assert_eq!(labeled[[1, 1]], 2);
    }

    #[test]
    fn test_label_order_is_raster_scan() {
        let mask = mask_from(&[
            &[0, 0, 1], //
            &[1, 0, 0],
        ]);
        let labeled = connected_components(&mask.view());
        assert_eq!(labeled[[0, 2]], 1);
        assert_eq!(labeled[[1, 0]], 2);
    }
}
