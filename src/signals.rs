//! Frame-to-frame similarity signals.
//!
//! Two pixel-level signals drive keyframe selection: a per-channel color
//! histogram distance and a windowed structural similarity index. Both are
//! pure functions over `image` buffers, with no FFmpeg involvement, so they
//! are directly testable on synthetic frames.
//!
//! Neither signal understands objects or semantics: a histogram shift says
//! "the colors changed", a low SSIM says "the layout changed", nothing more.

use image::{GrayImage, RgbImage};

const HISTOGRAM_BINS: usize = 256;

/// Side length of the square SSIM window in pixels.
///
/// Windows at the right/bottom edge shrink to fit. The window size is a
/// compile-time constant so the statistic is identical frame-to-frame
/// within one run.
const SSIM_WINDOW: u32 = 8;

// Standard SSIM stabilizers for 8-bit dynamic range: (k * 255)^2 with
// k1 = 0.01 and k2 = 0.03.
const SSIM_C1: f64 = 6.5025;
const SSIM_C2: f64 = 58.5225;

/// Normalized per-channel color histograms of an RGB frame.
///
/// Each of the three channels gets its own 256-bin histogram, normalized in
/// a single pass so its bins sum to 1. Distances between two
/// `ColorHistogram`s are computed per channel and reduced with
/// [`divergence`](ColorHistogram::divergence).
#[derive(Clone)]
pub struct ColorHistogram {
    channels: Box<[[f64; HISTOGRAM_BINS]; 3]>,
}

impl ColorHistogram {
    /// Build the normalized histograms of `image`.
    pub fn from_image(image: &RgbImage) -> Self {
        let mut channels = Box::new([[0.0_f64; HISTOGRAM_BINS]; 3]);

        for pixel in image.pixels() {
            for (channel, &value) in pixel.0.iter().enumerate() {
                channels[channel][value as usize] += 1.0;
            }
        }

        let pixel_count = f64::from(image.width()) * f64::from(image.height());
        if pixel_count > 0.0 {
            for histogram in channels.iter_mut() {
                for bin in histogram.iter_mut() {
                    *bin /= pixel_count;
                }
            }
        }

        Self { channels }
    }

    /// Chi-square distance to another histogram, reduced by taking the
    /// **maximum** across the three channels.
    ///
    /// The max reduction keeps a strong localized shift in one channel from
    /// being diluted by two unchanged channels. The result is 0.0 for
    /// identical distributions and approaches 2.0 for fully disjoint ones.
    pub fn divergence(&self, other: &Self) -> f64 {
        self.channels
            .iter()
            .zip(other.channels.iter())
            .map(|(a, b)| chi_square(a, b))
            .fold(0.0, f64::max)
    }
}

impl std::fmt::Debug for ColorHistogram {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ColorHistogram")
            .field("bins", &HISTOGRAM_BINS)
            .finish_non_exhaustive()
    }
}

/// Chi-square distance between two normalized histograms.
fn chi_square(a: &[f64; HISTOGRAM_BINS], b: &[f64; HISTOGRAM_BINS]) -> f64 {
    a.iter()
        .zip(b.iter())
        .filter(|(x, y)| **x + **y > 0.0)
        .map(|(x, y)| (x - y) * (x - y) / (x + y))
        .sum()
}

/// Mean structural similarity between two grayscale frames.
///
/// Computed over non-overlapping [`SSIM_WINDOW`]-sized windows with the
/// standard luminance/contrast/structure formulation; the per-window scores
/// are averaged into a single value in [-1, 1], where 1 means identical.
///
/// Frames of mismatched or zero dimensions score 0.0 (maximally
/// dissimilar), which the selector reads as a scene change.
pub fn structural_similarity(a: &GrayImage, b: &GrayImage) -> f64 {
    if a.dimensions() != b.dimensions() {
        return 0.0;
    }

    let (width, height) = a.dimensions();
    if width == 0 || height == 0 {
        return 0.0;
    }

    let mut total = 0.0;
    let mut windows: u64 = 0;

    let mut y = 0;
    while y < height {
        let window_height = SSIM_WINDOW.min(height - y);
        let mut x = 0;
        while x < width {
            let window_width = SSIM_WINDOW.min(width - x);
            total += window_ssim(a, b, x, y, window_width, window_height);
            windows += 1;
            x += SSIM_WINDOW;
        }
        y += SSIM_WINDOW;
    }

    total / windows as f64
}

/// SSIM of a single window at (`x0`, `y0`) with the given extent.
fn window_ssim(a: &GrayImage, b: &GrayImage, x0: u32, y0: u32, width: u32, height: u32) -> f64 {
    let count = f64::from(width) * f64::from(height);

    let mut sum_a = 0.0;
    let mut sum_b = 0.0;
    let mut sum_aa = 0.0;
    let mut sum_bb = 0.0;
    let mut sum_ab = 0.0;

    for y in y0..y0 + height {
        for x in x0..x0 + width {
            let pa = f64::from(a.get_pixel(x, y).0[0]);
            let pb = f64::from(b.get_pixel(x, y).0[0]);
            sum_a += pa;
            sum_b += pb;
            sum_aa += pa * pa;
            sum_bb += pb * pb;
            sum_ab += pa * pb;
        }
    }

    let mean_a = sum_a / count;
    let mean_b = sum_b / count;
    let variance_a = (sum_aa / count - mean_a * mean_a).max(0.0);
    let variance_b = (sum_bb / count - mean_b * mean_b).max(0.0);
    let covariance = sum_ab / count - mean_a * mean_b;

    let numerator = (2.0 * mean_a * mean_b + SSIM_C1) * (2.0 * covariance + SSIM_C2);
    let denominator =
        (mean_a * mean_a + mean_b * mean_b + SSIM_C1) * (variance_a + variance_b + SSIM_C2);

    numerator / denominator
}

#[cfg(test)]
mod tests {
    use image::{GrayImage, Luma, Rgb, RgbImage};

    use super::{ColorHistogram, structural_similarity};

    fn solid(red: u8, green: u8, blue: u8) -> RgbImage {
        RgbImage::from_pixel(64, 64, Rgb([red, green, blue]))
    }

    #[test]
    fn identical_frames_score_zero_divergence() {
        let frame = solid(120, 64, 200);
        let a = ColorHistogram::from_image(&frame);
        let b = ColorHistogram::from_image(&frame.clone());
        assert_eq!(a.divergence(&b), 0.0);
    }

    #[test]
    fn disjoint_colors_approach_max_divergence() {
        let a = ColorHistogram::from_image(&solid(0, 0, 0));
        let b = ColorHistogram::from_image(&solid(255, 255, 255));
        let divergence = a.divergence(&b);
        assert!(
            (divergence - 2.0).abs() < 1e-9,
            "disjoint distributions should score 2.0, got {divergence}"
        );
    }

    #[test]
    fn single_channel_shift_is_not_diluted() {
        // Only the red channel moves; the max reduction must report the full
        // red-channel distance, not a three-way average.
        let a = ColorHistogram::from_image(&solid(0, 0, 0));
        let b = ColorHistogram::from_image(&solid(255, 0, 0));
        let divergence = a.divergence(&b);
        assert!(
            divergence > 1.9,
            "expected the red-channel shift to dominate, got {divergence}"
        );
    }

    #[test]
    fn partial_pixel_change_scores_between_extremes() {
        let mut mixed = solid(0, 0, 0);
        for y in 0..16 {
            for x in 0..64 {
                mixed.put_pixel(x, y, Rgb([255, 255, 255]));
            }
        }
        let a = ColorHistogram::from_image(&solid(0, 0, 0));
        let b = ColorHistogram::from_image(&mixed);
        let divergence = a.divergence(&b);
        assert!(divergence > 0.0 && divergence < 2.0, "got {divergence}");
    }

    #[test]
    fn identical_frames_have_unit_similarity() {
        let frame = GrayImage::from_pixel(64, 64, Luma([140]));
        let similarity = structural_similarity(&frame, &frame.clone());
        assert!(
            similarity > 0.999,
            "identical frames should score ~1.0, got {similarity}"
        );
    }

    #[test]
    fn rearranged_layout_scores_low() {
        // Same 50/50 black-and-white pixel distribution, different layout.
        let checkerboard = GrayImage::from_fn(64, 64, |x, y| {
            if (x + y) % 2 == 0 { Luma([0]) } else { Luma([255]) }
        });
        let split = GrayImage::from_fn(
            64,
            64,
            |x, _| if x < 32 { Luma([0]) } else { Luma([255]) },
        );
        let similarity = structural_similarity(&checkerboard, &split);
        assert!(
            similarity < 0.2,
            "rearranged layout should score low, got {similarity}"
        );
    }

    #[test]
    fn mismatched_dimensions_score_zero() {
        let a = GrayImage::from_pixel(64, 64, Luma([10]));
        let b = GrayImage::from_pixel(32, 64, Luma([10]));
        assert_eq!(structural_similarity(&a, &b), 0.0);
    }
}
