use crate::error::Result;
use image::{GrayImage, ImageBuffer, Luma};
use imageproc::contrast::otsu_level;
use imageproc::filter::separable_filter_equal;

/// Neighborhood window for the adaptive threshold (11x11)
pub const ADAPTIVE_WINDOW: u32 = 11;
/// Single-channel float plane
type MeanPlane = ImageBuffer<Luma<f32>, Vec<f32>>;

/// Bias subtracted from the local mean before comparison
pub const ADAPTIVE_BIAS: i32 = 2;

/// Gaussian sigma matching an `ADAPTIVE_WINDOW`-sample kernel
fn window_sigma(window: u32) -> f32 {
    0.3 * ((window as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

/// Normalized 1D Gaussian with exactly `window` taps
fn gaussian_taps(window: u32) -> Vec<f32> {
    let sigma = window_sigma(window);
    let center = (window / 2) as f32;
    let taps: Vec<f32> = (0..window)
        .map(|i| {
            let d = i as f32 - center;
            (-d * d / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let sum: f32 = taps.iter().sum();
    taps.into_iter().map(|t| t / sum).collect()
}

/// Binarize with a single global Otsu threshold
/// Samples above the level become 255, the rest 0. Uniform input maps to all 0.
pub fn otsu(gray: GrayImage) -> Result<GrayImage> {
    if super::polarity::is_uniform(&gray) {
        return Ok(GrayImage::new(gray.width(), gray.height()));
    }
    let level = otsu_level(&gray);
    Ok(binarize_at(&gray, level))
}

/// Binarize against a Gaussian-weighted local mean
/// Copes with illumination that varies across the image
pub fn adaptive(gray: GrayImage) -> Result<GrayImage> {
    Ok(adaptive_threshold(&gray, ADAPTIVE_WINDOW, ADAPTIVE_BIAS))
}

/// Bright-stroke adaptive threshold
///
/// A sample is foreground when it exceeds its `window` x `window` Gaussian
/// weighted neighborhood mean by at least `bias`, so flat background (dark or
/// not) stays 0. Edges are replicated.
pub fn adaptive_threshold(gray: &GrayImage, window: u32, bias: i32) -> GrayImage {
    let local_mean = local_mean(gray, window);

    GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        let pixel = gray.get_pixel(x, y).0[0] as f32;
        let mean = local_mean.get_pixel(x, y).0[0];
        if pixel >= mean + bias as f32 {
            Luma([255u8])
        } else {
            Luma([0u8])
        }
    })
}

/// Gaussian weighted mean over a `window` x `window` neighborhood, kept in f32
fn local_mean(gray: &GrayImage, window: u32) -> MeanPlane {
    let plane = MeanPlane::from_fn(gray.width(), gray.height(), |x, y| {
        Luma([gray.get_pixel(x, y).0[0] as f32])
    });
    separable_filter_equal(&plane, &gaussian_taps(window))
}

pub fn binarize_at(gray: &GrayImage, level: u8) -> GrayImage {
    GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        if gray.get_pixel(x, y).0[0] > level {
            Luma([255u8])
        } else {
            Luma([0u8])
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_binary(img: &GrayImage) {
        for pixel in img.pixels() {
            assert!(
                pixel.0[0] == 0 || pixel.0[0] == 255,
                "Expected binary pixel, got {}",
                pixel.0[0]
            );
        }
    }

    #[test]
    fn test_otsu_binarizes_gradient() {
        let img = GrayImage::from_fn(50, 50, |x, _| Luma([(x as u8 * 5).min(255)]));
        let result = otsu(img).unwrap();
        assert_binary(&result);
        assert_eq!(result.get_pixel(0, 0).0[0], 0);
        assert_eq!(result.get_pixel(49, 0).0[0], 255);
    }

    #[test]
    fn test_otsu_separates_bimodal_image() {
        let mut img = GrayImage::from_pixel(30, 30, Luma([20]));
        for y in 10..20 {
            for x in 10..20 {
                img.put_pixel(x, y, Luma([220]));
            }
        }
        let result = otsu(img).unwrap();
        assert_eq!(result.get_pixel(15, 15).0[0], 255);
        assert_eq!(result.get_pixel(2, 2).0[0], 0);
    }

    #[test]
    fn test_otsu_uniform_is_empty() {
        let result = otsu(GrayImage::from_pixel(10, 10, Luma([180]))).unwrap();
        assert!(result.pixels().all(|p| p.0[0] == 0));
    }

    #[test]
    fn test_adaptive_handles_uneven_illumination() {
        // Background brightens left to right, a bright stroke sits on both halves
        let mut img = GrayImage::from_fn(60, 20, |x, _| Luma([(x * 2) as u8]));
        for x in 0..60 {
            let base = img.get_pixel(x, 10).0[0];
            img.put_pixel(x, 10, Luma([base.saturating_add(60)]));
        }

        let result = adaptive(img).unwrap();

        assert_binary(&result);
        assert_eq!(result.get_pixel(5, 10).0[0], 255);
        assert_eq!(result.get_pixel(55, 10).0[0], 255);
        assert_eq!(result.get_pixel(5, 2).0[0], 0);
        assert_eq!(result.get_pixel(55, 2).0[0], 0);
    }

    #[test]
    fn test_window_sigma_matches_kernel_size() {
        assert!((window_sigma(ADAPTIVE_WINDOW) - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_kernel_spans_whole_window() {
        let taps = gaussian_taps(ADAPTIVE_WINDOW);

        assert_eq!(taps.len(), ADAPTIVE_WINDOW as usize);
        assert!((taps.iter().sum::<f32>() - 1.0).abs() < 1e-5);
        assert_eq!(taps[0], taps[10]);
        assert!(taps[0] > 0.0);
        assert!(taps.windows(2).take(5).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_stroke_five_samples_away_still_shifts_mean() {
        // Radius 5 reaches a stroke a 9x9 window would miss
        let mut img = GrayImage::new(21, 21);
        for y in 0..21 {
            img.put_pixel(15, y, Luma([255]));
        }
        let mean = local_mean(&img, ADAPTIVE_WINDOW);
        assert!(mean.get_pixel(10, 10).0[0] > 1.0);
        assert_eq!(mean.get_pixel(4, 10).0[0], 0.0);
    }
}
