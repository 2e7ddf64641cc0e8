use crate::error::Result;
use image::GrayImage;
use imageproc::filter::median_filter;

/// Apply median filter to reduce noise
/// Median filter preserves edges better than Gaussian blur
pub fn apply(gray: GrayImage) -> Result<GrayImage> {
    // 3x3 median filter (radius 1) - effective for salt-and-pepper noise
    Ok(median_filter(&gray, 1, 1))
}
