use crate::error::Result;
use image::GrayImage;
use imageproc::filter::filter3x3;

/// Apply Laplacian-based sharpening
/// Enhances stroke edges before resampling
pub fn apply(gray: GrayImage) -> Result<GrayImage> {
    // Center weight 5, neighbors -1 each = edge enhancement
    let kernel: [f32; 9] = [0.0, -1.0, 0.0, -1.0, 5.0, -1.0, 0.0, -1.0, 0.0];

    let sharpened: GrayImage = filter3x3(&gray, &kernel);
    Ok(sharpened)
}
