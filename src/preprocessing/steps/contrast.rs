use crate::error::{PipelineError, Result};
use image::{GrayImage, Luma};

/// Stretch contrast around the image mean by `level`
/// `level == 1.0` leaves the image unchanged, larger values spread the histogram
pub fn apply(gray: GrayImage, level: f32) -> Result<GrayImage> {
    if !level.is_finite() || level <= 0.0 {
        return Err(PipelineError::InvalidConfig(format!(
            "contrast level must be a positive finite number, got {}",
            level
        )));
    }

    let mean = mean_intensity(&gray);
    Ok(GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        let pixel = gray.get_pixel(x, y).0[0] as f32;
        let stretched = mean + (pixel - mean) * level;
        Luma([stretched.round().clamp(0.0, 255.0) as u8])
    }))
}

fn mean_intensity(img: &GrayImage) -> f32 {
    let count = img.width() as u64 * img.height() as u64;
    if count == 0 {
        return 0.0;
    }
    let sum: u64 = img.pixels().map(|p| p.0[0] as u64).sum();
    (sum as f64 / count as f64) as f32
}
