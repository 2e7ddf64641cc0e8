use crate::error::Result;
use crate::raster::RasterImage;
use image::GrayImage;

/// Reduce the input to a single luminance plane
/// This is the entry point for every other preprocessing step
pub fn apply(image: &RasterImage) -> Result<GrayImage> {
    image.ensure_non_empty()?;
    image.to_gray()
}
