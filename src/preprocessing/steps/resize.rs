use crate::error::Result;
use crate::tile::TileSize;
use image::{imageops, imageops::FilterType, GrayImage};

/// Resample to exactly `size`, ignoring aspect ratio
/// Output dimensions never depend on the input dimensions
pub fn apply(gray: GrayImage, size: TileSize) -> Result<GrayImage> {
    size.validate()?;
    if gray.dimensions() == (size.width, size.height) {
        return Ok(gray);
    }
    Ok(imageops::resize(&gray, size.width, size.height, FilterType::Triangle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;

    #[test]
    fn test_resize_downscales_to_target() {
        let img = GrayImage::new(200, 120);
        let result = apply(img, TileSize::new(28, 28)).unwrap();
        assert_eq!(result.dimensions(), (28, 28));
    }

    #[test]
    fn test_resize_upscales_tiny_crop() {
        let img = GrayImage::new(3, 7);
        let result = apply(img, TileSize::new(28, 28)).unwrap();
        assert_eq!(result.dimensions(), (28, 28));
    }

    #[test]
    fn test_resize_rejects_zero_target() {
        assert!(matches!(
            apply(GrayImage::new(5, 5), TileSize::new(28, 0)),
            Err(PipelineError::InvalidConfig(_))
        ));
    }
}
