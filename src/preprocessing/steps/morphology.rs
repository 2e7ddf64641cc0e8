use crate::error::Result;
use image::GrayImage;
use imageproc::morphology::{grayscale_close, Mask};

/// Grayscale closing: dilate then erode with a 3x3 square
/// Fills pinholes and hairline gaps inside bright strokes
pub fn apply(gray: GrayImage) -> Result<GrayImage> {
    Ok(grayscale_close(&gray, &Mask::square(1)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn test_closing_fills_single_pixel_gap() {
        // Vertical bar with a one-pixel break
        let mut img = GrayImage::new(9, 9);
        for y in 1..8 {
            for x in 3..6 {
                if y != 4 || x != 4 {
                    img.put_pixel(x, y, Luma([255]));
                }
            }
        }

        let closed = apply(img).unwrap();

        assert_eq!(closed.get_pixel(4, 4).0[0], 255);
    }

    #[test]
    fn test_closing_keeps_background_dark() {
        let mut img = GrayImage::new(9, 9);
        img.put_pixel(4, 4, Luma([255]));

        let closed = apply(img).unwrap();

        assert_eq!(closed.get_pixel(0, 0).0[0], 0);
        assert_eq!(closed.get_pixel(8, 8).0[0], 0);
        assert_eq!(closed.get_pixel(4, 4).0[0], 255);
    }

    #[test]
    fn test_closing_only_brightens() {
        let img = GrayImage::from_fn(13, 7, |x, y| Luma([((x * 37 + y * 91) % 256) as u8]));
        let closed = apply(img.clone()).unwrap();
        assert!(closed.pixels().zip(img.pixels()).all(|(c, o)| c.0[0] >= o.0[0]));
    }
}
