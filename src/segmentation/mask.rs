use crate::preprocessing::steps::polarity;
use image::{GrayImage, Luma};
use imageproc::contrast::otsu_level;

/// Binary stroke mask (255 = stroke) from an Otsu split
///
/// With `dark_strokes` the split is inverted so samples at or below the level
/// are foreground. Images whose dynamic range is below `min_contrast` produce
/// an empty mask.
pub fn stroke_mask(gray: &GrayImage, min_contrast: u8, dark_strokes: bool) -> GrayImage {
    let (width, height) = gray.dimensions();
    let range = polarity::dynamic_range(gray);
    if range == 0 || range < min_contrast {
        tracing::debug!("Dynamic range {} below {}, mask is empty", range, min_contrast);
        return GrayImage::new(width, height);
    }

    let level = otsu_level(gray);

    GrayImage::from_fn(width, height, |x, y| {
        let pixel = gray.get_pixel(x, y).0[0];
        let is_stroke = if dark_strokes {
            pixel <= level
        } else {
            pixel > level
        };
        Luma([if is_stroke { 255 } else { 0 }])
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dark_blob_becomes_foreground() {
        let mut img = GrayImage::from_pixel(20, 20, Luma([240]));
        img.put_pixel(4, 4, Luma([10]));
        img.put_pixel(5, 4, Luma([10]));

        let mask = stroke_mask(&img, 10, true);

        assert_eq!(mask.get_pixel(4, 4).0[0], 255);
        assert_eq!(mask.get_pixel(0, 0).0[0], 0);
        assert_eq!(mask.pixels().filter(|p| p.0[0] == 255).count(), 2);
    }

    #[test]
    fn test_light_strokes_on_dark_canvas() {
        let mut img = GrayImage::new(20, 20);
        for x in 2..12 {
            img.put_pixel(x, 9, Luma([250]));
        }

        let mask = stroke_mask(&img, 10, false);

        assert_eq!(mask.get_pixel(5, 9).0[0], 255);
        assert_eq!(mask.get_pixel(5, 3).0[0], 0);
    }

    #[test]
    fn test_bold_dark_blob_stays_foreground() {
        // Ink covers 64% of the image
        let mut img = GrayImage::from_pixel(100, 100, Luma([235]));
        for y in 10..90 {
            for x in 10..90 {
                img.put_pixel(x, y, Luma([25]));
            }
        }

        let mask = stroke_mask(&img, 10, true);

        assert_eq!(mask.get_pixel(50, 50).0[0], 255);
        assert_eq!(mask.get_pixel(5, 5).0[0], 0);
        assert_eq!(mask.pixels().filter(|p| p.0[0] == 255).count(), 6400);
    }

    #[test]
    fn test_low_contrast_gives_empty_mask() {
        let img = GrayImage::from_fn(20, 20, |x, _| Luma([200 + (x % 3) as u8]));
        let mask = stroke_mask(&img, 10, true);
        assert!(mask.pixels().all(|p| p.0[0] == 0));
    }
}
