use crate::error::Result;
use image::{GrayImage, Luma};
use imageproc::contrast::otsu_level;
use serde::{Deserialize, Serialize};

/// Which side of the Otsu split holds the strokes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrokePolarity {
    /// Dark ink on a light background (inverted Otsu)
    #[default]
    Dark,
    /// Light strokes on a dark background
    Light,
    /// Take the minority side of the split as the stroke class
    Auto,
}

impl StrokePolarity {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "dark" => Some(Self::Dark),
            "light" => Some(Self::Light),
            "auto" => Some(Self::Auto),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dark => "dark",
            Self::Light => "light",
            Self::Auto => "auto",
        }
    }

    /// Whether the strokes of `gray` are darker than its background
    pub fn strokes_are_dark(&self, gray: &GrayImage) -> bool {
        match self {
            Self::Dark => true,
            Self::Light => false,
            Self::Auto => minority_is_dark(gray),
        }
    }
}

/// Orient the image so strokes are bright on a dark background
pub fn apply(gray: GrayImage, polarity: StrokePolarity) -> Result<GrayImage> {
    if !polarity.strokes_are_dark(&gray) {
        return Ok(gray);
    }
    Ok(GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        Luma([255 - gray.get_pixel(x, y).0[0]])
    }))
}

/// Whether the dark side of the Otsu split is the smaller one.
///
/// Breaks down once strokes cover more than half the image. Uniform images
/// report `false`.
pub fn minority_is_dark(gray: &GrayImage) -> bool {
    if is_uniform(gray) {
        return false;
    }
    let level = otsu_level(gray);
    let total = gray.width() as u64 * gray.height() as u64;
    let dark = gray.pixels().filter(|p| p.0[0] <= level).count() as u64;
    dark * 2 <= total
}

/// Dynamic range (`max - min`) of the samples.
pub fn dynamic_range(gray: &GrayImage) -> u8 {
    let (min, max) = gray
        .pixels()
        .fold((u8::MAX, u8::MIN), |(min, max), p| (min.min(p.0[0]), max.max(p.0[0])));
    max.saturating_sub(min)
}

pub fn is_uniform(gray: &GrayImage) -> bool {
    dynamic_range(gray) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ink_on_paper() -> GrayImage {
        let mut img = GrayImage::from_pixel(20, 20, Luma([230]));
        for y in 5..15 {
            img.put_pixel(10, y, Luma([20]));
        }
        img
    }

    /// Dark slab covering most of the image
    fn bold_ink() -> GrayImage {
        GrayImage::from_fn(20, 20, |x, y| {
            if (2..18).contains(&x) && (2..18).contains(&y) {
                Luma([20])
            } else {
                Luma([230])
            }
        })
    }

    #[test]
    fn test_dark_strokes_are_inverted() {
        let oriented = apply(ink_on_paper(), StrokePolarity::Dark).unwrap();
        assert_eq!(oriented.get_pixel(10, 10).0[0], 235);
        assert_eq!(oriented.get_pixel(0, 0).0[0], 25);
    }

    #[test]
    fn test_dark_polarity_holds_for_ink_heavy_images() {
        let img = bold_ink();
        assert!(!minority_is_dark(&img));

        let oriented = apply(img, StrokePolarity::Dark).unwrap();
        assert_eq!(oriented.get_pixel(10, 10).0[0], 235);
        assert_eq!(oriented.get_pixel(0, 0).0[0], 25);
    }

    #[test]
    fn test_light_strokes_pass_through() {
        let mut img = GrayImage::new(20, 20);
        img.put_pixel(3, 3, Luma([255]));
        assert_eq!(apply(img.clone(), StrokePolarity::Light).unwrap(), img);
        assert_eq!(apply(img.clone(), StrokePolarity::Auto).unwrap(), img);
    }

    #[test]
    fn test_auto_picks_minority_class() {
        assert!(StrokePolarity::Auto.strokes_are_dark(&ink_on_paper()));
        let oriented = apply(ink_on_paper(), StrokePolarity::Auto).unwrap();
        assert_eq!(oriented.get_pixel(10, 10).0[0], 235);
    }

    #[test]
    fn test_uniform_image_is_left_alone_by_auto() {
        let img = GrayImage::from_pixel(8, 8, Luma([200]));
        assert!(is_uniform(&img));
        assert_eq!(dynamic_range(&img), 0);
        assert_eq!(apply(img.clone(), StrokePolarity::Auto).unwrap(), img);
    }

    #[test]
    fn test_polarity_names_round_trip() {
        for polarity in [StrokePolarity::Dark, StrokePolarity::Light, StrokePolarity::Auto] {
            assert_eq!(StrokePolarity::from_str(polarity.as_str()), Some(polarity));
        }
        assert_eq!(StrokePolarity::from_str("sideways"), None);
    }
}
