//! Symbol segmentation
//!
//! Locates candidate symbols in a larger image and returns them in reading
//! order (ascending left edge). Finding nothing is a normal, empty result.

pub mod components;
pub mod contour;
pub mod mask;
pub mod projection;

use crate::error::Result;
use crate::preprocessing::steps::grayscale;
use crate::preprocessing::steps::polarity::StrokePolarity;
use crate::raster::{RasterImage, Region};
use image::{imageops, GrayImage};
use serde::{Deserialize, Serialize};

/// Region finding strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentationStrategy {
    /// External contours filtered by side length
    #[default]
    Contour,
    /// 8-connected components filtered by pixel area
    ConnectedComponents,
    /// Column bands of the vertical projection profile
    Projection,
}

impl SegmentationStrategy {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "contour" | "contours" => Some(Self::Contour),
            "connected_components" | "components" => Some(Self::ConnectedComponents),
            "projection" => Some(Self::Projection),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Contour => "contour",
            Self::ConnectedComponents => "connected_components",
            Self::Projection => "projection",
        }
    }
}

/// Exclusive bounds on both sides of a bounding box
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeBounds {
    pub min: u32,
    pub max: u32,
}

impl SizeBounds {
    pub fn admits(&self, width: u32, height: u32) -> bool {
        width > self.min && width < self.max && height > self.min && height < self.max
    }
}

impl Default for SizeBounds {
    fn default() -> Self {
        Self { min: 20, max: 200 }
    }
}

/// Exclusive bounds on a component's pixel count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AreaBounds {
    pub min: u64,
    pub max: u64,
}

impl AreaBounds {
    pub fn admits(&self, area: u64) -> bool {
        area > self.min && area < self.max
    }
}

impl Default for AreaBounds {
    fn default() -> Self {
        Self {
            min: 100,
            max: 5000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectionParams {
    /// Empty columns needed to separate two bands
    pub min_gap: u32,
    /// Narrower bands are discarded
    pub min_width: u32,
}

impl Default for ProjectionParams {
    fn default() -> Self {
        Self {
            min_gap: 1,
            min_width: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentationConfig {
    pub strategy: SegmentationStrategy,
    /// Images with a smaller dynamic range are treated as blank
    pub min_contrast: u8,
    /// Which side of the Otsu split is stroke
    pub polarity: StrokePolarity,
    pub contour: SizeBounds,
    pub components: AreaBounds,
    pub projection: ProjectionParams,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            strategy: SegmentationStrategy::default(),
            min_contrast: 10,
            polarity: StrokePolarity::default(),
            contour: SizeBounds::default(),
            components: AreaBounds::default(),
            projection: ProjectionParams::default(),
        }
    }
}

impl SegmentationConfig {
    pub fn with_strategy(strategy: SegmentationStrategy) -> Self {
        Self {
            strategy,
            ..Self::default()
        }
    }
}

/// One candidate symbol
#[derive(Debug, Clone)]
pub struct Segment {
    pub region: Region,
    /// Box area for contour and projection, pixel count for components
    pub area: u64,
    /// Grayscale crop of the source
    pub image: GrayImage,
    /// Stroke mask crop (255 = stroke)
    pub mask: GrayImage,
    /// Whether strokes are darker than the background in the source
    pub dark_strokes: bool,
}

impl Segment {
    /// Crop with every non-stroke sample zeroed and strokes kept bright
    pub fn masked_strokes(&self) -> GrayImage {
        GrayImage::from_fn(self.image.width(), self.image.height(), |x, y| {
            if self.mask.get_pixel(x, y).0[0] == 0 {
                return image::Luma([0]);
            }
            let v = self.image.get_pixel(x, y).0[0];
            // Keep stroke samples strictly non-zero so they stay foreground
            let stroke = if self.dark_strokes { 255 - v } else { v };
            image::Luma([stroke.max(1)])
        })
    }
}

/// Segments in reading order
#[derive(Debug, Clone, Default)]
pub struct SegmentationResult {
    pub segments: Vec<Segment>,
}

impl SegmentationResult {
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn regions(&self) -> Vec<Region> {
        self.segments.iter().map(|s| s.region).collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Segment> {
        self.segments.iter()
    }
}

impl IntoIterator for SegmentationResult {
    type Item = Segment;
    type IntoIter = std::vec::IntoIter<Segment>;

    fn into_iter(self) -> Self::IntoIter {
        self.segments.into_iter()
    }
}

/// Segment a raster into candidate symbols
pub fn segment(image: &RasterImage, config: &SegmentationConfig) -> Result<SegmentationResult> {
    let gray = grayscale::apply(image)?;
    Ok(segment_gray(&gray, config))
}

/// Segment a grayscale plane
pub fn segment_gray(gray: &GrayImage, config: &SegmentationConfig) -> SegmentationResult {
    let dark_strokes = config.polarity.strokes_are_dark(gray);
    let mask = mask::stroke_mask(gray, config.min_contrast, dark_strokes);

    let mut found: Vec<(Region, u64)> = match config.strategy {
        SegmentationStrategy::Contour => contour::find_regions(&mask, &config.contour)
            .into_iter()
            .map(|r| (r, r.area()))
            .collect(),
        SegmentationStrategy::ConnectedComponents => {
            components::find_components(&mask, &config.components)
                .into_iter()
                .map(|c| (c.region, c.pixel_count))
                .collect()
        }
        SegmentationStrategy::Projection => projection::find_regions(&mask, &config.projection)
            .into_iter()
            .map(|r| (r, r.area()))
            .collect(),
    };

    // Reading order; stable so equal keys keep emission order
    found.sort_by_key(|(r, _)| (r.x, r.y));

    let (width, height) = gray.dimensions();
    let segments: Vec<Segment> = found
        .into_iter()
        .filter(|(r, _)| r.fits_within(width, height))
        .map(|(region, area)| Segment {
            region,
            area,
            image: imageops::crop_imm(gray, region.x, region.y, region.width, region.height)
                .to_image(),
            mask: imageops::crop_imm(&mask, region.x, region.y, region.width, region.height)
                .to_image(),
            dark_strokes,
        })
        .collect();

    tracing::debug!(
        "Segmented {}x{} image with {} strategy: {} regions",
        width,
        height,
        config.strategy.as_str(),
        segments.len()
    );

    SegmentationResult { segments }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn page_with_blobs(blobs: &[(u32, u32, u32, u32)]) -> GrayImage {
        let mut img = GrayImage::from_pixel(200, 100, Luma([235]));
        for &(x0, y0, w, h) in blobs {
            for y in y0..y0 + h {
                for x in x0..x0 + w {
                    img.put_pixel(x, y, Luma([25]));
                }
            }
        }
        img
    }

    #[test]
    fn test_strategy_names_round_trip() {
        for strategy in [
            SegmentationStrategy::Contour,
            SegmentationStrategy::ConnectedComponents,
            SegmentationStrategy::Projection,
        ] {
            assert_eq!(SegmentationStrategy::from_str(strategy.as_str()), Some(strategy));
        }
        assert_eq!(SegmentationStrategy::from_str("watershed"), None);
    }

    #[test]
    fn test_every_strategy_reads_left_to_right() {
        // Placed right-to-left in the buffer on purpose
        let gray = page_with_blobs(&[(150, 30, 25, 40), (80, 10, 24, 30), (10, 50, 30, 30)]);
        for strategy in [
            SegmentationStrategy::Contour,
            SegmentationStrategy::ConnectedComponents,
            SegmentationStrategy::Projection,
        ] {
            let result = segment_gray(&gray, &SegmentationConfig::with_strategy(strategy));
            let xs: Vec<u32> = result.iter().map(|s| s.region.x).collect();
            assert_eq!(xs, vec![10, 80, 150], "{:?}", strategy);
        }
    }

    #[test]
    fn test_segments_carry_crops() {
        let gray = page_with_blobs(&[(30, 20, 30, 40)]);
        let result = segment_gray(&gray, &SegmentationConfig::default());

        assert_eq!(result.len(), 1);
        let segment = &result.segments[0];
        assert_eq!(segment.area, 1200);
        assert_eq!(segment.image.dimensions(), (30, 40));
        assert!(segment.mask.pixels().all(|p| p.0[0] == 255));

        let strokes = segment.masked_strokes();
        assert!(strokes.pixels().all(|p| p.0[0] == 230));
    }

    #[test]
    fn test_bold_symbol_is_found() {
        let mut gray = GrayImage::from_pixel(100, 100, Luma([235]));
        for y in 10..90 {
            for x in 10..90 {
                gray.put_pixel(x, y, Luma([25]));
            }
        }

        let result = segment_gray(&gray, &SegmentationConfig::default());

        assert_eq!(result.regions(), vec![Region::new(10, 10, 80, 80)]);
        assert!(result.segments[0].dark_strokes);
    }

    #[test]
    fn test_light_polarity_finds_strokes_on_dark_canvas() {
        let mut gray = GrayImage::new(120, 60);
        for y in 10..50 {
            for x in 40..70 {
                gray.put_pixel(x, y, Luma([250]));
            }
        }
        let config = SegmentationConfig {
            polarity: StrokePolarity::Light,
            ..SegmentationConfig::default()
        };

        let result = segment_gray(&gray, &config);

        assert_eq!(result.regions(), vec![Region::new(40, 10, 30, 40)]);
        assert!(result.segments[0].masked_strokes().pixels().all(|p| p.0[0] == 250));
    }

    #[test]
    fn test_components_report_pixel_area() {
        let gray = page_with_blobs(&[(30, 20, 12, 12)]);
        let config = SegmentationConfig::with_strategy(SegmentationStrategy::ConnectedComponents);
        let result = segment_gray(&gray, &config);
        assert_eq!(result.len(), 1);
        assert_eq!(result.segments[0].area, 144);
    }

    #[test]
    fn test_blank_page_is_empty_not_error() {
        let raster = RasterImage::from(GrayImage::from_pixel(50, 50, Luma([255])));
        let result = segment(&raster, &SegmentationConfig::default()).unwrap();
        assert!(result.is_empty());
    }
}
