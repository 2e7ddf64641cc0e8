//! Fixed-size tiles handed to the classifier.

use crate::error::{PipelineError, Result};
use image::GrayImage;
use ndarray::{Array2, Array4};
use serde::{Deserialize, Serialize};

/// Output tile dimensions in samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileSize {
    pub width: u32,
    pub height: u32,
}

impl TileSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(PipelineError::InvalidConfig(format!(
                "target size must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        Ok(())
    }
}

impl Default for TileSize {
    fn default() -> Self {
        Self::new(28, 28)
    }
}

/// Single-channel tile with samples in `[0.0, 1.0]`, strokes high.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TileParts")]
pub struct NormalizedTile {
    width: u32,
    height: u32,
    data: Vec<f32>,
}

/// Unchecked wire form of a tile
#[derive(Deserialize)]
struct TileParts {
    width: u32,
    height: u32,
    data: Vec<f32>,
}

impl TryFrom<TileParts> for NormalizedTile {
    type Error = PipelineError;

    fn try_from(parts: TileParts) -> Result<Self> {
        let expected = parts.width as usize * parts.height as usize;
        if parts.data.len() != expected {
            return Err(PipelineError::SampleCountMismatch {
                expected,
                actual: parts.data.len(),
            });
        }
        if let Some(v) = parts.data.iter().find(|v| !(0.0..=1.0).contains(*v)) {
            return Err(PipelineError::InvalidConfig(format!(
                "tile sample {} is outside [0, 1]",
                v
            )));
        }
        Ok(Self {
            width: parts.width,
            height: parts.height,
            data: parts.data,
        })
    }
}

impl NormalizedTile {
    /// Map an 8-bit plane onto `[0, 1]`.
    pub fn from_gray(image: &GrayImage) -> Self {
        let (width, height) = image.dimensions();
        let data = image.pixels().map(|p| p.0[0] as f32 / 255.0).collect();
        Self {
            width,
            height,
            data,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn size(&self) -> TileSize {
        TileSize::new(self.width, self.height)
    }

    pub fn get(&self, x: u32, y: u32) -> Option<f32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }

    /// Flattened row-major samples.
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn rows(&self) -> Vec<Vec<f32>> {
        self.data
            .chunks(self.width.max(1) as usize)
            .map(|row| row.to_vec())
            .collect()
    }

    /// `(height, width)` matrix.
    pub fn to_array(&self) -> Array2<f32> {
        let width = self.width as usize;
        Array2::from_shape_fn((self.height as usize, width), |(y, x)| self.data[y * width + x])
    }

    /// NCHW tensor with batch and channel of one.
    pub fn to_tensor(&self) -> Array4<f32> {
        let width = self.width as usize;
        Array4::from_shape_fn((1, 1, self.height as usize, width), |(_, _, y, x)| {
            self.data[y * width + x]
        })
    }

    /// Fraction of samples at or above 0.5.
    pub fn ink_ratio(&self) -> f32 {
        if self.data.is_empty() {
            return 0.0;
        }
        self.data.iter().filter(|&&v| v >= 0.5).count() as f32 / self.data.len() as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn test_from_gray_maps_to_unit_range() {
        let mut img = GrayImage::from_pixel(3, 2, Luma([0]));
        img.put_pixel(2, 1, Luma([255]));
        let tile = NormalizedTile::from_gray(&img);

        assert_eq!(tile.dimensions(), (3, 2));
        assert_eq!(tile.get(2, 1), Some(1.0));
        assert_eq!(tile.get(0, 0), Some(0.0));
        assert_eq!(tile.get(3, 0), None);
    }

    #[test]
    fn test_tensor_layout_is_row_major() {
        let img =
            GrayImage::from_fn(4, 2, |x, y| Luma([if x == 3 && y == 0 { 255 } else { 0 }]));
        let tile = NormalizedTile::from_gray(&img);

        let array = tile.to_array();
        assert_eq!(array.shape(), &[2, 4]);
        assert_eq!(array[[0, 3]], 1.0);

        let tensor = tile.to_tensor();
        assert_eq!(tensor.shape(), &[1, 1, 2, 4]);
        assert_eq!(tensor[[0, 0, 0, 3]], 1.0);
        assert_eq!(tile.rows()[0][3], 1.0);
    }

    #[test]
    fn test_deserialize_checks_sample_count() {
        let tile: NormalizedTile =
            serde_json::from_str(r#"{ "width": 2, "height": 1, "data": [0.0, 1.0] }"#).unwrap();
        assert_eq!(tile.to_tensor()[[0, 0, 0, 1]], 1.0);

        let short = serde_json::from_str::<NormalizedTile>(
            r#"{ "width": 28, "height": 28, "data": [0.5] }"#,
        );
        assert!(short.is_err());

        let out_of_range =
            serde_json::from_str::<NormalizedTile>(r#"{ "width": 1, "height": 1, "data": [2.0] }"#);
        assert!(out_of_range.is_err());
    }

    #[test]
    fn test_serialized_tile_reads_back() {
        let tile = NormalizedTile::from_gray(&GrayImage::from_pixel(3, 3, Luma([255])));
        let json = serde_json::to_string(&tile).unwrap();
        assert_eq!(serde_json::from_str::<NormalizedTile>(&json).unwrap(), tile);
    }

    #[test]
    fn test_tile_size_validation() {
        assert!(TileSize::default().validate().is_ok());
        assert!(matches!(
            TileSize::new(0, 28).validate(),
            Err(PipelineError::InvalidConfig(_))
        ));
    }
}
