//! Decoded raster input and the sub-rectangles that reference it.

use crate::error::{PipelineError, Result};
use image::{DynamicImage, GrayAlphaImage, GrayImage, RgbImage, RgbaImage};
use serde::{Deserialize, Serialize};

/// An 8-bit raster grid, interleaved and row-major.
///
/// The pipeline only ever reads from a `RasterImage`; every transform
/// produces a new buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    width: u32,
    height: u32,
    channels: u8,
    samples: Vec<u8>,
}

impl RasterImage {
    /// Wrap raw samples produced by an external decoder.
    pub fn from_raw(width: u32, height: u32, channels: u8, samples: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * channels as usize;
        if samples.len() != expected {
            return Err(PipelineError::SampleCountMismatch {
                expected,
                actual: samples.len(),
            });
        }
        Ok(Self {
            width,
            height,
            channels,
            samples,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn samples(&self) -> &[u8] {
        &self.samples
    }

    /// Fails with `InvalidImage` when the grid has no area.
    pub fn ensure_non_empty(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(PipelineError::InvalidImage {
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }

    /// Reduce to a single luminance plane.
    ///
    /// Color input goes through the `image` crate's luma weights rather than
    /// keeping a single channel. Alpha is ignored.
    pub fn to_gray(&self) -> Result<GrayImage> {
        let (w, h) = (self.width, self.height);
        let samples = self.samples.clone();
        let mismatch = || PipelineError::SampleCountMismatch {
            expected: w as usize * h as usize * self.channels as usize,
            actual: self.samples.len(),
        };

        let dynamic = match self.channels {
            1 => return GrayImage::from_raw(w, h, samples).ok_or_else(mismatch),
            2 => GrayAlphaImage::from_raw(w, h, samples)
                .map(DynamicImage::ImageLumaA8)
                .ok_or_else(mismatch)?,
            3 => RgbImage::from_raw(w, h, samples)
                .map(DynamicImage::ImageRgb8)
                .ok_or_else(mismatch)?,
            4 => RgbaImage::from_raw(w, h, samples)
                .map(DynamicImage::ImageRgba8)
                .ok_or_else(mismatch)?,
            channels => return Err(PipelineError::UnsupportedChannelLayout { channels }),
        };

        Ok(dynamic.to_luma8())
    }
}

impl From<GrayImage> for RasterImage {
    fn from(image: GrayImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            width,
            height,
            channels: 1,
            samples: image.into_raw(),
        }
    }
}

impl From<&DynamicImage> for RasterImage {
    fn from(image: &DynamicImage) -> Self {
        let (width, height) = (image.width(), image.height());
        let (channels, samples) = match image {
            DynamicImage::ImageLuma8(buf) => (1, buf.as_raw().clone()),
            DynamicImage::ImageLumaA8(buf) => (2, buf.as_raw().clone()),
            DynamicImage::ImageRgb8(buf) => (3, buf.as_raw().clone()),
            DynamicImage::ImageRgba8(buf) => (4, buf.as_raw().clone()),
            // 16-bit, float and future variants are reduced to 8-bit first
            other if other.color().has_alpha() => (4, other.to_rgba8().into_raw()),
            other if other.color().has_color() => (3, other.to_rgb8().into_raw()),
            other => (1, other.to_luma8().into_raw()),
        };
        Self {
            width,
            height,
            channels,
            samples,
        }
    }
}

/// Axis-aligned bounding box inside a raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Build from inclusive corner coordinates.
    pub fn from_corners(min_x: u32, min_y: u32, max_x: u32, max_y: u32) -> Self {
        Self::new(min_x, min_y, max_x - min_x + 1, max_y - min_y + 1)
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Whether the box is non-degenerate and lies inside a `width`x`height` image.
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.width > 0
            && self.height > 0
            && self.x as u64 + self.width as u64 <= width as u64
            && self.y as u64 + self.height as u64 <= height as u64
    }
}
