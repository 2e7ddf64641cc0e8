//! Pipeline orchestration
//!
//! Single mode normalizes the whole image. Multi mode segments first, then
//! frames, optionally deskews and normalizes every region in reading order.

use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::preprocessing::steps::deskew;
use crate::preprocessing::{Normalizer, PreprocessingOutcome, StepTiming};
use crate::raster::RasterImage;
use crate::segmentation::{self, Segment, SegmentationConfig};
use image::{imageops, GrayImage};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// How many symbols the input is expected to hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// The whole image is one symbol (e.g. a canvas drawing)
    #[default]
    Single,
    /// Segment into symbols and process each one
    Multi,
}

impl Mode {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "single" => Some(Self::Single),
            "multi" => Some(Self::Multi),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Multi => "multi",
        }
    }
}

/// Run the pipeline once with `config`
pub fn process(
    image: &RasterImage,
    mode: Mode,
    config: &PipelineConfig,
) -> Result<Vec<PreprocessingOutcome>> {
    Pipeline::new(*config)?.process(image, mode)
}

/// Normalization pipeline with an optional segmentation front end
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
    segmentation: SegmentationConfig,
    normalizer: Normalizer,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        let normalizer = Normalizer::new(config.target_size, config.enhancement)
            .with_polarity(config.polarity);
        normalizer.validate()?;
        let segmentation = SegmentationConfig {
            polarity: config.polarity,
            ..config.segmentation
        };
        Ok(Self {
            config,
            segmentation,
            normalizer,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Process an image, returning one outcome per symbol in reading order
    pub fn process(&self, image: &RasterImage, mode: Mode) -> Result<Vec<PreprocessingOutcome>> {
        match mode {
            Mode::Single => Ok(vec![self.normalizer.process(image)?]),
            Mode::Multi => {
                let segments = segmentation::segment(image, &self.segmentation)?;
                if segments.is_empty() {
                    tracing::debug!("No symbols found, returning no outcomes");
                    return Ok(Vec::new());
                }
                self.process_segments(&segments.segments)
            }
        }
    }

    #[cfg(not(feature = "parallel"))]
    fn process_segments(&self, segments: &[Segment]) -> Result<Vec<PreprocessingOutcome>> {
        segments.iter().map(|s| self.process_segment(s)).collect()
    }

    #[cfg(feature = "parallel")]
    fn process_segments(&self, segments: &[Segment]) -> Result<Vec<PreprocessingOutcome>> {
        use rayon::prelude::*;

        // Indexed collect keeps the reading order
        segments.par_iter().map(|s| self.process_segment(s)).collect()
    }

    /// Frame, optionally deskew, then normalize a single segment
    pub fn process_segment(&self, segment: &Segment) -> Result<PreprocessingOutcome> {
        let start = Instant::now();
        let mut steps_timing = Vec::new();
        let mut warnings = Vec::new();
        let mut deskew_angle = None;

        let strokes = self.normalizer.run_step("mask", segment, &mut steps_timing, |s| {
            Ok(s.masked_strokes())
        })?;
        let mut img = self.normalizer.run_step("frame", strokes, &mut steps_timing, |i| {
            Ok(frame(&i, self.config.margin_ratio, self.config.square))
        })?;

        if self.config.deskew {
            let step_start = Instant::now();
            match deskew::apply(&img) {
                Ok(deskewed) => {
                    img = deskewed.image;
                    deskew_angle = Some(deskewed.angle);
                    steps_timing.push(StepTiming {
                        name: "deskew".to_string(),
                        time_ms: step_start.elapsed().as_millis() as u64,
                    });
                }
                Err(PipelineError::EmptyForeground) => {
                    tracing::warn!(
                        "Deskew skipped for region at x={}: no foreground",
                        segment.region.x
                    );
                    warnings
                        .push("deskew skipped: no foreground, region left unrotated".to_string());
                }
                Err(e) => return Err(e),
            }
        }

        let mut outcome = self.normalizer.process_oriented(img)?;
        steps_timing.append(&mut outcome.steps);
        warnings.append(&mut outcome.warnings);

        outcome.steps = steps_timing;
        outcome.warnings = warnings;
        outcome.region = Some(segment.region);
        outcome.deskew_angle = deskew_angle;
        outcome.duration = start.elapsed();
        Ok(outcome)
    }
}

/// Center `img` on a zero canvas with a margin, optionally squared
fn frame(img: &GrayImage, margin_ratio: f32, square: bool) -> GrayImage {
    let (width, height) = img.dimensions();
    let longer = width.max(height);
    let margin = ((longer as f32 * margin_ratio).round() as u32).max(1);

    let (inner_w, inner_h) = if square {
        (longer, longer)
    } else {
        (width, height)
    };
    let mut canvas = GrayImage::new(inner_w + 2 * margin, inner_h + 2 * margin);
    let x = margin + (inner_w - width) / 2;
    let y = margin + (inner_h - height) / 2;
    imageops::replace(&mut canvas, img, x as i64, y as i64);
    canvas
}
