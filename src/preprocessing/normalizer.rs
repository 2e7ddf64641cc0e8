use crate::error::{PipelineError, Result};
use crate::raster::{RasterImage, Region};
use crate::tile::{NormalizedTile, TileSize};
use image::GrayImage;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use super::steps;
use super::steps::polarity::StrokePolarity;

/// Tolerance used when mapping a numeric enhancement level to a strategy
const LEVEL_EPSILON: f32 = 1e-6;

/// Normalization strategy
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Enhancement {
    /// Resize, then global Otsu threshold
    #[default]
    Basic,
    /// Median denoise, closing, resize, then Gaussian adaptive threshold
    Adaptive,
    /// Contrast stretch by `level`, sharpen, resize, then global Otsu threshold
    Custom { level: f32 },
}

impl Enhancement {
    /// Map a numeric enhancement level (1.0 basic, 2.0 adaptive, other custom)
    pub fn from_level(level: f32) -> Self {
        if (level - 1.0).abs() < LEVEL_EPSILON {
            Self::Basic
        } else if (level - 2.0).abs() < LEVEL_EPSILON {
            Self::Adaptive
        } else {
            Self::Custom { level }
        }
    }

    /// Parse a strategy name or a numeric level
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "basic" => Some(Self::Basic),
            "adaptive" => Some(Self::Adaptive),
            other => other.parse::<f32>().ok().map(Self::from_level),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Adaptive => "adaptive",
            Self::Custom { .. } => "custom",
        }
    }

    /// The numeric level this strategy corresponds to
    pub fn level(&self) -> f32 {
        match self {
            Self::Basic => 1.0,
            Self::Adaptive => 2.0,
            Self::Custom { level } => *level,
        }
    }
}

/// Timing information for a single preprocessing step
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepTiming {
    pub name: String,
    pub time_ms: u64,
}

/// A tile plus everything observed while producing it
#[derive(Debug, Clone, Serialize)]
pub struct PreprocessingOutcome {
    pub tile: NormalizedTile,
    /// Wall-clock time spent producing the tile
    pub duration: Duration,
    /// Strategy name (`basic`, `adaptive`, `custom`)
    pub strategy: String,
    pub steps: Vec<StepTiming>,
    /// Fallback paths taken, one entry each
    pub warnings: Vec<String>,
    /// Source region in multi-symbol mode
    pub region: Option<Region>,
    /// Deskew correction applied before normalization, if deskew ran
    pub deskew_angle: Option<f32>,
}

impl PreprocessingOutcome {
    pub fn time_ms(&self) -> u64 {
        self.duration.as_millis() as u64
    }
}

/// Normalize `image` into a `target_size` tile with the given strategy
///
/// Strokes are taken to be dark on a light background; use
/// `Normalizer::with_polarity` for other inputs.
pub fn normalize(
    image: &RasterImage,
    target_size: TileSize,
    enhancement: Enhancement,
) -> Result<PreprocessingOutcome> {
    Normalizer::new(target_size, enhancement).process(image)
}

/// Photometric normalizer that applies steps based on the strategy
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalizer {
    target_size: TileSize,
    enhancement: Enhancement,
    polarity: StrokePolarity,
}

impl Normalizer {
    pub fn new(target_size: TileSize, enhancement: Enhancement) -> Self {
        Self {
            target_size,
            enhancement,
            polarity: StrokePolarity::default(),
        }
    }

    pub fn with_polarity(mut self, polarity: StrokePolarity) -> Self {
        self.polarity = polarity;
        self
    }

    pub fn polarity(&self) -> StrokePolarity {
        self.polarity
    }

    pub fn target_size(&self) -> TileSize {
        self.target_size
    }

    pub fn enhancement(&self) -> Enhancement {
        self.enhancement
    }

    /// Check the configuration before touching any pixels
    pub fn validate(&self) -> Result<()> {
        self.target_size.validate()?;
        if let Enhancement::Custom { level } = self.enhancement {
            if !level.is_finite() || level <= 0.0 {
                return Err(PipelineError::InvalidConfig(format!(
                    "enhancement level must be a positive finite number, got {}",
                    level
                )));
            }
        }
        Ok(())
    }

    /// Process a raster according to the configured strategy
    pub fn process(&self, image: &RasterImage) -> Result<PreprocessingOutcome> {
        let start = Instant::now();
        self.validate()?;

        let mut steps_timing = Vec::new();
        let gray =
            self.run_step("grayscale", image, &mut steps_timing, steps::grayscale::apply)?;

        self.finish(gray, start, steps_timing, true)
    }

    /// Process a plane that is already single-channel, orienting it by polarity
    pub fn process_gray(&self, gray: GrayImage) -> Result<PreprocessingOutcome> {
        self.process_plane(gray, true)
    }

    /// Process a plane whose strokes are already bright on a dark background
    pub fn process_oriented(&self, gray: GrayImage) -> Result<PreprocessingOutcome> {
        self.process_plane(gray, false)
    }

    fn process_plane(&self, gray: GrayImage, orient: bool) -> Result<PreprocessingOutcome> {
        let start = Instant::now();
        self.validate()?;
        if gray.width() == 0 || gray.height() == 0 {
            return Err(PipelineError::InvalidImage {
                width: gray.width(),
                height: gray.height(),
            });
        }
        self.finish(gray, start, Vec::new(), orient)
    }

    fn finish(
        &self,
        gray: GrayImage,
        start: Instant,
        mut steps_timing: Vec<StepTiming>,
        orient: bool,
    ) -> Result<PreprocessingOutcome> {
        let mut warnings = Vec::new();
        let size = self.target_size;
        let polarity = self.polarity;
        let resize = |i: GrayImage| steps::resize::apply(i, size);

        if steps::polarity::is_uniform(&gray) {
            tracing::warn!("Uniform input has no stroke/background split, emitting a blank tile");
            warnings.push("uniform input: no foreground, tile is blank".to_string());
        }

        let mut img = if orient {
            self.run_step("polarity", gray, &mut steps_timing, |i| {
                steps::polarity::apply(i, polarity)
            })?
        } else {
            gray
        };

        img = match self.enhancement {
            Enhancement::Basic => {
                img = self.run_step("resize", img, &mut steps_timing, resize)?;
                self.run_step("threshold", img, &mut steps_timing, steps::threshold::otsu)?
            }
            Enhancement::Adaptive => {
                img = self.run_step("denoise", img, &mut steps_timing, steps::denoise::apply)?;
                img = self.run_step("close", img, &mut steps_timing, steps::morphology::apply)?;
                img = self.run_step("resize", img, &mut steps_timing, resize)?;
                self.run_step(
                    "adaptive_threshold",
                    img,
                    &mut steps_timing,
                    steps::threshold::adaptive,
                )?
            }
            Enhancement::Custom { level } => {
                img = self.run_step("contrast", img, &mut steps_timing, |i| {
                    steps::contrast::apply(i, level)
                })?;
                img = self.run_step("sharpen", img, &mut steps_timing, steps::sharpen::apply)?;
                img = self.run_step("resize", img, &mut steps_timing, resize)?;
                self.run_step("threshold", img, &mut steps_timing, steps::threshold::otsu)?
            }
        };

        let tile = NormalizedTile::from_gray(&img);
        if warnings.is_empty() && tile.ink_ratio() == 0.0 {
            tracing::warn!("Thresholding removed every stroke sample");
            warnings.push("threshold produced an empty tile".to_string());
        }

        let duration = start.elapsed();
        tracing::debug!(
            "Normalized to {}x{} with {} strategy in {}ms",
            size.width,
            size.height,
            self.enhancement.as_str(),
            duration.as_millis()
        );

        Ok(PreprocessingOutcome {
            tile,
            duration,
            strategy: self.enhancement.as_str().to_string(),
            steps: steps_timing,
            warnings,
            region: None,
            deskew_angle: None,
        })
    }

    pub(crate) fn run_step<I, F>(
        &self,
        name: &str,
        input: I,
        timings: &mut Vec<StepTiming>,
        step_fn: F,
    ) -> Result<GrayImage>
    where
        F: FnOnce(I) -> Result<GrayImage>,
    {
        let step_start = Instant::now();
        let result = step_fn(input)?;
        timings.push(StepTiming {
            name: name.to_string(),
            time_ms: step_start.elapsed().as_millis() as u64,
        });
        Ok(result)
    }
}
