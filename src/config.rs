use crate::error::{PipelineError, Result};
use crate::preprocessing::{Enhancement, StrokePolarity};
use crate::segmentation::SegmentationConfig;
use crate::tile::TileSize;
use serde::{Deserialize, Serialize};

/// Largest accepted `margin_ratio`
pub const MAX_MARGIN_RATIO: f32 = 1.0;

/// Pipeline configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub target_size: TileSize,
    pub enhancement: Enhancement,
    /// Stroke polarity for both segmentation and normalization
    ///
    /// Takes precedence over `segmentation.polarity`.
    pub polarity: StrokePolarity,
    pub segmentation: SegmentationConfig,
    /// Straighten each segmented symbol before normalizing it
    pub deskew: bool,
    /// Empty border added around each segmented symbol, relative to its longer side
    pub margin_ratio: f32,
    /// Pad each segmented symbol to a square so resizing keeps its aspect ratio
    pub square: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            target_size: TileSize::default(),
            enhancement: Enhancement::default(),
            polarity: StrokePolarity::default(),
            segmentation: SegmentationConfig::default(),
            deskew: false,
            margin_ratio: 0.1,
            square: true,
        }
    }
}

impl PipelineConfig {
    /// Parse from JSON, filling unspecified fields with defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| PipelineError::InvalidConfig(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.target_size.validate()?;
        if !(0.0..=MAX_MARGIN_RATIO).contains(&self.margin_ratio) {
            return Err(PipelineError::InvalidConfig(format!(
                "margin ratio must be within [0, {}], got {}",
                MAX_MARGIN_RATIO, self.margin_ratio
            )));
        }
        let contour = self.segmentation.contour;
        let components = self.segmentation.components;
        if contour.min >= contour.max || components.min >= components.max {
            return Err(PipelineError::InvalidConfig(
                "admissibility bounds must satisfy min < max".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(feature = "cli")]
pub use args::PipelineArgs;

#[cfg(feature = "cli")]
mod args {
    use super::PipelineConfig;
    use crate::preprocessing::{Enhancement, StrokePolarity};
    use crate::segmentation::{SegmentationConfig, SegmentationStrategy};
    use crate::tile::TileSize;

    /// Command-line/env options a host service can flatten into its own parser
    #[derive(clap::Args, Debug, Clone)]
    pub struct PipelineArgs {
        /// Enhancement level (1.0 basic, 2.0 adaptive, other values stretch contrast)
        #[arg(long, env = "GLYPH_ENHANCEMENT_LEVEL", default_value = "1.0")]
        pub enhancement_level: f32,

        /// Output tile width
        #[arg(long, env = "GLYPH_TARGET_WIDTH", default_value = "28")]
        pub target_width: u32,

        /// Output tile height
        #[arg(long, env = "GLYPH_TARGET_HEIGHT", default_value = "28")]
        pub target_height: u32,

        /// Segmentation strategy (contour, connected_components, projection)
        #[arg(
            long,
            env = "GLYPH_SEGMENTATION",
            default_value = "contour",
            value_parser = parse_strategy
        )]
        pub segmentation: SegmentationStrategy,

        /// Stroke polarity (dark, light, auto)
        #[arg(
            long,
            env = "GLYPH_STROKE_POLARITY",
            default_value = "dark",
            value_parser = parse_polarity
        )]
        pub stroke_polarity: StrokePolarity,

        /// Deskew each segmented symbol
        #[arg(long, env = "GLYPH_DESKEW")]
        pub deskew: bool,
    }

    fn parse_strategy(s: &str) -> Result<SegmentationStrategy, String> {
        SegmentationStrategy::from_str(s)
            .ok_or_else(|| format!("unknown segmentation strategy: {}", s))
    }

    fn parse_polarity(s: &str) -> Result<StrokePolarity, String> {
        StrokePolarity::from_str(s).ok_or_else(|| format!("unknown stroke polarity: {}", s))
    }

    impl From<PipelineArgs> for PipelineConfig {
        fn from(args: PipelineArgs) -> Self {
            Self {
                target_size: TileSize::new(args.target_width, args.target_height),
                enhancement: Enhancement::from_level(args.enhancement_level),
                polarity: args.stroke_polarity,
                segmentation: SegmentationConfig::with_strategy(args.segmentation),
                deskew: args.deskew,
                ..Self::default()
            }
        }
    }
}
