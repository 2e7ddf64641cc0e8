//! Image normalization and symbol segmentation for single-character recognizers
//!
//! Turns an arbitrary raster (photo, scan, canvas drawing) into fixed-size
//! tiles with strokes high and samples in `[0, 1]`, and splits multi-symbol
//! images into such tiles in reading order.
//!
//! ```no_run
//! use glyphprep::{Mode, Pipeline, PipelineConfig, RasterImage};
//!
//! # fn run(decoded: &image::DynamicImage) -> glyphprep::Result<()> {
//! let pipeline = Pipeline::new(PipelineConfig::default())?;
//! let outcomes = pipeline.process(&RasterImage::from(decoded), Mode::Multi)?;
//! for outcome in &outcomes {
//!     println!("{:?} in {}ms", outcome.region, outcome.time_ms());
//! }
//! # Ok(())
//! # }
//! ```

pub mod classifier;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod preprocessing;
pub mod raster;
pub mod segmentation;
pub mod tile;

pub use classifier::{recognize, Classifier, Recognition, SymbolPrediction};
#[cfg(feature = "cli")]
pub use config::PipelineArgs;
pub use config::PipelineConfig;
pub use error::{PipelineError, Result};
pub use pipeline::{process, Mode, Pipeline};
pub use preprocessing::{
    deskew, normalize, Deskewed, Enhancement, Normalizer, PreprocessingOutcome, StepTiming,
    StrokePolarity,
};
pub use raster::{RasterImage, Region};
pub use segmentation::{
    segment, Segment, SegmentationConfig, SegmentationResult, SegmentationStrategy,
};
pub use tile::{NormalizedTile, TileSize};
