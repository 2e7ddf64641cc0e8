//! Photometric normalization and geometric rectification
//!
//! Turns an arbitrary raster into a fixed-size tile with strokes high, and
//! straightens tilted foreground blobs.

pub mod normalizer;
pub mod steps;

pub use normalizer::{normalize, Enhancement, Normalizer, PreprocessingOutcome, StepTiming};
pub use steps::deskew::{deskew, Deskewed};
pub use steps::polarity::StrokePolarity;
