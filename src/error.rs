use thiserror::Error;

/// Errors raised by the normalization and segmentation pipeline.
///
/// All of these are local, recoverable conditions. The orchestrator decides
/// whether to skip a step, substitute a default or hand the error upstream.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    #[error("Invalid image: {width}x{height} has no samples")]
    InvalidImage { width: u32, height: u32 },

    #[error("Unsupported channel layout: {channels} channels")]
    UnsupportedChannelLayout { channels: u8 },

    #[error("Image has no foreground samples to estimate orientation from")]
    EmptyForeground,

    #[error("Sample buffer has {actual} samples (expected {expected})")]
    SampleCountMismatch { expected: usize, actual: usize },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Classifier failed: {0}")]
    Classifier(String),

    #[error("Classifier returned {actual} probabilities (expected {expected})")]
    ClassifierOutput { expected: usize, actual: usize },
}

pub type Result<T> = std::result::Result<T, PipelineError>;
