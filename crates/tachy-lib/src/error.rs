use crate::windows::Window;
use thiserror::Error;

/// Rejected pipeline parameters. Raised before any window is processed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("window size must be greater than zero")]
    ZeroWindowSize,
    #[error("window step must be greater than zero")]
    ZeroWindowStep,
    #[error("median filter length must be odd and at least 1, got {0}")]
    InvalidFilterLength(usize),
    #[error("sampling rate must be positive and finite, got {0}")]
    InvalidSamplingRate(f64),
    #[error("threshold must be finite, got {0}")]
    NonFiniteThreshold(f64),
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),
    #[error(
        "window {} [{}, {}) produced no beat-interval rates",
        .window.index,
        .window.start,
        .window.end()
    )]
    EmptyWindowRate { window: Window },
    #[error("sample acquisition failed")]
    Acquisition(#[source] anyhow::Error),
    #[error("pipeline cancelled after {completed} window(s)")]
    Cancelled { completed: usize },
}

impl PipelineError {
    pub fn is_config(&self) -> bool {
        matches!(self, PipelineError::InvalidConfig(_))
    }
}
