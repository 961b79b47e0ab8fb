//! Crate-wide error type

use thiserror::Error;

/// Errors raised by data generation, model construction and training
#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Invalid covariance structure tag: {0:?} (expected identity, gaussian, toeplitz or random)")]
    InvalidStructureTag(String),

    #[error("Could not build a positive-definite joint covariance after {attempts} attempts")]
    CovarianceConstructionFailed { attempts: usize },

    #[error("Non-finite loss ({value}) during {stage}")]
    NumericalDivergence { stage: &'static str, value: f64 },

    #[error("Shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: String, actual: String },

    #[error("{0} must be fitted before transform")]
    NotFitted(&'static str),

    #[error("Linear algebra error: {0}")]
    Linalg(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for cca-zoo operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Whether the caller can reasonably retry the failed call, e.g. with a
    /// smaller learning rate or fresh random draws.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::NumericalDivergence { .. } | Error::CovarianceConstructionFailed { .. })
    }
}
