//! Error types for driftsense

use thiserror::Error;

/// Result type alias for driftsense operations
pub type Result<T> = std::result::Result<T, DriftError>;

/// Main error type for drift detection
#[derive(Error, Debug)]
pub enum DriftError {
    /// Shape, dtype or capability mismatch, raised before any computation
    #[error("Validation error: {0}")]
    Validation(String),

    /// A fold or chunk cannot be formed from the available samples
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// The base classifier failed while fitting or scoring a fold
    #[error("Classifier training failed on fold {fold}: {reason}")]
    ClassifierTraining { fold: usize, reason: String },

    /// Labels were supplied while no drift is suspected
    #[error("Premature update: detector is {state}, labels are only accepted while drift is suspected")]
    PrematureUpdate { state: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid parameter: {name} = {value}, {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },

    #[error("Model not fitted")]
    NotFitted,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    Shape { expected: String, actual: String },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Data error: {0}")]
    Data(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DriftError {
    /// Whether the error means "not enough data to decide" rather than a hard failure
    pub fn is_insufficient_data(&self) -> bool {
        matches!(self, DriftError::InsufficientData(_))
    }
}

impl From<serde_json::Error> for DriftError {
    fn from(err: serde_json::Error) -> Self {
        DriftError::Serialization(err.to_string())
    }
}

impl From<ndarray::ShapeError> for DriftError {
    fn from(err: ndarray::ShapeError) -> Self {
        DriftError::Shape {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}

impl From<polars::error::PolarsError> for DriftError {
    fn from(err: polars::error::PolarsError) -> Self {
        DriftError::Data(err.to_string())
    }
}
