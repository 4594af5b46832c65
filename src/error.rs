//! Error types for Ceteris Paribus profile computation

use thiserror::Error;

/// Result type alias for profile operations
pub type Result<T> = std::result::Result<T, CeterisError>;

/// Main error type for the crate
#[derive(Error, Debug)]
pub enum CeterisError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Feature not found: {0}")]
    FeatureNotFound(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Prediction error: {0}")]
    PredictionError(String),

    #[error("Data error: {0}")]
    DataError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<polars::error::PolarsError> for CeterisError {
    fn from(err: polars::error::PolarsError) -> Self {
        CeterisError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for CeterisError {
    fn from(err: serde_json::Error) -> Self {
        CeterisError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for CeterisError {
    fn from(err: ndarray::ShapeError) -> Self {
        CeterisError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}
