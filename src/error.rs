//! Error types for the envmon pipeline

use thiserror::Error;

/// Result type alias for envmon operations
pub type Result<T> = std::result::Result<T, EnvmonError>;

/// Main error type for the envmon pipeline
#[derive(Error, Debug)]
pub enum EnvmonError {
    #[error("Data error: {0}")]
    DataError(String),

    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("Timestamp error: {0}")]
    TimestampError(String),

    #[error("Model not fitted")]
    NotFitted,

    #[error("Artifact error: {0}")]
    ArtifactError(String),

    #[error("Plot error: {0}")]
    PlotError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<polars::error::PolarsError> for EnvmonError {
    fn from(err: polars::error::PolarsError) -> Self {
        EnvmonError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for EnvmonError {
    fn from(err: serde_json::Error) -> Self {
        EnvmonError::SerializationError(err.to_string())
    }
}
