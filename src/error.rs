//! Error types for the cpi_trade crate

use polars::prelude::PolarsError;
use thiserror::Error;

/// Custom error types for the cpi_trade crate
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Error reading or parsing an input file
    #[error("Load error: {0}")]
    Load(String),

    /// Error joining stock and CPI series
    #[error("Merge error: {0}")]
    Merge(String),

    /// Error fitting one of the forecasting models
    #[error("Model fit error: {0}")]
    ModelFit(String),

    /// Error from invalid user-supplied parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Error from IO operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error from Polars operations
    #[error("Polars error: {0}")]
    Polars(String),

    /// Error serializing results
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, PipelineError>;

impl From<PolarsError> for PipelineError {
    fn from(err: PolarsError) -> Self {
        PipelineError::Polars(err.to_string())
    }
}
