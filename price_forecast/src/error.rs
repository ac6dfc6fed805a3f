//! Error types for the price_forecast crate

use forecast_math::MathError;
use thiserror::Error;

/// Custom error types for the price_forecast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// Malformed input file: missing columns, unparsable dates or prices
    #[error("Data format error: {0}")]
    DataFormat(String),

    /// The data does not cover what was requested of it
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// A value lies outside the domain of a transform (e.g. log of a non-positive price)
    #[error("Domain error: {0}")]
    Domain(String),

    /// Malformed model orders or pipeline parameters
    #[error("Invalid specification: {0}")]
    InvalidSpec(String),

    /// The likelihood optimizer failed to converge
    #[error("Optimizer did not converge: {0}")]
    NonConvergence(String),

    /// Error from numerical routines
    #[error("Math error: {0}")]
    Math(#[from] MathError),

    /// Error from IO operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error from the CSV reader
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Error from JSON (de)serialization
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;
