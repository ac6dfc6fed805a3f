//! # Forecast Math
//!
//! Numerical building blocks used by the `price_forecast` pipeline.
//! This crate provides descriptive statistics, lag-polynomial algebra,
//! a derivative-free optimizer, finite-difference Hessians and thin
//! wrappers around the reference distributions used by the diagnostic
//! tests.

use thiserror::Error;

pub mod descriptive;
pub mod distributions;
pub mod hessian;
pub mod optimize;
pub mod polynomial;

/// Errors that can occur in numerical routines
#[derive(Error, Debug)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),
}

/// Result type for numerical operations
pub type Result<T> = std::result::Result<T, MathError>;
