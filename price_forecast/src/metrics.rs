//! Summary statistics of forecast errors

use forecast_math::descriptive::{max, mean, median};
use serde::Serialize;

/// Summary of absolute forecast errors where some forecasts may be missing
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ErrorSummary {
    /// Mean absolute error
    pub mean: f64,
    /// Median absolute error
    pub median: f64,
    /// Largest absolute error
    pub max: f64,
    /// Number of errors summarised
    pub count: usize,
    /// Number of forecasts that could not be produced
    pub missing: usize,
}

impl ErrorSummary {
    /// Summarise the absolute values of the available errors.
    ///
    /// Statistics are NaN when no error is available.
    pub fn from_errors(errors: &[Option<f64>]) -> Self {
        let absolute: Vec<f64> = errors.iter().flatten().map(|e| e.abs()).collect();
        Self {
            mean: mean(&absolute),
            median: median(&absolute),
            max: max(&absolute),
            count: absolute.len(),
            missing: errors.len() - absolute.len(),
        }
    }

    /// Whether at least one error was summarised
    pub fn is_available(&self) -> bool {
        self.count > 0
    }
}

impl std::fmt::Display for ErrorSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "mean {:.4}  median {:.4}  max {:.4}  (n = {}",
            self.mean, self.median, self.max, self.count
        )?;
        if self.missing > 0 {
            write!(f, ", {} missing", self.missing)?;
        }
        write!(f, ")")
    }
}
