//! # Price Forecast Workspace
//!
//! Umbrella crate re-exporting the workspace members:
//!
//! - [`forecast_math`]: descriptive statistics, lag polynomials, the
//!   Nelder–Mead optimizer and finite-difference Hessians
//! - [`price_forecast`]: the monthly price pipeline from CSV loading to
//!   seasonal ARMA forecasts in price units
//!
//! ## Example
//!
//! ```
//! use price_forecast_workspace::price_forecast::ModelSpec;
//!
//! let spec: ModelSpec = "1,1,1;0,0,3;12".parse().unwrap();
//! assert_eq!(spec.to_string(), "SARIMA(1,1,1)(0,0,3)[12]");
//! assert_eq!(spec.n_coefficients(), 5);
//! ```

pub use forecast_math;
pub use price_forecast;

/// Candidate models compared by the default pipeline configuration.
///
/// # Examples
///
/// ```
/// use price_forecast_workspace::default_candidates;
///
/// let labels: Vec<String> = default_candidates().iter().map(|s| s.to_string()).collect();
/// assert_eq!(labels[0], "ARIMA(1,1,0)");
/// ```
pub fn default_candidates() -> Vec<price_forecast::ModelSpec> {
    price_forecast::PipelineConfig::default().candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_candidates_are_valid() {
        let candidates = default_candidates();
        assert_eq!(candidates.len(), 3);
        assert!(candidates.iter().all(|s| s.validate().is_ok()));
    }

    #[test]
    fn test_members_are_reachable() {
        let d = forecast_math::polynomial::difference_operator(1, 0, 0);
        assert_eq!(d, vec![1.0, -1.0]);
        assert!(!price_forecast::VERSION.is_empty());
    }
}
