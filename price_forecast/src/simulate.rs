//! Synthetic seasonal ARMA paths and price files
//!
//! Used to exercise the pipeline on data with known structure: simulate
//! log returns from a chosen process, accumulate them into a price path and
//! write it in the format [`crate::data::DataLoader`] reads.

use crate::data::RawRecord;
use crate::error::{ForecastError, Result};
use crate::series::Period;
use forecast_math::polynomial::{
    ar_operator, ma_operator, multiply, recursion_coefficients, unconstrain_stationary,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Coefficients of a seasonal ARMA process
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SarmaProcess {
    /// Non-seasonal AR coefficients
    #[serde(default)]
    pub ar: Vec<f64>,
    /// Non-seasonal MA coefficients
    #[serde(default)]
    pub ma: Vec<f64>,
    /// Seasonal AR coefficients
    #[serde(default)]
    pub seasonal_ar: Vec<f64>,
    /// Seasonal MA coefficients
    #[serde(default)]
    pub seasonal_ma: Vec<f64>,
    /// Seasonal period
    #[serde(default)]
    pub period: usize,
    /// Process mean
    #[serde(default)]
    pub mean: f64,
    /// Innovation standard deviation
    pub sigma: f64,
}

impl SarmaProcess {
    /// Gaussian white noise with standard deviation `sigma`
    pub fn white_noise(sigma: f64) -> Self {
        Self {
            ar: Vec::new(),
            ma: Vec::new(),
            seasonal_ar: Vec::new(),
            seasonal_ma: Vec::new(),
            period: 0,
            mean: 0.0,
            sigma,
        }
    }

    fn validate(&self) -> Result<()> {
        if !(self.sigma > 0.0 && self.sigma.is_finite()) {
            return Err(ForecastError::InvalidSpec(format!(
                "Innovation standard deviation must be positive, got {}",
                self.sigma
            )));
        }
        if (!self.seasonal_ar.is_empty() || !self.seasonal_ma.is_empty()) && self.period < 2 {
            return Err(ForecastError::InvalidSpec(format!(
                "Seasonal coefficients need a period of at least 2, got {}",
                self.period
            )));
        }
        for (name, coefs) in [("AR", &self.ar), ("seasonal AR", &self.seasonal_ar)] {
            unconstrain_stationary(coefs).map_err(|_| {
                ForecastError::InvalidSpec(format!("{} coefficients {:?} are not stationary", name, coefs))
            })?;
        }
        Ok(())
    }
}

/// Simulate `n` observations of `process`.
///
/// The recursion starts from zero shocks and discards a burn-in long
/// enough for the start-up transient to decay. The same seed always gives
/// the same path.
pub fn simulate_sarma(process: &SarmaProcess, n: usize, seed: u64) -> Result<Vec<f64>> {
    if n == 0 {
        return Err(ForecastError::InvalidSpec(
            "Cannot simulate an empty path".to_string(),
        ));
    }
    process.validate()?;

    let ar = recursion_coefficients(&multiply(
        &ar_operator(&process.ar, 1),
        &ar_operator(&process.seasonal_ar, process.period),
    ));
    let ma = multiply(
        &ma_operator(&process.ma, 1),
        &ma_operator(&process.seasonal_ma, process.period),
    );
    let burn_in = 100 + 10 * (ar.len() + ma.len());
    let total = burn_in + n;

    let normal = Normal::new(0.0, process.sigma)
        .map_err(|e| ForecastError::InvalidSpec(format!("Invalid innovation distribution: {}", e)))?;
    let mut rng = StdRng::seed_from_u64(seed);
    let shocks: Vec<f64> = (0..total).map(|_| normal.sample(&mut rng)).collect();

    // Deviations from the mean
    let mut x = vec![0.0; total];
    for t in 0..total {
        let mut value = shocks[t];
        for (j, m) in ma.iter().enumerate().skip(1).take(t) {
            value += m * shocks[t - j];
        }
        for (i, a) in ar.iter().enumerate().take(t) {
            value += a * x[t - 1 - i];
        }
        x[t] = value;
    }

    debug!(n, burn_in, seed, "simulated path");
    Ok(x[burn_in..].iter().map(|v| v + process.mean).collect())
}

/// Price path `p₀·exp(r₁ + … + r_t)` from log returns, starting with `p₀`
pub fn price_path(log_returns: &[f64], initial_price: f64) -> Vec<f64> {
    let mut prices = Vec::with_capacity(log_returns.len() + 1);
    let mut level = initial_price.ln();
    prices.push(initial_price);
    for r in log_returns {
        level += r;
        prices.push(level.exp());
    }
    prices
}

/// Write prices as `date,price` rows dated on the first day of consecutive
/// periods starting at `start`.
pub fn write_price_csv<P: AsRef<Path>>(path: P, start: Period, prices: &[f64]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path.as_ref())?;
    for (i, price) in prices.iter().enumerate() {
        let period = start.offset(i as i64);
        let date = period.first_day().ok_or_else(|| {
            ForecastError::InvalidSpec(format!("Period {} has no calendar date", period))
        })?;
        writer.serialize(RawRecord::new(date, *price))?;
    }
    writer.flush()?;
    debug!(path = %path.as_ref().display(), rows = prices.len(), "wrote price file");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_gives_same_path() {
        let process = SarmaProcess {
            ar: vec![0.5],
            ..SarmaProcess::white_noise(1.0)
        };
        let a = simulate_sarma(&process, 50, 7).unwrap();
        let b = simulate_sarma(&process, 50, 7).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 50);
    }

    #[test]
    fn explosive_ar_is_rejected() {
        let process = SarmaProcess {
            ar: vec![1.2],
            ..SarmaProcess::white_noise(1.0)
        };
        assert!(matches!(
            simulate_sarma(&process, 10, 1),
            Err(ForecastError::InvalidSpec(_))
        ));
    }

    #[test]
    fn price_path_accumulates_returns() {
        let prices = price_path(&[0.0, 2f64.ln()], 10.0);
        assert_eq!(prices.len(), 3);
        assert!((prices[2] - 20.0).abs() < 1e-9);
    }
}
