//! Correlation diagnostics and the Ljung–Box white-noise test
//!
//! These replace the visual ACF/PACF inspection of an interactive session:
//! lags whose correlation leaves the `±1.96/√n` band are reported as
//! candidates for AR/MA orders.

use crate::error::{ForecastError, Result};
use forecast_math::descriptive::{autocovariances, pearson};
use forecast_math::distributions::chi_squared_sf;
use serde::Serialize;

/// Significance level at which white noise is rejected
pub const WHITE_NOISE_ALPHA: f64 = 0.05;

/// Two-sided 95% normal critical value used for correlogram bands
const BAND_Z: f64 = 1.96;

/// Sample autocorrelations for lags `1..=max_lag`.
///
/// The lag-`k` value is the Pearson correlation between the series and its
/// lag-`k` shift, i.e. between `x[..n-k]` and `x[k..]`.
pub fn autocorrelation(values: &[f64], max_lag: usize) -> Result<Vec<f64>> {
    check_max_lag(values.len(), max_lag)?;
    let n = values.len();
    (1..=max_lag)
        .map(|k| pearson(&values[..n - k], &values[k..]).map_err(ForecastError::from))
        .collect()
}

/// Sample partial autocorrelations for lags `1..=max_lag`.
///
/// Computed with the Durbin–Levinson recursion from the common-mean sample
/// autocorrelations.
pub fn partial_autocorrelation(values: &[f64], max_lag: usize) -> Result<Vec<f64>> {
    check_max_lag(values.len(), max_lag)?;

    let acov = autocovariances(values, max_lag);
    if acov[0] <= 0.0 {
        return Ok(vec![0.0; max_lag]);
    }
    let rho: Vec<f64> = acov.iter().map(|g| g / acov[0]).collect();

    let mut pacf = Vec::with_capacity(max_lag);
    let mut phi: Vec<f64> = Vec::with_capacity(max_lag);
    for k in 1..=max_lag {
        let num = rho[k] - (1..k).map(|j| phi[j - 1] * rho[k - j]).sum::<f64>();
        let den = 1.0 - (1..k).map(|j| phi[j - 1] * rho[j]).sum::<f64>();
        let phi_kk = if den.abs() < 1e-12 { 0.0 } else { num / den };

        let mut next: Vec<f64> = (1..k).map(|j| phi[j - 1] - phi_kk * phi[k - j - 1]).collect();
        next.push(phi_kk);
        phi = next;
        pacf.push(phi_kk);
    }

    Ok(pacf)
}

/// Half-width of the approximate 95% band for correlations of white noise
pub fn significance_band(n: usize) -> f64 {
    if n == 0 {
        return f64::INFINITY;
    }
    BAND_Z / (n as f64).sqrt()
}

/// Lags (1-based) whose correlation lies outside the significance band
pub fn significant_lags(correlations: &[f64], n: usize) -> Vec<usize> {
    let band = significance_band(n);
    correlations
        .iter()
        .enumerate()
        .filter(|(_, c)| c.abs() > band)
        .map(|(i, _)| i + 1)
        .collect()
}

fn check_max_lag(n: usize, max_lag: usize) -> Result<()> {
    if max_lag == 0 {
        return Err(ForecastError::InvalidSpec(
            "Maximum lag must be at least 1".to_string(),
        ));
    }
    if n < 2 || max_lag > n - 2 {
        return Err(ForecastError::InsufficientData(format!(
            "Lag {} needs at least {} observations, got {}",
            max_lag,
            max_lag + 2,
            n
        )));
    }
    Ok(())
}

/// ACF and PACF of a series together with their significance band
#[derive(Debug, Clone, Serialize)]
pub struct Correlogram {
    /// Autocorrelations for lags 1..=max_lag
    pub acf: Vec<f64>,
    /// Partial autocorrelations for lags 1..=max_lag
    pub pacf: Vec<f64>,
    /// Half-width of the white-noise band
    pub band: f64,
    /// Length of the series
    pub n: usize,
}

impl Correlogram {
    /// Compute ACF and PACF up to `max_lag`
    pub fn compute(values: &[f64], max_lag: usize) -> Result<Self> {
        Ok(Self {
            acf: autocorrelation(values, max_lag)?,
            pacf: partial_autocorrelation(values, max_lag)?,
            band: significance_band(values.len()),
            n: values.len(),
        })
    }

    /// Lags with a significant autocorrelation (MA order candidates)
    pub fn significant_acf_lags(&self) -> Vec<usize> {
        significant_lags(&self.acf, self.n)
    }

    /// Lags with a significant partial autocorrelation (AR order candidates)
    pub fn significant_pacf_lags(&self) -> Vec<usize> {
        significant_lags(&self.pacf, self.n)
    }
}

/// Ljung–Box test result
#[derive(Debug, Clone, Copy, Serialize)]
pub struct LjungBoxResult {
    /// Test statistic Q
    pub statistic: f64,
    /// P-value from the chi-squared distribution
    pub p_value: f64,
    /// Number of lags tested
    pub lags: usize,
    /// Degrees of freedom after the fitted-parameter adjustment
    pub df: usize,
}

impl LjungBoxResult {
    /// True when the white-noise null is rejected (`p ≤ alpha`)
    pub fn rejects_white_noise(&self, alpha: f64) -> bool {
        self.p_value <= alpha
    }

    /// True when the series is consistent with white noise (`p > alpha`)
    pub fn is_white_noise(&self, alpha: f64) -> bool {
        !self.rejects_white_noise(alpha)
    }
}

/// Default number of lags for a series of length `n`: `min(10, n / 5)`
pub fn default_lags(n: usize) -> usize {
    10.min(n / 5).max(1)
}

/// Ljung–Box portmanteau test with the default lag count and no fitted parameters
pub fn white_noise_test(values: &[f64]) -> Result<LjungBoxResult> {
    ljung_box(values, default_lags(values.len()), 0)
}

/// Ljung–Box test of the first `lags` autocorrelations.
///
/// `fitted_params` is subtracted from the degrees of freedom when the input
/// is a residual series from a model with that many ARMA coefficients.
pub fn ljung_box(values: &[f64], lags: usize, fitted_params: usize) -> Result<LjungBoxResult> {
    let n = values.len();
    if n < 3 {
        return Err(ForecastError::InsufficientData(format!(
            "Ljung-Box test needs at least 3 observations, got {}",
            n
        )));
    }
    if lags == 0 || lags >= n {
        return Err(ForecastError::InvalidSpec(format!(
            "Ljung-Box lag count must be in 1..{}, got {}",
            n, lags
        )));
    }
    if fitted_params >= lags {
        return Err(ForecastError::InvalidSpec(format!(
            "Ljung-Box with {} lags leaves no degrees of freedom for {} fitted parameters",
            lags, fitted_params
        )));
    }
    let df = lags - fitted_params;

    let acov = autocovariances(values, lags);
    if acov[0] <= 0.0 {
        return Ok(LjungBoxResult {
            statistic: 0.0,
            p_value: 1.0,
            lags,
            df,
        });
    }

    let nf = n as f64;
    let q = nf
        * (nf + 2.0)
        * (1..=lags)
            .map(|k| (acov[k] / acov[0]).powi(2) / (nf - k as f64))
            .sum::<f64>();

    Ok(LjungBoxResult {
        statistic: q,
        p_value: chi_squared_sf(q, df)?,
        lags,
        df,
    })
}
