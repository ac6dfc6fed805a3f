//! Descriptive statistics over slices of observations

use crate::{MathError, Result};

/// Arithmetic mean. Returns NaN for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample variance with an `n - 1` denominator
pub fn sample_variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let m = mean(values);
    values.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64
}

/// Median of the values (average of the two middle values for even lengths)
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Largest value, NaN for an empty slice
pub fn max(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::NAN, f64::max)
}

/// Pearson correlation coefficient between two equally long slices.
///
/// Returns `0.0` when either slice has no variation.
pub fn pearson(x: &[f64], y: &[f64]) -> Result<f64> {
    if x.len() != y.len() {
        return Err(MathError::InvalidInput(format!(
            "Slices have different lengths ({} vs {})",
            x.len(),
            y.len()
        )));
    }
    if x.len() < 2 {
        return Err(MathError::InsufficientData(
            "Need at least 2 pairs to compute a correlation".to_string(),
        ));
    }

    let mx = mean(x);
    let my = mean(y);

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (&a, &b) in x.iter().zip(y.iter()) {
        sxy += (a - mx) * (b - my);
        sxx += (a - mx).powi(2);
        syy += (b - my).powi(2);
    }

    let denom = (sxx * syy).sqrt();
    if denom < 1e-300 {
        return Ok(0.0);
    }
    Ok(sxy / denom)
}

/// Sample autocovariances for lags `0..=max_lag` using the common mean and
/// an `n` denominator.
pub fn autocovariances(values: &[f64], max_lag: usize) -> Vec<f64> {
    let n = values.len();
    if n == 0 {
        return Vec::new();
    }
    let m = mean(values);
    (0..=max_lag.min(n - 1))
        .map(|k| {
            values[k..]
                .iter()
                .zip(values.iter())
                .map(|(a, b)| (a - m) * (b - m))
                .sum::<f64>()
                / n as f64
        })
        .collect()
}
