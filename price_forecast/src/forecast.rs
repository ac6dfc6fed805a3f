//! Multi-step forecasts with normal prediction intervals
//!
//! Forecasts are produced on the scale the model was fit on (log prices in
//! the standard pipeline) and only mapped to price units at the very end by
//! exponentiating the point and the interval bounds.

use crate::error::{ForecastError, Result};
use crate::models::FittedModel;
use crate::series::Period;
use crate::transform::TransformOp;
use forecast_math::distributions::normal_critical_value;
use forecast_math::polynomial::{difference_operator, multiply, psi_weights, recursion_coefficients};
use serde::Serialize;
use tracing::debug;

/// Default significance level of the prediction intervals
pub const DEFAULT_ALPHA: f64 = 0.05;

/// Forecast on the model scale
#[derive(Debug, Clone)]
pub struct ForecastResult {
    /// Point forecasts
    pub(crate) values: Vec<f64>,
    /// Standard errors of the forecasts
    pub(crate) std_errors: Vec<f64>,
    /// Periods being forecast
    pub(crate) periods: Vec<Period>,
    /// Transform chain of the series the model was fit on
    pub(crate) ops: Vec<TransformOp>,
}

impl ForecastResult {
    /// Create a forecast result, checking the pieces line up
    pub fn new(values: Vec<f64>, std_errors: Vec<f64>, periods: Vec<Period>) -> Result<Self> {
        if values.len() != std_errors.len() || values.len() != periods.len() {
            return Err(ForecastError::InvalidSpec(format!(
                "Forecast has {} values, {} standard errors and {} periods",
                values.len(),
                std_errors.len(),
                periods.len()
            )));
        }
        Ok(Self {
            values,
            std_errors,
            periods,
            ops: Vec::new(),
        })
    }

    /// Point forecasts
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Forecast standard errors
    pub fn std_errors(&self) -> &[f64] {
        &self.std_errors
    }

    /// Forecast periods
    pub fn periods(&self) -> &[Period] {
        &self.periods
    }

    /// Number of periods forecast
    pub fn horizons(&self) -> usize {
        self.values.len()
    }

    /// Symmetric intervals `point ± z·se` on the model scale
    pub fn intervals(&self, z: f64) -> Vec<(f64, f64)> {
        self.values
            .iter()
            .zip(&self.std_errors)
            .map(|(v, se)| (v - z * se, v + z * se))
            .collect()
    }

    /// Mean absolute error against realised values on the model scale
    pub fn mean_absolute_error(&self, actual: &[f64]) -> Result<f64> {
        self.check_actual(actual)?;
        let sum: f64 = self
            .values
            .iter()
            .zip(actual)
            .map(|(f, a)| (f - a).abs())
            .sum();
        Ok(sum / self.values.len() as f64)
    }

    /// Mean squared error against realised values on the model scale
    pub fn mean_squared_error(&self, actual: &[f64]) -> Result<f64> {
        self.check_actual(actual)?;
        let sum: f64 = self
            .values
            .iter()
            .zip(actual)
            .map(|(f, a)| (f - a).powi(2))
            .sum();
        Ok(sum / self.values.len() as f64)
    }

    fn check_actual(&self, actual: &[f64]) -> Result<()> {
        if self.values.len() != actual.len() || actual.is_empty() {
            return Err(ForecastError::InvalidSpec(format!(
                "Forecast length ({}) doesn't match actual length ({})",
                self.values.len(),
                actual.len()
            )));
        }
        Ok(())
    }
}

/// One forecast period in price units
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PricePoint {
    /// Period being forecast
    pub period: Period,
    /// Point forecast
    pub point: f64,
    /// Lower interval bound
    pub lower: f64,
    /// Upper interval bound
    pub upper: f64,
}

/// Forecast in original price units
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceForecast {
    /// Significance level of the intervals
    pub alpha: f64,
    /// One row per forecast period
    pub points: Vec<PricePoint>,
}

/// Produces forecasts from fitted models
#[derive(Debug, Clone, Copy)]
pub struct Forecaster {
    alpha: f64,
    z: f64,
}

impl Default for Forecaster {
    fn default() -> Self {
        Self {
            alpha: DEFAULT_ALPHA,
            z: 1.959_963_984_540_054,
        }
    }
}

impl Forecaster {
    /// Forecaster with `(1 - alpha)` prediction intervals
    pub fn new(alpha: f64) -> Result<Self> {
        if !(alpha > 0.0 && alpha < 1.0) {
            return Err(ForecastError::InvalidSpec(format!(
                "Significance level must be in (0, 1), got {}",
                alpha
            )));
        }
        Ok(Self {
            alpha,
            z: normal_critical_value(alpha)?,
        })
    }

    /// Significance level
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Two-sided normal critical value `Φ⁻¹(1 - α/2)`
    pub fn z(&self) -> f64 {
        self.z
    }

    /// Forecast `horizon` periods past the end of the model's series.
    ///
    /// The ARMA recursion runs on the differenced series with future shocks
    /// set to zero and is integrated back through the differencing operator.
    /// Standard errors come from the ψ-weights of the full AR operator
    /// including differencing: `se_h = σ·√(ψ₀² + … + ψ_{h-1}²)`.
    pub fn forecast(&self, model: &FittedModel, horizon: usize) -> Result<ForecastResult> {
        if horizon == 0 {
            return Err(ForecastError::InvalidSpec(
                "Forecast horizon must be at least 1".to_string(),
            ));
        }
        let last = model.series().series().end().ok_or_else(|| {
            ForecastError::InsufficientData("Cannot forecast an empty series".to_string())
        })?;

        let spec = model.spec();
        let ar = recursion_coefficients(&model.ar_operator());
        let ma_operator = model.ma_operator();
        let ma = &ma_operator[1..];
        let mean = model.constant();

        let mut w = model.differenced.clone();
        let mut e = model.innovations.clone();
        let observed = w.len();
        for t in observed..observed + horizon {
            let mut prediction = mean;
            for (i, a) in ar.iter().enumerate().take(t) {
                prediction += a * (w[t - 1 - i] - mean);
            }
            for (j, m) in ma.iter().enumerate().take(t) {
                prediction += m * e[t - 1 - j];
            }
            w.push(prediction);
            e.push(0.0);
        }

        let delta = difference_operator(spec.order.1, spec.seasonal_order.1, spec.period());
        let mut levels = model.series().values().to_vec();
        let history = levels.len();
        for step in 0..horizon {
            let t = history + step;
            let carried: f64 = delta
                .iter()
                .enumerate()
                .skip(1)
                .map(|(k, c)| c * levels[t - k])
                .sum();
            levels.push(w[observed + step] - carried);
        }

        let full_ar = multiply(&model.ar_operator(), &delta);
        let psi = psi_weights(&full_ar, &ma_operator, horizon);
        let mut cumulative = 0.0;
        let std_errors = psi
            .iter()
            .map(|p| {
                cumulative += p * p;
                (model.sigma2() * cumulative).sqrt()
            })
            .collect();

        let periods = (1..=horizon as i64).map(|h| last.offset(h)).collect();
        debug!(model = %spec, horizon, from = %last, "forecast produced");

        Ok(ForecastResult {
            values: levels.split_off(history),
            std_errors,
            periods,
            ops: model.series().ops().to_vec(),
        })
    }

    /// Map a forecast to price units.
    ///
    /// A log-scale forecast is exponentiated together with its interval
    /// bounds; a forecast on the untransformed scale is passed through.
    pub fn to_price_scale(&self, result: &ForecastResult) -> Result<PriceForecast> {
        let exponentiate = match result.ops.as_slice() {
            [] => false,
            [TransformOp::Log] => true,
            _ => {
                return Err(ForecastError::InvalidSpec(format!(
                    "Forecasts of a series transformed by {:?} cannot be mapped to prices",
                    result.ops
                )))
            }
        };
        let map = |v: f64| if exponentiate { v.exp() } else { v };

        let points = result
            .periods
            .iter()
            .zip(result.intervals(self.z))
            .zip(&result.values)
            .map(|((period, (lower, upper)), point)| PricePoint {
                period: *period,
                point: map(*point),
                lower: map(lower),
                upper: map(upper),
            })
            .collect();

        Ok(PriceForecast {
            alpha: self.alpha,
            points,
        })
    }
}
