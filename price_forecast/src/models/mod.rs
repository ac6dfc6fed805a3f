//! Seasonal ARMA model specification, estimation and fitted-model inspection

use crate::diagnostics::{ljung_box, LjungBoxResult};
use crate::error::{ForecastError, Result};
use crate::transform::TransformedSeries;
use forecast_math::polynomial::{ar_operator, ma_operator, multiply};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub mod sarma;
pub mod search;

pub use sarma::SarmaFitter;
pub use search::{grid_search, shared_conditioning, SearchBounds, SearchResult};

/// Orders of a (seasonal) ARIMA model.
///
/// `order` is `(p, d, q)`, `seasonal_order` is `(P, D, Q)` at lag
/// `seasonal_period`. Seasonal terms are ignored when all seasonal orders
/// are zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelSpec {
    /// Non-seasonal `(p, d, q)`
    pub order: (usize, usize, usize),
    /// Seasonal `(P, D, Q)`
    #[serde(default)]
    pub seasonal_order: (usize, usize, usize),
    /// Observations per seasonal cycle
    #[serde(default)]
    pub seasonal_period: usize,
    /// Estimate a mean for the differenced series. When unset a mean is
    /// estimated only if no differencing is applied.
    #[serde(default)]
    pub include_constant: Option<bool>,
}

impl ModelSpec {
    /// Non-seasonal ARIMA(p, d, q)
    pub fn arima(p: usize, d: usize, q: usize) -> Self {
        Self {
            order: (p, d, q),
            seasonal_order: (0, 0, 0),
            seasonal_period: 0,
            include_constant: None,
        }
    }

    /// Add seasonal orders at the given period
    pub fn with_seasonal(mut self, sp: usize, sd: usize, sq: usize, period: usize) -> Self {
        self.seasonal_order = (sp, sd, sq);
        self.seasonal_period = period;
        self
    }

    /// Force the constant term on or off
    pub fn with_constant(mut self, include: bool) -> Self {
        self.include_constant = Some(include);
        self
    }

    /// Whether any seasonal order is non-zero
    pub fn is_seasonal(&self) -> bool {
        let (sp, sd, sq) = self.seasonal_order;
        sp + sd + sq > 0
    }

    /// Seasonal period, `0` for a non-seasonal model
    pub fn period(&self) -> usize {
        if self.is_seasonal() {
            self.seasonal_period
        } else {
            0
        }
    }

    /// Whether a constant is estimated
    pub fn uses_constant(&self) -> bool {
        let (_, d, _) = self.order;
        let (_, sd, _) = self.seasonal_order;
        self.include_constant.unwrap_or(d + sd == 0)
    }

    /// Number of AR and MA coefficients, seasonal ones included
    pub fn arma_params(&self) -> usize {
        let (p, _, q) = self.order;
        let (sp, _, sq) = self.seasonal_order;
        p + q + sp + sq
    }

    /// Number of estimated coefficients (ARMA terms plus constant)
    pub fn n_coefficients(&self) -> usize {
        self.arma_params() + usize::from(self.uses_constant())
    }

    /// Highest lag of the expanded AR polynomial `φ(B)Φ(Bˢ)`
    pub fn ar_span(&self) -> usize {
        self.order.0 + self.period() * self.seasonal_order.0
    }

    /// Highest lag of the expanded MA polynomial `θ(B)Θ(Bˢ)`
    pub fn ma_span(&self) -> usize {
        self.order.2 + self.period() * self.seasonal_order.2
    }

    /// Observations consumed by differencing
    pub fn differencing_span(&self) -> usize {
        self.order.1 + self.period() * self.seasonal_order.1
    }

    /// Observations of the undifferenced series before the first likelihood term
    pub fn conditioning_span(&self) -> usize {
        self.differencing_span() + self.ar_span()
    }

    /// Check the orders are internally consistent
    pub fn validate(&self) -> Result<()> {
        if self.is_seasonal() && self.seasonal_period < 2 {
            return Err(ForecastError::InvalidSpec(format!(
                "{} has seasonal orders but a seasonal period of {}",
                self, self.seasonal_period
            )));
        }
        Ok(())
    }
}

impl fmt::Display for ModelSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (p, d, q) = self.order;
        if self.is_seasonal() {
            let (sp, sd, sq) = self.seasonal_order;
            write!(
                f,
                "SARIMA({},{},{})({},{},{})[{}]",
                p, d, q, sp, sd, sq, self.seasonal_period
            )
        } else {
            write!(f, "ARIMA({},{},{})", p, d, q)
        }
    }
}

impl FromStr for ModelSpec {
    type Err = ForecastError;

    /// Parse `p,d,q` or `p,d,q;P,D,Q;s`, optionally suffixed with `+c`
    /// (constant) or `-c` (no constant).
    fn from_str(text: &str) -> Result<Self> {
        let text = text.trim();
        let (body, constant) = if let Some(rest) = text.strip_suffix("+c") {
            (rest, Some(true))
        } else if let Some(rest) = text.strip_suffix("-c") {
            (rest, Some(false))
        } else {
            (text, None)
        };

        let parts: Vec<&str> = body.split(';').map(str::trim).collect();
        let order = parse_triple(parts[0], text)?;
        let mut spec = match parts.len() {
            1 => Self::arima(order.0, order.1, order.2),
            3 => {
                let seasonal = parse_triple(parts[1], text)?;
                let period = parse_order(parts[2], text)?;
                Self::arima(order.0, order.1, order.2).with_seasonal(
                    seasonal.0, seasonal.1, seasonal.2, period,
                )
            }
            _ => {
                return Err(ForecastError::InvalidSpec(format!(
                    "Expected 'p,d,q' or 'p,d,q;P,D,Q;s', got '{}'",
                    text
                )))
            }
        };
        spec.include_constant = constant;
        spec.validate()?;
        Ok(spec)
    }
}

fn parse_triple(part: &str, whole: &str) -> Result<(usize, usize, usize)> {
    let values = part
        .split(',')
        .map(|v| parse_order(v, whole))
        .collect::<Result<Vec<usize>>>()?;
    match values.as_slice() {
        [a, b, c] => Ok((*a, *b, *c)),
        _ => Err(ForecastError::InvalidSpec(format!(
            "Expected three orders in '{}' of '{}'",
            part, whole
        ))),
    }
}

fn parse_order(value: &str, whole: &str) -> Result<usize> {
    let parsed: i64 = value.trim().parse().map_err(|_| {
        ForecastError::InvalidSpec(format!("'{}' in '{}' is not an integer", value, whole))
    })?;
    if parsed < 0 {
        return Err(ForecastError::InvalidSpec(format!(
            "Model orders must be non-negative, got {} in '{}'",
            parsed, whole
        )));
    }
    Ok(parsed as usize)
}

/// An estimated coefficient with its standard error
#[derive(Debug, Clone, Serialize)]
pub struct Coefficient {
    /// Name such as `ar.L1`, `ma.S.L12` or `const`
    pub name: String,
    /// Point estimate
    pub value: f64,
    /// Asymptotic standard error (NaN when unavailable)
    pub std_error: f64,
}

impl Coefficient {
    /// Estimate divided by its standard error
    pub fn t_ratio(&self) -> f64 {
        self.value / self.std_error
    }

    /// Rule of thumb for significance at roughly 5%: `|value| > 2·se`
    pub fn is_significant(&self) -> bool {
        self.std_error.is_finite() && self.value.abs() > 2.0 * self.std_error
    }
}

/// A model estimated on a transformed series
#[derive(Debug, Clone)]
pub struct FittedModel {
    pub(crate) spec: ModelSpec,
    pub(crate) series: TransformedSeries,
    /// Series after the model's own differencing
    pub(crate) differenced: Vec<f64>,
    pub(crate) ar: Vec<f64>,
    pub(crate) ma: Vec<f64>,
    pub(crate) seasonal_ar: Vec<f64>,
    pub(crate) seasonal_ma: Vec<f64>,
    pub(crate) constant: f64,
    /// Standard errors in [`FittedModel::coefficients`] order
    pub(crate) std_errors: Vec<f64>,
    /// One-step innovations aligned with `differenced`; zero before the
    /// conditioning start
    pub(crate) innovations: Vec<f64>,
    pub(crate) conditioning: usize,
    pub(crate) sigma2: f64,
    pub(crate) log_likelihood: f64,
    pub(crate) iterations: usize,
}

impl FittedModel {
    /// Orders the model was fit with
    pub fn spec(&self) -> &ModelSpec {
        &self.spec
    }

    /// Series the model was fit on
    pub fn series(&self) -> &TransformedSeries {
        &self.series
    }

    /// Non-seasonal AR coefficients
    pub fn ar(&self) -> &[f64] {
        &self.ar
    }

    /// Non-seasonal MA coefficients
    pub fn ma(&self) -> &[f64] {
        &self.ma
    }

    /// Seasonal AR coefficients
    pub fn seasonal_ar(&self) -> &[f64] {
        &self.seasonal_ar
    }

    /// Seasonal MA coefficients
    pub fn seasonal_ma(&self) -> &[f64] {
        &self.seasonal_ma
    }

    /// Mean of the differenced series (zero when no constant is estimated)
    pub fn constant(&self) -> f64 {
        self.constant
    }

    /// Estimated coefficients in the order AR, MA, seasonal AR, seasonal MA, constant
    pub fn parameters(&self) -> Vec<f64> {
        let mut params = Vec::with_capacity(self.spec.n_coefficients());
        params.extend_from_slice(&self.ar);
        params.extend_from_slice(&self.ma);
        params.extend_from_slice(&self.seasonal_ar);
        params.extend_from_slice(&self.seasonal_ma);
        if self.spec.uses_constant() {
            params.push(self.constant);
        }
        params
    }

    /// Named coefficients with standard errors
    pub fn coefficients(&self) -> Vec<Coefficient> {
        let s = self.spec.period();
        let mut names = Vec::with_capacity(self.spec.n_coefficients());
        names.extend((1..=self.ar.len()).map(|i| format!("ar.L{}", i)));
        names.extend((1..=self.ma.len()).map(|i| format!("ma.L{}", i)));
        names.extend((1..=self.seasonal_ar.len()).map(|i| format!("ar.S.L{}", i * s)));
        names.extend((1..=self.seasonal_ma.len()).map(|i| format!("ma.S.L{}", i * s)));
        if self.spec.uses_constant() {
            names.push("const".to_string());
        }

        names
            .into_iter()
            .zip(self.parameters())
            .zip(self.std_errors.iter().copied())
            .map(|((name, value), std_error)| Coefficient {
                name,
                value,
                std_error,
            })
            .collect()
    }

    /// Residuals from the conditioning start onwards
    pub fn residuals(&self) -> &[f64] {
        &self.innovations[self.conditioning..]
    }

    /// Innovation variance estimate
    pub fn sigma2(&self) -> f64 {
        self.sigma2
    }

    /// Maximized conditional log-likelihood
    pub fn log_likelihood(&self) -> f64 {
        self.log_likelihood
    }

    /// Observations entering the likelihood
    pub fn n_obs(&self) -> usize {
        self.residuals().len()
    }

    /// Estimated parameters including the innovation variance
    pub fn n_params(&self) -> usize {
        self.spec.n_coefficients() + 1
    }

    /// Akaike information criterion
    pub fn aic(&self) -> f64 {
        -2.0 * self.log_likelihood + 2.0 * self.n_params() as f64
    }

    /// Bayesian information criterion
    pub fn bic(&self) -> f64 {
        -2.0 * self.log_likelihood + self.n_params() as f64 * (self.n_obs() as f64).ln()
    }

    /// Optimizer iterations spent on the fit
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Ljung–Box test of the residuals, adjusting for the ARMA coefficients
    pub fn residual_test(&self, lags: usize) -> Result<LjungBoxResult> {
        ljung_box(self.residuals(), lags, self.spec.arma_params())
    }

    /// Expanded AR operator `φ(B)Φ(Bˢ)` of the differenced series
    pub fn ar_operator(&self) -> Vec<f64> {
        multiply(
            &ar_operator(&self.ar, 1),
            &ar_operator(&self.seasonal_ar, self.spec.period()),
        )
    }

    /// Expanded MA operator `θ(B)Θ(Bˢ)`
    pub fn ma_operator(&self) -> Vec<f64> {
        multiply(
            &ma_operator(&self.ma, 1),
            &ma_operator(&self.seasonal_ma, self.spec.period()),
        )
    }
}
