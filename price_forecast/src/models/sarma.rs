//! Conditional maximum-likelihood estimation of seasonal ARMA models
//!
//! The series is differenced according to the model orders, then the ARMA
//! part is estimated by minimizing the conditional sum of squares with the
//! innovation variance concentrated out of the Gaussian likelihood:
//!
//! ```text
//! -ℓ(β) = n/2 · (ln(2π · S(β) / n) + 1)
//! ```
//!
//! Coefficients are searched in an unconstrained space that maps onto
//! stationary AR and invertible MA polynomials, so every candidate the
//! optimizer visits is admissible.

use super::{FittedModel, ModelSpec};
use crate::error::{ForecastError, Result};
use crate::transform::{difference_orders, TransformedSeries};
use forecast_math::descriptive::mean;
use forecast_math::hessian::standard_errors;
use forecast_math::optimize::{NelderMead, NelderMeadConfig};
use forecast_math::polynomial::{
    ar_operator, constrain_stationary, ma_operator, multiply, recursion_coefficients,
    unconstrain_stationary,
};
use std::f64::consts::PI;
use tracing::{debug, warn};

/// Estimates [`FittedModel`]s from transformed series
#[derive(Debug, Clone)]
pub struct SarmaFitter {
    optimizer: NelderMead,
    std_errors: bool,
    conditioning: usize,
}

impl Default for SarmaFitter {
    fn default() -> Self {
        Self {
            optimizer: NelderMead::default(),
            std_errors: true,
            conditioning: 0,
        }
    }
}

impl SarmaFitter {
    /// Fitter with default optimizer settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Fitter with custom optimizer settings
    pub fn with_optimizer(config: NelderMeadConfig) -> Result<Self> {
        Ok(Self {
            optimizer: NelderMead::new(config)?,
            ..Self::default()
        })
    }

    /// Skip the Hessian; coefficients get NaN standard errors
    pub fn without_std_errors(mut self) -> Self {
        self.std_errors = false;
        self
    }

    /// Start every likelihood at least `span` observations into the series.
    ///
    /// Models fit with the same span are scored on the same observations, so
    /// their information criteria can be compared. A model whose own
    /// differencing and AR lags need more observations keeps its own start.
    pub fn with_conditioning(mut self, span: usize) -> Self {
        self.conditioning = span;
        self
    }

    /// Observations skipped before the likelihood starts, `0` when each
    /// model conditions on its own lags only
    pub fn conditioning(&self) -> usize {
        self.conditioning
    }

    /// Fit `spec` to `series`
    pub fn fit(&self, series: &TransformedSeries, spec: &ModelSpec) -> Result<FittedModel> {
        self.fit_from(series, spec, None)
    }

    /// Fit `spec` to `series`, starting the search from `initial`.
    ///
    /// `initial` is in [`FittedModel::parameters`] order, typically taken
    /// from an earlier fit of the same orders. A start of the wrong length
    /// or outside the admissible region is ignored.
    pub fn fit_from(
        &self,
        series: &TransformedSeries,
        spec: &ModelSpec,
        initial: Option<&[f64]>,
    ) -> Result<FittedModel> {
        spec.validate()?;

        let offset = self.conditioning.max(spec.conditioning_span());
        let required = offset + spec.n_coefficients() + 2;
        if series.len() < required {
            return Err(ForecastError::InvalidSpec(format!(
                "{} needs at least {} observations, series has {}",
                spec,
                required,
                series.len()
            )));
        }

        let (_, d, _) = spec.order;
        let (_, sd, _) = spec.seasonal_order;
        let differenced = difference_orders(series, d, sd, spec.period())?;
        let w = differenced.values().to_vec();
        let layout = Layout::from_spec(spec);
        // Index into the differenced series, which starts `differencing_span` in
        let conditioning = offset - spec.differencing_span();
        let n_eff = w.len() - conditioning;

        let start = initial
            .and_then(|params| layout.unconstrain(params))
            .unwrap_or_else(|| layout.default_start(&w));

        let objective = |u: &[f64]| {
            let params = layout.constrain(u);
            neg_log_likelihood(&w, &layout, &params, conditioning)
        };

        let minimum = self.optimizer.minimize(objective, &start).map_err(|e| {
            ForecastError::NonConvergence(format!("{} could not be optimized: {}", spec, e))
        })?;
        if !minimum.converged {
            return Err(ForecastError::NonConvergence(format!(
                "{} did not converge within {} iterations",
                spec,
                self.optimizer.config().max_iter
            )));
        }

        let params = layout.constrain(&minimum.point);
        let std_errors = if self.std_errors {
            let nll = |p: &[f64]| neg_log_likelihood(&w, &layout, p, conditioning);
            standard_errors(&nll, &params).unwrap_or_else(|e| {
                warn!(model = %spec, error = %e, "standard errors unavailable");
                vec![f64::NAN; params.len()]
            })
        } else {
            vec![f64::NAN; params.len()]
        };

        let parts = layout.split(&params);
        let (ar_rec, ma_rec) = recursions(&parts, layout.period);
        let innovations = innovations(&w, &ar_rec, &ma_rec, parts.mean, conditioning);
        let ssr: f64 = innovations[conditioning..].iter().map(|e| e * e).sum();
        let sigma2 = ssr / n_eff as f64;
        let log_likelihood = -minimum.value;

        debug!(
            model = %spec,
            log_likelihood,
            sigma2,
            iterations = minimum.iterations,
            "fitted model"
        );

        Ok(FittedModel {
            spec: *spec,
            series: series.clone(),
            differenced: w,
            ar: parts.ar.to_vec(),
            ma: parts.ma.to_vec(),
            seasonal_ar: parts.seasonal_ar.to_vec(),
            seasonal_ma: parts.seasonal_ma.to_vec(),
            constant: parts.mean,
            std_errors,
            innovations,
            conditioning,
            sigma2,
            log_likelihood,
            iterations: minimum.iterations,
        })
    }
}

/// Position of each coefficient block in a parameter vector
#[derive(Debug, Clone, Copy)]
struct Layout {
    p: usize,
    q: usize,
    seasonal_p: usize,
    seasonal_q: usize,
    period: usize,
    constant: bool,
}

struct Parts<'a> {
    ar: &'a [f64],
    ma: &'a [f64],
    seasonal_ar: &'a [f64],
    seasonal_ma: &'a [f64],
    mean: f64,
}

impl Layout {
    fn from_spec(spec: &ModelSpec) -> Self {
        Self {
            p: spec.order.0,
            q: spec.order.2,
            seasonal_p: spec.seasonal_order.0,
            seasonal_q: spec.seasonal_order.2,
            period: spec.period(),
            constant: spec.uses_constant(),
        }
    }

    fn len(&self) -> usize {
        self.p + self.q + self.seasonal_p + self.seasonal_q + usize::from(self.constant)
    }

    fn blocks(&self) -> [(usize, usize); 4] {
        let ar = (0, self.p);
        let ma = (ar.1, ar.1 + self.q);
        let sar = (ma.1, ma.1 + self.seasonal_p);
        let sma = (sar.1, sar.1 + self.seasonal_q);
        [ar, ma, sar, sma]
    }

    fn split<'a>(&self, params: &'a [f64]) -> Parts<'a> {
        let [ar, ma, sar, sma] = self.blocks();
        Parts {
            ar: &params[ar.0..ar.1],
            ma: &params[ma.0..ma.1],
            seasonal_ar: &params[sar.0..sar.1],
            seasonal_ma: &params[sma.0..sma.1],
            mean: if self.constant { params[sma.1] } else { 0.0 },
        }
    }

    /// Map an unconstrained search point to model coefficients.
    ///
    /// MA blocks reuse the stationary map with the sign flipped: `θ(B)` is
    /// invertible exactly when `1 - Σ(-θᵢ)Bⁱ` is stationary.
    fn constrain(&self, unconstrained: &[f64]) -> Vec<f64> {
        let mut out = Vec::with_capacity(self.len());
        for (i, (lo, hi)) in self.blocks().into_iter().enumerate() {
            let block = constrain_stationary(&unconstrained[lo..hi]);
            if i % 2 == 0 {
                out.extend(block);
            } else {
                out.extend(block.into_iter().map(|c| -c));
            }
        }
        if self.constant {
            out.push(unconstrained[self.len() - 1]);
        }
        out
    }

    /// Inverse of [`Layout::constrain`], `None` for inadmissible coefficients
    fn unconstrain(&self, params: &[f64]) -> Option<Vec<f64>> {
        if params.len() != self.len() || params.iter().any(|v| !v.is_finite()) {
            debug!(expected = self.len(), got = params.len(), "ignoring unusable start");
            return None;
        }
        let mut out = Vec::with_capacity(self.len());
        for (i, (lo, hi)) in self.blocks().into_iter().enumerate() {
            let block: Vec<f64> = if i % 2 == 0 {
                params[lo..hi].to_vec()
            } else {
                params[lo..hi].iter().map(|c| -c).collect()
            };
            out.extend(unconstrain_stationary(&block).ok()?);
        }
        if self.constant {
            out.push(params[self.len() - 1]);
        }
        Some(out)
    }

    /// White-noise start: zero ARMA coefficients and the sample mean
    fn default_start(&self, w: &[f64]) -> Vec<f64> {
        let mut start = vec![0.0; self.len()];
        if self.constant {
            start[self.len() - 1] = mean(w);
        }
        start
    }
}

/// Expanded AR recursion weights and MA weights (without the leading 1)
fn recursions(parts: &Parts<'_>, period: usize) -> (Vec<f64>, Vec<f64>) {
    let ar = multiply(
        &ar_operator(parts.ar, 1),
        &ar_operator(parts.seasonal_ar, period),
    );
    let ma = multiply(
        &ma_operator(parts.ma, 1),
        &ma_operator(parts.seasonal_ma, period),
    );
    (recursion_coefficients(&ar), ma.into_iter().skip(1).collect())
}

/// One-step innovations, zero before `conditioning`
fn innovations(w: &[f64], ar: &[f64], ma: &[f64], mean: f64, conditioning: usize) -> Vec<f64> {
    let mut e = vec![0.0; w.len()];
    for t in conditioning..w.len() {
        let mut prediction = mean;
        for (i, a) in ar.iter().enumerate() {
            prediction += a * (w[t - 1 - i] - mean);
        }
        for (j, m) in ma.iter().enumerate().take(t) {
            prediction += m * e[t - 1 - j];
        }
        e[t] = w[t] - prediction;
    }
    e
}

/// Concentrated conditional negative log-likelihood at `params`
fn neg_log_likelihood(w: &[f64], layout: &Layout, params: &[f64], conditioning: usize) -> f64 {
    let parts = layout.split(params);
    let (ar, ma) = recursions(&parts, layout.period);
    let e = innovations(w, &ar, &ma, parts.mean, conditioning);
    let n = (w.len() - conditioning) as f64;
    let ssr: f64 = e[conditioning..].iter().map(|v| v * v).sum();
    if !ssr.is_finite() || ssr <= 0.0 {
        return f64::INFINITY;
    }
    0.5 * n * ((2.0 * PI * ssr / n).ln() + 1.0)
}
