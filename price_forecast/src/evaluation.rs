//! In-sample and out-of-sample model comparison
//!
//! Candidates are scored by information criteria on the full sample and by
//! rolling-origin forecast errors. Out-of-sample accuracy decides; when the
//! Diebold–Mariano test cannot tell the best candidate from a rival, the
//! simpler model is preferred.

use crate::error::{ForecastError, Result};
use crate::forecast::Forecaster;
use crate::metrics::ErrorSummary;
use crate::models::{FittedModel, ModelSpec, SarmaFitter};
use crate::transform::TransformedSeries;
use forecast_math::descriptive::{autocovariances, mean};
use forecast_math::distributions::students_t_two_sided;
use serde::Serialize;
use tracing::{info, warn};

/// Forecast horizon used for rolling-origin errors
pub const DEFAULT_EVALUATION_HORIZON: usize = 4;

/// Share of the series used before the first forecast origin
pub const DEFAULT_ORIGIN_FRACTION: f64 = 0.70;

/// Level at which the Diebold–Mariano test separates two candidates
pub const DM_ALPHA: f64 = 0.05;

/// Information criteria of a fitted model
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct InformationCriteria {
    /// Maximized log-likelihood
    pub log_likelihood: f64,
    /// Akaike information criterion
    pub aic: f64,
    /// Bayesian information criterion
    pub bic: f64,
    /// Estimated parameters, innovation variance included
    pub n_params: usize,
    /// Observations in the likelihood
    pub n_obs: usize,
}

impl InformationCriteria {
    /// Criteria of `model`
    pub fn of(model: &FittedModel) -> Self {
        Self {
            log_likelihood: model.log_likelihood(),
            aic: model.aic(),
            bic: model.bic(),
            n_params: model.n_params(),
            n_obs: model.n_obs(),
        }
    }
}

/// Forecast errors at a fixed horizon from successive origins
#[derive(Debug, Clone, Serialize)]
pub struct RollingOriginResult {
    /// Candidate evaluated
    pub spec: ModelSpec,
    /// Forecast horizon of each error
    pub horizon: usize,
    /// Length of the history at each origin (1-based index of the origin)
    pub origins: Vec<usize>,
    /// `actual - forecast`, `None` where the refit did not converge
    pub errors: Vec<Option<f64>>,
}

impl RollingOriginResult {
    /// Summary of the absolute errors
    pub fn summary(&self) -> ErrorSummary {
        ErrorSummary::from_errors(&self.errors)
    }
}

/// Rolling-origin evaluation settings
#[derive(Debug, Clone)]
pub struct RollingOrigin {
    horizon: usize,
    fraction: f64,
    fitter: SarmaFitter,
}

impl Default for RollingOrigin {
    fn default() -> Self {
        Self {
            horizon: DEFAULT_EVALUATION_HORIZON,
            fraction: DEFAULT_ORIGIN_FRACTION,
            fitter: SarmaFitter::new().without_std_errors(),
        }
    }
}

impl RollingOrigin {
    /// Evaluation at `horizon` with the first origin at `round(fraction·N)`
    pub fn new(horizon: usize, fraction: f64) -> Result<Self> {
        if horizon == 0 {
            return Err(ForecastError::InvalidSpec(
                "Evaluation horizon must be at least 1".to_string(),
            ));
        }
        if !(fraction > 0.0 && fraction < 1.0) {
            return Err(ForecastError::InvalidSpec(format!(
                "Origin fraction must be in (0, 1), got {}",
                fraction
            )));
        }
        Ok(Self {
            horizon,
            fraction,
            ..Self::default()
        })
    }

    /// Use `fitter` for the refits; standard errors are never computed
    pub fn with_fitter(mut self, fitter: SarmaFitter) -> Self {
        self.fitter = fitter.without_std_errors();
        self
    }

    /// Forecast horizon
    pub fn horizon(&self) -> usize {
        self.horizon
    }

    /// First origin for a series of length `n`: `round(fraction·n)`
    pub fn first_origin(&self, n: usize) -> usize {
        (self.fraction * n as f64).round() as usize
    }

    /// Refit `spec` on each history `1..=i` for origins `i = S..=N-h` and
    /// record the error of the `h`-step forecast.
    ///
    /// Produces exactly `N - h - S + 1` entries. A refit that does not
    /// converge is logged and recorded as `None`.
    pub fn evaluate(&self, series: &TransformedSeries, spec: &ModelSpec) -> Result<RollingOriginResult> {
        let n = series.len();
        let h = self.horizon;
        let first = self.first_origin(n);
        if first == 0 || n < h || n - h < first {
            return Err(ForecastError::InsufficientData(format!(
                "Series of length {} leaves no forecast origins at horizon {} starting from {}",
                n, h, first
            )));
        }

        let forecaster = Forecaster::default();
        let actual = series.values();
        let mut origins = Vec::with_capacity(n - h - first + 1);
        let mut errors = Vec::with_capacity(n - h - first + 1);
        let mut warm: Option<Vec<f64>> = None;

        for origin in first..=n - h {
            let history = series.head(origin)?;
            let forecast = match self.fitter.fit_from(&history, spec, warm.as_deref()) {
                Ok(model) => {
                    warm = Some(model.parameters());
                    forecaster.forecast(&model, h)?
                }
                Err(ForecastError::NonConvergence(reason)) => {
                    warn!(model = %spec, origin, %reason, "skipping origin");
                    origins.push(origin);
                    errors.push(None);
                    continue;
                }
                Err(e) => return Err(e),
            };
            origins.push(origin);
            errors.push(Some(actual[origin + h - 1] - forecast.values()[h - 1]));
        }

        let result = RollingOriginResult {
            spec: *spec,
            horizon: h,
            origins,
            errors,
        };
        info!(model = %spec, summary = %result.summary(), "rolling-origin evaluation");
        Ok(result)
    }
}

/// Rolling-origin errors with the default fitter
pub fn rolling_origin(
    series: &TransformedSeries,
    spec: &ModelSpec,
    horizon: usize,
    fraction: f64,
) -> Result<RollingOriginResult> {
    RollingOrigin::new(horizon, fraction)?.evaluate(series, spec)
}

/// Outcome of a Diebold–Mariano test
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DieboldMariano {
    /// Small-sample corrected statistic
    pub statistic: f64,
    /// Two-sided p-value from Student-t with `n - 1` degrees of freedom
    pub p_value: f64,
    /// Error pairs used
    pub n: usize,
    /// Horizon used for the long-run variance
    pub horizon: usize,
}

impl DieboldMariano {
    /// Whether equal accuracy is rejected at `alpha`
    pub fn rejects_equal_accuracy(&self, alpha: f64) -> bool {
        self.p_value <= alpha
    }
}

/// Diebold–Mariano test of equal accuracy for two error series.
///
/// The loss is `|e|^power`. Pairs with a missing error on either side are
/// dropped. The long-run variance uses autocovariances up to lag `h - 1`;
/// if it is not positive the test falls back to `h = 1`. The statistic
/// carries the Harvey–Leybourne–Newbold correction.
pub fn diebold_mariano(
    errors1: &[Option<f64>],
    errors2: &[Option<f64>],
    horizon: usize,
    power: i32,
) -> Result<DieboldMariano> {
    if errors1.len() != errors2.len() {
        return Err(ForecastError::InvalidSpec(format!(
            "Error series have different lengths ({} vs {})",
            errors1.len(),
            errors2.len()
        )));
    }
    if horizon == 0 || power < 1 {
        return Err(ForecastError::InvalidSpec(format!(
            "Diebold-Mariano needs horizon >= 1 and power >= 1, got {} and {}",
            horizon, power
        )));
    }

    let d: Vec<f64> = errors1
        .iter()
        .zip(errors2)
        .filter_map(|(a, b)| Some(a.as_ref()?.abs().powi(power) - b.as_ref()?.abs().powi(power)))
        .collect();
    let n = d.len();
    if n < 2 {
        return Err(ForecastError::InsufficientData(format!(
            "Diebold-Mariano needs at least 2 complete error pairs, got {}",
            n
        )));
    }

    let mut h = horizon;
    let d_mean = mean(&d);
    let variance = loop {
        let acov = autocovariances(&d, h - 1);
        let v = (acov[0] + 2.0 * acov[1..].iter().sum::<f64>()) / n as f64;
        if v > 0.0 || h == 1 {
            break v;
        }
        warn!(horizon = h, "non-positive Diebold-Mariano variance, using horizon 1");
        h = 1;
    };

    if variance <= 0.0 {
        // Identical losses at every origin
        let (statistic, p_value) = if d_mean == 0.0 {
            (0.0, 1.0)
        } else {
            (d_mean.signum() * f64::INFINITY, 0.0)
        };
        return Ok(DieboldMariano {
            statistic,
            p_value,
            n,
            horizon: h,
        });
    }

    let nf = n as f64;
    let hf = h as f64;
    let correction = (nf + 1.0 - 2.0 * hf + hf * (hf - 1.0) / nf) / nf;
    if correction <= 0.0 {
        return Err(ForecastError::InsufficientData(format!(
            "{} error pairs are too few for horizon {}",
            n, h
        )));
    }

    let statistic = d_mean / variance.sqrt() * correction.sqrt();
    Ok(DieboldMariano {
        statistic,
        p_value: students_t_two_sided(statistic, n - 1)?,
        n,
        horizon: h,
    })
}

/// Everything the selection rule needs to know about one candidate
#[derive(Debug, Clone, Serialize)]
pub struct CandidateScore {
    /// Candidate orders
    pub spec: ModelSpec,
    /// Full-sample information criteria
    pub criteria: InformationCriteria,
    /// Rolling-origin errors
    pub rolling: RollingOriginResult,
    /// Summary of the rolling-origin absolute errors
    pub out_of_sample: ErrorSummary,
}

impl CandidateScore {
    /// Score a full-sample fit together with its rolling-origin errors
    pub fn new(model: &FittedModel, rolling: RollingOriginResult) -> Self {
        let out_of_sample = rolling.summary();
        Self {
            spec: *model.spec(),
            criteria: InformationCriteria::of(model),
            rolling,
            out_of_sample,
        }
    }
}

/// Result of comparing candidates
#[derive(Debug, Clone, Serialize)]
pub struct Selection {
    /// Index of the candidate with the lowest out-of-sample mean absolute error
    pub most_accurate: usize,
    /// Index of the chosen candidate
    pub selected: usize,
    /// Test of each candidate against the most accurate one (`None` for the
    /// most accurate itself and where the test could not be computed)
    pub tests: Vec<Option<DieboldMariano>>,
    /// Candidates whose accuracy is indistinguishable from the most accurate
    pub indistinguishable: Vec<usize>,
}

/// Choose among scored candidates.
///
/// The most accurate candidate out of sample is compared with every other
/// one by a Diebold–Mariano test with absolute-error loss. Among it and the
/// rivals it cannot be told apart from at `alpha`, the candidate with the
/// fewest parameters wins, with ties going to the lower AIC.
pub fn select_model(candidates: &[CandidateScore], alpha: f64) -> Result<Selection> {
    let most_accurate = candidates
        .iter()
        .enumerate()
        .filter(|(_, c)| c.out_of_sample.is_available())
        .min_by(|(_, a), (_, b)| a.out_of_sample.mean.total_cmp(&b.out_of_sample.mean))
        .map(|(i, _)| i)
        .ok_or_else(|| {
            ForecastError::NonConvergence(
                "No candidate produced out-of-sample forecasts".to_string(),
            )
        })?;

    let best = &candidates[most_accurate];
    let mut tests = Vec::with_capacity(candidates.len());
    let mut indistinguishable = Vec::new();
    for (i, candidate) in candidates.iter().enumerate() {
        if i == most_accurate {
            tests.push(None);
            continue;
        }
        let test = match diebold_mariano(
            &best.rolling.errors,
            &candidate.rolling.errors,
            best.rolling.horizon,
            1,
        ) {
            Ok(test) => Some(test),
            Err(e) => {
                warn!(model = %candidate.spec, error = %e, "Diebold-Mariano test unavailable");
                None
            }
        };
        if test.map_or(false, |t| !t.rejects_equal_accuracy(alpha)) {
            indistinguishable.push(i);
        }
        tests.push(test);
    }

    let selected = std::iter::once(most_accurate)
        .chain(indistinguishable.iter().copied())
        .min_by(|&a, &b| {
            let (ca, cb) = (&candidates[a].criteria, &candidates[b].criteria);
            ca.n_params
                .cmp(&cb.n_params)
                .then(ca.aic.total_cmp(&cb.aic))
        })
        .unwrap_or(most_accurate);

    info!(
        most_accurate = %candidates[most_accurate].spec,
        selected = %candidates[selected].spec,
        "model selected"
    );

    Ok(Selection {
        most_accurate,
        selected,
        tests,
        indistinguishable,
    })
}
