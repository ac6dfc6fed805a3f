//! Order selection by information criterion over a grid of candidates

use super::{ModelSpec, SarmaFitter};
use crate::error::{ForecastError, Result};
use crate::transform::TransformedSeries;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Ranges of orders explored by [`grid_search`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchBounds {
    /// Largest non-seasonal AR order
    pub max_p: usize,
    /// Largest non-seasonal MA order
    pub max_q: usize,
    /// Largest seasonal AR order
    pub max_seasonal_p: usize,
    /// Largest seasonal MA order
    pub max_seasonal_q: usize,
    /// Fixed non-seasonal differencing order
    pub d: usize,
    /// Fixed seasonal differencing order
    pub seasonal_d: usize,
    /// Seasonal period; seasonal orders are only explored when at least 2
    pub period: usize,
}

impl Default for SearchBounds {
    fn default() -> Self {
        Self {
            max_p: 2,
            max_q: 2,
            max_seasonal_p: 1,
            max_seasonal_q: 1,
            d: 0,
            seasonal_d: 0,
            period: 12,
        }
    }
}

impl SearchBounds {
    /// Every model spec inside the bounds
    pub fn candidates(&self) -> Vec<ModelSpec> {
        let (max_sp, max_sq) = if self.period >= 2 {
            (self.max_seasonal_p, self.max_seasonal_q)
        } else {
            (0, 0)
        };
        let seasonal_d = if self.period >= 2 { self.seasonal_d } else { 0 };

        let mut specs = Vec::new();
        for p in 0..=self.max_p {
            for q in 0..=self.max_q {
                for sp in 0..=max_sp {
                    for sq in 0..=max_sq {
                        let spec = ModelSpec::arima(p, self.d, q);
                        // Keep non-seasonal candidates equal to their plain ARIMA spec
                        specs.push(if sp + seasonal_d + sq > 0 {
                            spec.with_seasonal(sp, seasonal_d, sq, self.period)
                        } else {
                            spec
                        });
                    }
                }
            }
        }
        specs
    }
}

/// A candidate that was fit successfully
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    /// Orders of the candidate
    pub spec: ModelSpec,
    /// Akaike information criterion
    pub aic: f64,
    /// Bayesian information criterion
    pub bic: f64,
    /// Observations entering the likelihood, equal across one search
    pub n_obs: usize,
}

/// Largest [`ModelSpec::conditioning_span`] among `specs`.
///
/// Fitting every spec with [`SarmaFitter::with_conditioning`] at this span
/// scores them all on the same observations.
pub fn shared_conditioning(specs: &[ModelSpec]) -> usize {
    specs
        .iter()
        .map(ModelSpec::conditioning_span)
        .max()
        .unwrap_or(0)
}

/// Fit every candidate within `bounds` and rank them by AIC (ascending).
///
/// Candidates that fail to converge or that the series is too short for
/// are skipped. Fails if no candidate could be fit.
pub fn grid_search(
    series: &TransformedSeries,
    bounds: &SearchBounds,
    fitter: &SarmaFitter,
) -> Result<Vec<SearchResult>> {
    let candidates = bounds.candidates();
    let span = shared_conditioning(&candidates).max(fitter.conditioning());
    let fitter = fitter.clone().without_std_errors().with_conditioning(span);
    let mut results = Vec::with_capacity(candidates.len());

    for spec in candidates {
        match fitter.fit(series, &spec) {
            Ok(model) => results.push(SearchResult {
                spec,
                aic: model.aic(),
                bic: model.bic(),
                n_obs: model.n_obs(),
            }),
            Err(e @ (ForecastError::NonConvergence(_) | ForecastError::InvalidSpec(_))) => {
                debug!(model = %spec, error = %e, "skipping candidate");
            }
            Err(e) => return Err(e),
        }
    }

    if results.is_empty() {
        return Err(ForecastError::NonConvergence(
            "No candidate model could be fit".to_string(),
        ));
    }

    results.sort_by(|a, b| a.aic.total_cmp(&b.aic));
    info!(
        candidates = results.len(),
        best = %results[0].spec,
        aic = results[0].aic,
        "order search complete"
    );
    Ok(results)
}
