//! End-to-end run: load, construct, transform, diagnose, fit, compare, forecast

use crate::config::PipelineConfig;
use crate::data::{DataLoader, RawRecord};
use crate::diagnostics::{default_lags, white_noise_test, Correlogram};
use crate::error::{ForecastError, Result};
use crate::evaluation::{select_model, CandidateScore, RollingOrigin};
use crate::forecast::Forecaster;
use crate::models::{
    grid_search, shared_conditioning, FittedModel, ModelSpec, SarmaFitter, SearchBounds,
};
use crate::report::{CandidateReport, DiagnosticsSummary, InputSummary, Report};
use crate::series::TimeSeries;
use crate::transform::{difference, log_transform, TransformedSeries};
use tracing::info;

/// Runs the configured analysis
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
    fitter: SarmaFitter,
}

impl Pipeline {
    /// Pipeline for a validated configuration
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            fitter: SarmaFitter::new(),
        })
    }

    /// Use a custom fitter for every estimation
    pub fn with_fitter(mut self, fitter: SarmaFitter) -> Self {
        self.fitter = fitter;
        self
    }

    /// Configuration in use
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Read the configured input file
    pub fn load(&self) -> Result<Vec<RawRecord>> {
        let loader = match (&self.config.date_column, &self.config.price_column) {
            (Some(date), Some(price)) => DataLoader::with_columns(date.clone(), price.clone()),
            (None, None) => DataLoader::new(),
            _ => {
                return Err(ForecastError::InvalidSpec(
                    "Date and price column names must be given together".to_string(),
                ))
            }
        };
        info!(path = %self.config.input.display(), "loading prices");
        loader.load(&self.config.input)
    }

    /// Log-price series to model, after windowing and truncation
    pub fn prepare(&self, records: &[RawRecord]) -> Result<TransformedSeries> {
        let mut series = TimeSeries::from_records(records, self.config.frequency, self.config.window()?)?;
        if let Some(start) = self.config.analysis_start_period()? {
            series = series.truncate_start(start)?;
        }
        log_transform(&series.into())
    }

    /// Correlogram and white-noise test of the log returns
    pub fn diagnose(&self, logged: &TransformedSeries) -> Result<DiagnosticsSummary> {
        let returns = difference(logged, 1)?;
        let max_lag = self.config.max_lag.min(returns.len().saturating_sub(2));
        let correlogram = Correlogram::compute(returns.values(), max_lag)?;
        let white_noise = white_noise_test(returns.values())?;
        info!(
            acf = ?correlogram.significant_acf_lags(),
            pacf = ?correlogram.significant_pacf_lags(),
            p_value = white_noise.p_value,
            "diagnostics of log returns"
        );
        Ok(DiagnosticsSummary::new(returns.describe(), correlogram, white_noise))
    }

    /// Configured candidates plus the best models of the order search
    pub fn candidates(&self, logged: &TransformedSeries) -> Result<Vec<ModelSpec>> {
        let mut specs = self.config.candidates.clone();
        if let Some(bounds) = &self.config.search {
            let bounds = SearchBounds {
                period: if bounds.period == 0 {
                    self.config.seasonal_period
                } else {
                    bounds.period
                },
                ..*bounds
            };
            let ranked = grid_search(logged, &bounds, &self.fitter)?;
            for result in ranked.into_iter().take(self.config.search_top) {
                if !specs.contains(&result.spec) {
                    specs.push(result.spec);
                }
            }
        }
        Ok(specs)
    }

    /// Load the input and run every stage
    pub fn run(&self) -> Result<Report> {
        let records = self.load()?;
        self.run_records(&records)
    }

    /// Run every stage on records already in memory
    pub fn run_records(&self, records: &[RawRecord]) -> Result<Report> {
        let logged = self.prepare(records)?;
        let series = logged.series();
        let (start, end) = match series.end() {
            Some(end) => (series.start(), end),
            None => {
                return Err(ForecastError::InsufficientData(
                    "Modelled series is empty".to_string(),
                ))
            }
        };
        info!(start = %start, end = %end, observations = logged.len(), "series prepared");

        let diagnostics = self.diagnose(&logged)?;
        let specs = self.candidates(&logged)?;

        let rolling = RollingOrigin::new(self.config.evaluation_horizon, self.config.origin_fraction)?
            .with_fitter(self.fitter.clone());
        // Full-sample fits share one likelihood sample so AIC and BIC compare
        let span = shared_conditioning(&specs).max(self.fitter.conditioning());
        let full_sample = self.fitter.clone().with_conditioning(span);
        let mut models: Vec<FittedModel> = Vec::with_capacity(specs.len());
        let mut scores = Vec::with_capacity(specs.len());
        for spec in &specs {
            let model = full_sample.fit(&logged, spec)?;
            info!(
                model = %spec,
                aic = model.aic(),
                bic = model.bic(),
                n_obs = model.n_obs(),
                iterations = model.iterations(),
                "candidate fitted"
            );
            let errors = rolling.evaluate(&logged, spec)?;
            scores.push(CandidateScore::new(&model, errors));
            models.push(model);
        }

        let selection = select_model(&scores, self.config.alpha)?;
        let chosen = &models[selection.selected];

        let residual_lags = default_lags(chosen.n_obs()).max(chosen.spec().arma_params() + 1);
        let residual_test = chosen.residual_test(residual_lags)?;

        let forecaster = Forecaster::new(self.config.alpha)?;
        let forecast = forecaster.forecast(chosen, self.config.forecast_horizon)?;
        let prices = forecaster.to_price_scale(&forecast)?;
        info!(model = %chosen.spec(), horizon = self.config.forecast_horizon, "forecast complete");

        let candidates = scores
            .iter()
            .enumerate()
            .map(|(i, score)| CandidateReport {
                label: score.spec.to_string(),
                spec: score.spec,
                criteria: score.criteria,
                out_of_sample: score.out_of_sample,
                diebold_mariano: selection.tests[i],
                indistinguishable: selection.indistinguishable.contains(&i),
            })
            .collect();

        Ok(Report {
            input: InputSummary {
                source: self.config.input.display().to_string(),
                frequency: series.frequency(),
                start,
                end,
                observations: logged.len(),
                transform: logged.describe(),
            },
            diagnostics,
            evaluation_horizon: self.config.evaluation_horizon,
            candidates,
            most_accurate: scores[selection.most_accurate].spec.to_string(),
            selected: *chosen.spec(),
            selected_label: chosen.spec().to_string(),
            coefficients: chosen.coefficients(),
            sigma2: chosen.sigma2(),
            residual_test,
            forecast: prices,
        })
    }
}
