//! Pipeline configuration
//!
//! Every field has a default, so a JSON file only needs the values that
//! differ. Command-line flags are applied on top by the binary.

use crate::error::{ForecastError, Result};
use crate::evaluation::{DEFAULT_EVALUATION_HORIZON, DEFAULT_ORIGIN_FRACTION};
use crate::forecast::DEFAULT_ALPHA;
use crate::models::{ModelSpec, SearchBounds};
use crate::series::{Frequency, Period, Window};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Settings for one run of the pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Price file to read
    pub input: PathBuf,
    /// Date column name, detected when unset
    pub date_column: Option<String>,
    /// Price column name, detected when unset
    pub price_column: Option<String>,
    /// Frequency of the constructed series
    pub frequency: Frequency,
    /// First period of the series, e.g. `2005-01`
    pub start: Option<String>,
    /// Last period of the series
    pub end: Option<String>,
    /// Later start used for modelling, obtained by truncating the series
    pub analysis_start: Option<String>,
    /// Seasonal period used by the order search
    pub seasonal_period: usize,
    /// Candidate models to compare
    pub candidates: Vec<ModelSpec>,
    /// Order search whose best models are added to the candidates
    pub search: Option<SearchBounds>,
    /// Number of best search results added as candidates
    pub search_top: usize,
    /// Periods to forecast
    pub forecast_horizon: usize,
    /// Horizon of the rolling-origin errors
    pub evaluation_horizon: usize,
    /// Share of the series before the first forecast origin
    pub origin_fraction: f64,
    /// Significance level of intervals and tests
    pub alpha: f64,
    /// Largest lag in the correlogram
    pub max_lag: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("prices.csv"),
            date_column: None,
            price_column: None,
            frequency: Frequency::Monthly,
            start: None,
            end: None,
            analysis_start: None,
            seasonal_period: 12,
            candidates: vec![
                ModelSpec::arima(1, 1, 0),
                ModelSpec::arima(0, 1, 1),
                ModelSpec::arima(1, 1, 1).with_seasonal(0, 0, 3, 12),
            ],
            search: None,
            search_top: 3,
            forecast_horizon: 3,
            evaluation_horizon: DEFAULT_EVALUATION_HORIZON,
            origin_fraction: DEFAULT_ORIGIN_FRACTION,
            alpha: DEFAULT_ALPHA,
            max_lag: 36,
        }
    }
}

impl PipelineConfig {
    /// Read and validate a JSON configuration file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the settings are usable
    pub fn validate(&self) -> Result<()> {
        if self.candidates.is_empty() && self.search.is_none() {
            return Err(ForecastError::InvalidSpec(
                "No candidate models and no order search configured".to_string(),
            ));
        }
        for spec in &self.candidates {
            spec.validate()?;
        }
        if self.forecast_horizon == 0 || self.evaluation_horizon == 0 {
            return Err(ForecastError::InvalidSpec(
                "Forecast and evaluation horizons must be at least 1".to_string(),
            ));
        }
        if !(self.origin_fraction > 0.0 && self.origin_fraction < 1.0) {
            return Err(ForecastError::InvalidSpec(format!(
                "Origin fraction must be in (0, 1), got {}",
                self.origin_fraction
            )));
        }
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(ForecastError::InvalidSpec(format!(
                "Significance level must be in (0, 1), got {}",
                self.alpha
            )));
        }
        if self.max_lag == 0 {
            return Err(ForecastError::InvalidSpec(
                "Maximum correlogram lag must be at least 1".to_string(),
            ));
        }
        self.window()?;
        self.analysis_start_period()?;
        Ok(())
    }

    /// Window of periods to build the series from
    pub fn window(&self) -> Result<Window> {
        Ok(Window {
            start: self.parse_period(self.start.as_deref())?,
            end: self.parse_period(self.end.as_deref())?,
        })
    }

    /// Period the modelling series is truncated to
    pub fn analysis_start_period(&self) -> Result<Option<Period>> {
        self.parse_period(self.analysis_start.as_deref())
    }

    fn parse_period(&self, text: Option<&str>) -> Result<Option<Period>> {
        text.map(|t| Period::parse(t, self.frequency)).transpose()
    }
}
