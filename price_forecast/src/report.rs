//! Run report and its renderers

use crate::diagnostics::{Correlogram, LjungBoxResult, WHITE_NOISE_ALPHA};
use crate::error::Result;
use crate::evaluation::{DieboldMariano, InformationCriteria};
use crate::forecast::PriceForecast;
use crate::metrics::ErrorSummary;
use crate::models::{Coefficient, ModelSpec};
use crate::series::{Frequency, Period};
use serde::Serialize;
use std::fmt::{self, Write as _};

/// Where the modelled series came from
#[derive(Debug, Clone, Serialize)]
pub struct InputSummary {
    /// Input file
    pub source: String,
    /// Series frequency
    pub frequency: Frequency,
    /// First period modelled
    pub start: Period,
    /// Last period modelled
    pub end: Period,
    /// Observations modelled
    pub observations: usize,
    /// Transform chain applied before modelling
    pub transform: String,
}

/// Correlation structure of a series
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticsSummary {
    /// Transform chain of the inspected series
    pub series: String,
    /// Length of the inspected series
    pub observations: usize,
    /// Half-width of the significance band
    pub band: f64,
    /// Lags with significant autocorrelation
    pub significant_acf_lags: Vec<usize>,
    /// Lags with significant partial autocorrelation
    pub significant_pacf_lags: Vec<usize>,
    /// Full correlogram
    pub correlogram: Correlogram,
    /// Ljung–Box test of the series
    pub white_noise: LjungBoxResult,
}

impl DiagnosticsSummary {
    /// Summarise a correlogram and white-noise test of the series described by `series`
    pub fn new(series: impl Into<String>, correlogram: Correlogram, white_noise: LjungBoxResult) -> Self {
        Self {
            series: series.into(),
            observations: correlogram.n,
            band: correlogram.band,
            significant_acf_lags: correlogram.significant_acf_lags(),
            significant_pacf_lags: correlogram.significant_pacf_lags(),
            correlogram,
            white_noise,
        }
    }
}

impl fmt::Display for DiagnosticsSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Diagnostics of {} (n = {}):", self.series, self.observations)?;
        writeln!(f, "  Band:        ±{:.4}", self.band)?;
        writeln!(f, "  ACF lags:    {}", join_lags(&self.significant_acf_lags))?;
        writeln!(f, "  PACF lags:   {}", join_lags(&self.significant_pacf_lags))?;
        writeln!(
            f,
            "  Ljung-Box:   Q = {:.3}, df = {}, p = {:.4} ({})",
            self.white_noise.statistic,
            self.white_noise.df,
            self.white_noise.p_value,
            if self.white_noise.is_white_noise(WHITE_NOISE_ALPHA) {
                "white noise"
            } else {
                "autocorrelated"
            }
        )
    }
}

fn join_lags(lags: &[usize]) -> String {
    if lags.is_empty() {
        return "none".to_string();
    }
    lags.iter()
        .map(|l| l.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Comparison figures of one candidate
#[derive(Debug, Clone, Serialize)]
pub struct CandidateReport {
    /// Model label, e.g. `SARIMA(1,1,1)(0,0,3)[12]`
    pub label: String,
    /// Orders
    pub spec: ModelSpec,
    /// In-sample criteria
    pub criteria: InformationCriteria,
    /// Rolling-origin absolute errors
    pub out_of_sample: ErrorSummary,
    /// Test against the most accurate candidate
    pub diebold_mariano: Option<DieboldMariano>,
    /// Whether accuracy is indistinguishable from the most accurate candidate
    pub indistinguishable: bool,
}

/// Everything a run produced
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    /// Input series
    pub input: InputSummary,
    /// Correlation diagnostics of the returns
    pub diagnostics: DiagnosticsSummary,
    /// Horizon of the out-of-sample errors
    pub evaluation_horizon: usize,
    /// Candidate comparison
    pub candidates: Vec<CandidateReport>,
    /// Candidate with the lowest out-of-sample mean absolute error
    pub most_accurate: String,
    /// Chosen model
    pub selected: ModelSpec,
    /// Label of the chosen model
    pub selected_label: String,
    /// Coefficients of the chosen model
    pub coefficients: Vec<Coefficient>,
    /// Innovation variance of the chosen model
    pub sigma2: f64,
    /// Ljung–Box test of the chosen model's residuals
    pub residual_test: LjungBoxResult,
    /// Forecast in price units
    pub forecast: PriceForecast,
}

/// Turns a report into text for output
pub trait ReportRenderer {
    /// Render `report`
    fn render(&self, report: &Report) -> Result<String>;
}

/// Human-readable tables
#[derive(Debug, Clone, Copy, Default)]
pub struct TextRenderer;

/// JSON document
#[derive(Debug, Clone, Copy)]
pub struct JsonRenderer {
    /// Indent the output
    pub pretty: bool,
}

impl Default for JsonRenderer {
    fn default() -> Self {
        Self { pretty: true }
    }
}

impl ReportRenderer for JsonRenderer {
    fn render(&self, report: &Report) -> Result<String> {
        let json = if self.pretty {
            serde_json::to_string_pretty(report)?
        } else {
            serde_json::to_string(report)?
        };
        Ok(json)
    }
}

impl ReportRenderer for TextRenderer {
    fn render(&self, report: &Report) -> Result<String> {
        let mut out = String::new();
        write_text(&mut out, report).map_err(|e| {
            crate::error::ForecastError::InvalidSpec(format!("Cannot format report: {}", e))
        })?;
        Ok(out)
    }
}

fn write_text(out: &mut String, report: &Report) -> fmt::Result {
    let input = &report.input;
    writeln!(out, "Input:")?;
    writeln!(out, "  Source:      {}", input.source)?;
    writeln!(
        out,
        "  Series:      {} {}..{} ({} observations)",
        input.frequency, input.start, input.end, input.observations
    )?;
    writeln!(out, "  Transform:   {}", input.transform)?;
    writeln!(out)?;

    write!(out, "{}", report.diagnostics)?;
    writeln!(out)?;

    writeln!(
        out,
        "Candidates (out-of-sample absolute errors at horizon {}):",
        report.evaluation_horizon
    )?;
    writeln!(
        out,
        "  {:<28} {:>10} {:>10} {:>9} {:>9} {:>9} {:>8}",
        "model", "AIC", "BIC", "mean", "median", "max", "DM p"
    )?;
    for c in &report.candidates {
        let dm = c
            .diebold_mariano
            .map(|t| format!("{:.4}", t.p_value))
            .unwrap_or_else(|| "-".to_string());
        writeln!(
            out,
            "  {:<28} {:>10.2} {:>10.2} {:>9.4} {:>9.4} {:>9.4} {:>8}{}",
            c.label,
            c.criteria.aic,
            c.criteria.bic,
            c.out_of_sample.mean,
            c.out_of_sample.median,
            c.out_of_sample.max,
            dm,
            if c.out_of_sample.missing > 0 {
                format!("  ({} missing)", c.out_of_sample.missing)
            } else {
                String::new()
            }
        )?;
    }
    writeln!(out, "  Most accurate: {}", report.most_accurate)?;
    writeln!(out, "  Selected:      {}", report.selected_label)?;
    writeln!(out)?;

    writeln!(out, "Coefficients of {}:", report.selected_label)?;
    for c in &report.coefficients {
        writeln!(
            out,
            "  {:<10} {:>10.4} (se {:.4}, t {:.2}){}",
            c.name,
            c.value,
            c.std_error,
            c.t_ratio(),
            if c.is_significant() { " *" } else { "" }
        )?;
    }
    writeln!(out, "  sigma2     {:>10.6}", report.sigma2)?;
    writeln!(
        out,
        "  Residual Ljung-Box: Q = {:.3}, df = {}, p = {:.4}",
        report.residual_test.statistic, report.residual_test.df, report.residual_test.p_value
    )?;
    writeln!(out)?;

    writeln!(
        out,
        "Forecast ({:.0}% intervals):",
        (1.0 - report.forecast.alpha) * 100.0
    )?;
    for p in &report.forecast.points {
        writeln!(
            out,
            "  {}  {:>10.2}  [{:.2}, {:.2}]",
            p.period, p.point, p.lower, p.upper
        )?;
    }
    Ok(())
}
