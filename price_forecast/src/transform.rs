//! Variance- and trend-stabilizing transforms with recorded provenance
//!
//! Every operation returns a new [`TransformedSeries`]; the input is never
//! modified. The applied operators are kept in order so results can be
//! mapped back, e.g. exponentiating to undo [`log_transform`].

use crate::error::{ForecastError, Result};
use crate::series::TimeSeries;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One step of a transform chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransformOp {
    /// Pointwise natural logarithm
    Log,
    /// Difference at the given lag
    Difference(usize),
}

impl fmt::Display for TransformOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransformOp::Log => write!(f, "log"),
            TransformOp::Difference(lag) => write!(f, "diff({})", lag),
        }
    }
}

/// A series together with the operators that produced it from its parent
#[derive(Debug, Clone, PartialEq)]
pub struct TransformedSeries {
    series: TimeSeries,
    ops: Vec<TransformOp>,
}

impl From<TimeSeries> for TransformedSeries {
    fn from(series: TimeSeries) -> Self {
        Self {
            series,
            ops: Vec::new(),
        }
    }
}

impl TransformedSeries {
    /// The derived series
    pub fn series(&self) -> &TimeSeries {
        &self.series
    }

    /// Observations of the derived series
    pub fn values(&self) -> &[f64] {
        self.series.values()
    }

    /// Number of observations
    pub fn len(&self) -> usize {
        self.series.len()
    }

    /// Check if the derived series is empty
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Operators applied so far, oldest first
    pub fn ops(&self) -> &[TransformOp] {
        &self.ops
    }

    /// Whether the chain contains a log step
    pub fn is_logged(&self) -> bool {
        self.ops.contains(&TransformOp::Log)
    }

    /// Human-readable chain, e.g. `log -> diff(1) -> diff(12)`
    pub fn describe(&self) -> String {
        if self.ops.is_empty() {
            return "identity".to_string();
        }
        self.ops
            .iter()
            .map(|op| op.to_string())
            .collect::<Vec<_>>()
            .join(" -> ")
    }

    /// Map values from the scale of this series back through a trailing log.
    ///
    /// Only the log step is inverted; a chain containing differences has no
    /// pointwise inverse and is rejected.
    pub fn invert_log(&self, values: &[f64]) -> Result<Vec<f64>> {
        match self.ops.as_slice() {
            [] => Ok(values.to_vec()),
            [TransformOp::Log] => Ok(values.iter().map(|v| v.exp()).collect()),
            _ => Err(ForecastError::InvalidSpec(format!(
                "Cannot invert transform chain '{}' pointwise",
                self.describe()
            ))),
        }
    }

    /// The first `len` observations, keeping the recorded operators
    pub fn head(&self, len: usize) -> Result<Self> {
        Ok(Self {
            series: self.series.head(len)?,
            ops: self.ops.clone(),
        })
    }

    fn push(&self, series: TimeSeries, op: TransformOp) -> Self {
        let mut ops = self.ops.clone();
        ops.push(op);
        Self { series, ops }
    }
}

/// Pointwise natural logarithm.
///
/// Fails with a domain error if any observation is not strictly positive.
pub fn log_transform(input: &TransformedSeries) -> Result<TransformedSeries> {
    if let Some((i, v)) = input.values().iter().enumerate().find(|(_, v)| v.is_nan() || **v <= 0.0) {
        return Err(ForecastError::Domain(format!(
            "Cannot take the log of {} at period {}",
            v,
            input.series().period_at(i)
        )));
    }

    let values = input.values().iter().map(|v| v.ln()).collect();
    let series = input.series().derive(values, input.series().start());
    Ok(input.push(series, TransformOp::Log))
}

/// Lag-`lag` difference: `out[i] = in[i + lag] - in[i]`.
///
/// The output is `lag` observations shorter and starts `lag` periods later.
pub fn difference(input: &TransformedSeries, lag: usize) -> Result<TransformedSeries> {
    if lag == 0 {
        return Err(ForecastError::InvalidSpec(
            "Difference lag must be at least 1".to_string(),
        ));
    }
    if lag >= input.len() {
        return Err(ForecastError::InsufficientData(format!(
            "Cannot difference at lag {} a series of length {}",
            lag,
            input.len()
        )));
    }

    let values = difference_values(input.values(), lag);
    let start = input.series().start().offset(lag as i64);
    let series = input.series().derive(values, start);
    Ok(input.push(series, TransformOp::Difference(lag)))
}

/// Seasonal difference, i.e. [`difference`] at the seasonal period
pub fn seasonal_difference(input: &TransformedSeries, period: usize) -> Result<TransformedSeries> {
    difference(input, period)
}

/// Apply `d` ordinary and `seasonal_d` seasonal differences
pub fn difference_orders(
    input: &TransformedSeries,
    d: usize,
    seasonal_d: usize,
    period: usize,
) -> Result<TransformedSeries> {
    let mut out = input.clone();
    for _ in 0..d {
        out = difference(&out, 1)?;
    }
    for _ in 0..seasonal_d {
        out = seasonal_difference(&out, period)?;
    }
    Ok(out)
}

/// Raw lag difference on a slice
pub(crate) fn difference_values(values: &[f64], lag: usize) -> Vec<f64> {
    values
        .iter()
        .skip(lag)
        .zip(values.iter())
        .map(|(later, earlier)| later - earlier)
        .collect()
}
