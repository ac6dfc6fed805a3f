//! Fixed-frequency time series built from raw price records

use crate::data::RawRecord;
use crate::error::{ForecastError, Result};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Sampling frequency of a series
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    /// Twelve observations per year
    Monthly,
    /// Four observations per year
    Quarterly,
    /// One observation per year
    Annual,
}

impl Frequency {
    /// Observations per year
    pub fn periods_per_year(self) -> u32 {
        match self {
            Frequency::Monthly => 12,
            Frequency::Quarterly => 4,
            Frequency::Annual => 1,
        }
    }

    /// Period containing a calendar date
    pub fn period_of(self, date: NaiveDate) -> Period {
        let months_per_period = 12 / self.periods_per_year();
        Period {
            year: date.year(),
            index: date.month0() / months_per_period + 1,
            frequency: self,
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Frequency::Monthly => write!(f, "monthly"),
            Frequency::Quarterly => write!(f, "quarterly"),
            Frequency::Annual => write!(f, "annual"),
        }
    }
}

/// One period of a fixed-frequency calendar, e.g. March 2020 or 2020Q1
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Period {
    year: i32,
    /// 1-based position within the year
    index: u32,
    frequency: Frequency,
}

impl Period {
    /// Create a period, validating the within-year index
    pub fn new(year: i32, index: u32, frequency: Frequency) -> Result<Self> {
        if index == 0 || index > frequency.periods_per_year() {
            return Err(ForecastError::InvalidSpec(format!(
                "Period index {} is out of range for {} data",
                index, frequency
            )));
        }
        Ok(Self {
            year,
            index,
            frequency,
        })
    }

    /// Monthly period
    pub fn month(year: i32, month: u32) -> Result<Self> {
        Self::new(year, month, Frequency::Monthly)
    }

    /// Parse `YYYY-MM` (monthly), `YYYYQn` (quarterly) or `YYYY` (annual)
    pub fn parse(text: &str, frequency: Frequency) -> Result<Self> {
        let text = text.trim();
        let invalid = || {
            ForecastError::InvalidSpec(format!("Cannot parse '{}' as a {} period", text, frequency))
        };

        let (year, index) = match frequency {
            Frequency::Monthly => {
                let (y, m) = text.split_once('-').ok_or_else(invalid)?;
                (y.parse().map_err(|_| invalid())?, m.parse().map_err(|_| invalid())?)
            }
            Frequency::Quarterly => {
                let upper = text.to_uppercase();
                let (y, q) = upper.split_once('Q').ok_or_else(invalid)?;
                (y.parse().map_err(|_| invalid())?, q.parse().map_err(|_| invalid())?)
            }
            Frequency::Annual => (text.parse().map_err(|_| invalid())?, 1),
        };

        Self::new(year, index, frequency)
    }

    /// Calendar year
    pub fn year(&self) -> i32 {
        self.year
    }

    /// 1-based position within the year
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Frequency of the calendar this period belongs to
    pub fn frequency(&self) -> Frequency {
        self.frequency
    }

    /// First calendar day of the period
    pub fn first_day(&self) -> Option<NaiveDate> {
        let months_per_period = 12 / self.frequency.periods_per_year();
        NaiveDate::from_ymd_opt(self.year, (self.index - 1) * months_per_period + 1, 1)
    }

    /// Number of periods since year 0
    pub fn ordinal(&self) -> i64 {
        self.year as i64 * self.frequency.periods_per_year() as i64 + (self.index as i64 - 1)
    }

    fn from_ordinal(ordinal: i64, frequency: Frequency) -> Self {
        let ppy = frequency.periods_per_year() as i64;
        Self {
            year: ordinal.div_euclid(ppy) as i32,
            index: ordinal.rem_euclid(ppy) as u32 + 1,
            frequency,
        }
    }

    /// The period `steps` periods later (earlier when negative)
    pub fn offset(&self, steps: i64) -> Self {
        Self::from_ordinal(self.ordinal() + steps, self.frequency)
    }

    /// Signed number of periods from `self` to `other`
    pub fn periods_until(&self, other: &Period) -> i64 {
        other.ordinal() - self.ordinal()
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.frequency {
            Frequency::Monthly => write!(f, "{:04}-{:02}", self.year, self.index),
            Frequency::Quarterly => write!(f, "{:04}Q{}", self.year, self.index),
            Frequency::Annual => write!(f, "{:04}", self.year),
        }
    }
}

/// Inclusive range of periods to keep when building a series.
///
/// An open bound defaults to the corresponding end of the available data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Window {
    /// First period to keep
    pub start: Option<Period>,
    /// Last period to keep
    pub end: Option<Period>,
}

impl Window {
    /// Window covering all available data
    pub fn all() -> Self {
        Self::default()
    }

    /// Window between two periods
    pub fn between(start: Period, end: Period) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }
}

/// Equally spaced observations in chronological order, without gaps
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    values: Vec<f64>,
    start: Period,
}

impl TimeSeries {
    /// Create a series whose first observation falls in `start`
    pub fn new(values: Vec<f64>, start: Period) -> Self {
        Self { values, start }
    }

    /// Build a series with one observation per period from raw records.
    ///
    /// Records in descending date order are reversed first. When several
    /// records fall into one period the chronologically last one is kept.
    pub fn from_records(records: &[RawRecord], frequency: Frequency, window: Window) -> Result<Self> {
        if records.is_empty() {
            return Err(ForecastError::InsufficientData(
                "No records to build a series from".to_string(),
            ));
        }

        let mut ordered = records.to_vec();
        if ordered.len() > 1 && ordered[0].date > ordered[ordered.len() - 1].date {
            ordered.reverse();
        }
        if let Some(pair) = ordered.windows(2).find(|w| w[0].date > w[1].date) {
            return Err(ForecastError::DataFormat(format!(
                "Dates are not in chronological order ({} is followed by {})",
                pair[0].date, pair[1].date
            )));
        }

        // Collapse to one observation per period, last record wins
        let mut collapsed: Vec<(Period, f64)> = Vec::new();
        for record in &ordered {
            let period = frequency.period_of(record.date);
            match collapsed.last_mut() {
                Some(last) if last.0 == period => last.1 = record.price,
                _ => collapsed.push((period, record.price)),
            }
        }

        let first = collapsed[0].0;
        let last = collapsed[collapsed.len() - 1].0;
        let start = window.start.unwrap_or(first);
        let end = window.end.unwrap_or(last);

        for bound in [start, end] {
            if bound.frequency() != frequency {
                return Err(ForecastError::InvalidSpec(format!(
                    "Window bound {} does not match {} frequency",
                    bound, frequency
                )));
            }
        }
        if start > end {
            return Err(ForecastError::InvalidSpec(format!(
                "Window start {} is after window end {}",
                start, end
            )));
        }
        if start < first || end > last {
            return Err(ForecastError::InsufficientData(format!(
                "Requested window {}..{} is not covered by data spanning {}..{}",
                start, end, first, last
            )));
        }

        let mut values = Vec::with_capacity(start.periods_until(&end) as usize + 1);
        let mut expected = start;
        for (period, price) in collapsed.iter().filter(|(p, _)| *p >= start && *p <= end) {
            if *period != expected {
                return Err(ForecastError::InsufficientData(format!(
                    "Missing observation for period {}",
                    expected
                )));
            }
            values.push(*price);
            expected = expected.offset(1);
        }
        // Trailing periods of the window with no record
        if expected <= end {
            return Err(ForecastError::InsufficientData(format!(
                "Missing observation for period {}",
                expected
            )));
        }

        debug!(
            start = %start,
            end = %end,
            observations = values.len(),
            "constructed {} series",
            frequency
        );

        Ok(Self { values, start })
    }

    /// Observations in chronological order
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of observations
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the series is empty
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Sampling frequency
    pub fn frequency(&self) -> Frequency {
        self.start.frequency()
    }

    /// Period of the first observation
    pub fn start(&self) -> Period {
        self.start
    }

    /// Period of the last observation, `None` for an empty series
    pub fn end(&self) -> Option<Period> {
        if self.values.is_empty() {
            None
        } else {
            Some(self.period_at(self.values.len() - 1))
        }
    }

    /// Period of the observation at `index`
    pub fn period_at(&self, index: usize) -> Period {
        self.start.offset(index as i64)
    }

    /// Same calendar, new observations starting at `start`
    pub(crate) fn derive(&self, values: Vec<f64>, start: Period) -> Self {
        Self { values, start }
    }

    /// Sub-window starting at `period`, obtained by dropping earlier observations
    pub fn truncate_start(&self, period: Period) -> Result<Self> {
        if period.frequency() != self.frequency() {
            return Err(ForecastError::InvalidSpec(format!(
                "Period {} does not match {} frequency",
                period,
                self.frequency()
            )));
        }
        let skip = self.start.periods_until(&period);
        if skip < 0 || skip as usize >= self.values.len() {
            return Err(ForecastError::InsufficientData(format!(
                "Series spanning {}..{} does not contain {}",
                self.start,
                self.end().map(|p| p.to_string()).unwrap_or_default(),
                period
            )));
        }
        let skip = skip as usize;
        Ok(self.derive(self.values[skip..].to_vec(), period))
    }

    /// The first `len` observations
    pub fn head(&self, len: usize) -> Result<Self> {
        if len > self.values.len() {
            return Err(ForecastError::InsufficientData(format!(
                "Cannot take {} observations from a series of length {}",
                len,
                self.values.len()
            )));
        }
        Ok(self.derive(self.values[..len].to_vec(), self.start))
    }
}
