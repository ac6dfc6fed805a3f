//! Loading price records from delimited files

use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use csv::StringRecord;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{debug, warn};

/// Date format accepted in the input file
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// One row of the input file
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    /// Calendar date of the observation
    pub date: NaiveDate,
    /// Reference price
    pub price: f64,
}

impl RawRecord {
    /// Create a new record
    pub fn new(date: NaiveDate, price: f64) -> Self {
        Self { date, price }
    }
}

/// Data loader for price files
///
/// Column names are matched case-insensitively. When a name is not given
/// the loader looks for a header containing `date`, and for the price
/// prefers `adj close`, then `close`, then `price`.
#[derive(Debug, Clone, Default)]
pub struct DataLoader {
    date_column: Option<String>,
    price_column: Option<String>,
}

impl DataLoader {
    /// Loader that detects the date and price columns
    pub fn new() -> Self {
        Self::default()
    }

    /// Loader for explicitly named columns
    pub fn with_columns(date_column: impl Into<String>, price_column: impl Into<String>) -> Self {
        Self {
            date_column: Some(date_column.into()),
            price_column: Some(price_column.into()),
        }
    }

    /// Load records from a CSV file, detecting the columns
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Vec<RawRecord>> {
        Self::new().load(path)
    }

    /// Load records from a CSV file
    pub fn load<P: AsRef<Path>>(&self, path: P) -> Result<Vec<RawRecord>> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let records = self.read(BufReader::new(file))?;
        debug!(path = %path.display(), records = records.len(), "loaded price records");
        Ok(records)
    }

    /// Read records from any CSV source with a header row
    pub fn read<R: Read>(&self, source: R) -> Result<Vec<RawRecord>> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(source);

        let headers = reader.headers()?.clone();
        let date_idx = self.resolve_date_column(&headers)?;
        let price_idx = self.resolve_price_column(&headers)?;

        let mut records = Vec::new();
        for (row, result) in reader.records().enumerate() {
            // Header is line 1
            let line = row + 2;
            let record = result.map_err(|e| {
                let line = e.position().map_or(line as u64, |p| p.line());
                ForecastError::DataFormat(format!("Line {}: {}", line, e))
            })?;

            let date_field = record.get(date_idx).unwrap_or("");
            let date = NaiveDate::parse_from_str(date_field, DATE_FORMAT).map_err(|e| {
                ForecastError::DataFormat(format!(
                    "Line {}: cannot parse date '{}' as YYYY-MM-DD: {}",
                    line, date_field, e
                ))
            })?;

            let price_field = record.get(price_idx).unwrap_or("");
            if is_missing(price_field) {
                warn!(line, date = %date, "skipping row with missing price");
                continue;
            }
            let price = price_field.parse::<f64>().map_err(|e| {
                ForecastError::DataFormat(format!(
                    "Line {}: cannot parse price '{}': {}",
                    line, price_field, e
                ))
            })?;

            records.push(RawRecord { date, price });
        }

        if records.is_empty() {
            return Err(ForecastError::DataFormat(
                "No price records found in data".to_string(),
            ));
        }

        Ok(records)
    }

    /// Find the index of the date column
    fn resolve_date_column(&self, headers: &StringRecord) -> Result<usize> {
        if let Some(name) = &self.date_column {
            return find_exact(headers, name).ok_or_else(|| {
                ForecastError::DataFormat(format!("Date column '{}' not found in data", name))
            });
        }

        find_containing(headers, "date").ok_or_else(|| {
            ForecastError::DataFormat("No date column found in data".to_string())
        })
    }

    /// Find the index of the price column
    fn resolve_price_column(&self, headers: &StringRecord) -> Result<usize> {
        if let Some(name) = &self.price_column {
            return find_exact(headers, name).ok_or_else(|| {
                ForecastError::DataFormat(format!("Price column '{}' not found in data", name))
            });
        }

        ["adj close", "close", "price"]
            .iter()
            .find_map(|needle| find_containing(headers, needle))
            .ok_or_else(|| ForecastError::DataFormat("No price column found in data".to_string()))
    }
}

fn find_exact(headers: &StringRecord, name: &str) -> Option<usize> {
    headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case(name.trim()))
}

fn find_containing(headers: &StringRecord, needle: &str) -> Option<usize> {
    headers
        .iter()
        .position(|h| h.to_lowercase().contains(needle))
}

/// Placeholder values some data vendors write for missing prices
fn is_missing(field: &str) -> bool {
    field.is_empty() || field.eq_ignore_ascii_case("null") || field.eq_ignore_ascii_case("nan")
}
