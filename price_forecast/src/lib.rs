//! # Price Forecast
//!
//! A Rust library for forecasting monthly stock prices with seasonal ARMA models.
//!
//! ## Features
//!
//! - Price file loading with column detection (`date`, `adj close` / `close` / `price`)
//! - Fixed-frequency series construction with gap checks and windowing
//! - Log and (seasonal) difference transforms that remember how to be undone
//! - ACF / PACF correlograms and the Ljung–Box white-noise test
//! - Conditional maximum-likelihood SARIMA estimation with standard errors
//! - Model comparison by AIC/BIC, rolling-origin errors and the Diebold–Mariano test
//! - Forecasts with prediction intervals in price units
//!
//! ## Quick Start
//!
//! ```no_run
//! use price_forecast::models::{ModelSpec, SarmaFitter};
//! use price_forecast::series::{Frequency, TimeSeries, Window};
//! use price_forecast::transform::log_transform;
//! use price_forecast::{DataLoader, Forecaster};
//!
//! # fn main() -> price_forecast::Result<()> {
//! // Load daily prices and keep the last close of every month
//! let records = DataLoader::from_csv("prices.csv")?;
//! let series = TimeSeries::from_records(&records, Frequency::Monthly, Window::all())?;
//!
//! // Model log prices
//! let logged = log_transform(&series.into())?;
//! let spec = ModelSpec::arima(1, 1, 1).with_seasonal(0, 0, 3, 12);
//! let model = SarmaFitter::new().fit(&logged, &spec)?;
//!
//! // Next quarter with 95% intervals
//! let forecaster = Forecaster::new(0.05)?;
//! let forecast = forecaster.forecast(&model, 3)?;
//! for point in forecaster.to_price_scale(&forecast)?.points {
//!     println!("{} {:.2} [{:.2}, {:.2}]", point.period, point.point, point.lower, point.upper);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod data;
pub mod diagnostics;
pub mod error;
pub mod evaluation;
pub mod forecast;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod report;
pub mod series;
pub mod simulate;
pub mod transform;

// Re-export commonly used types
pub use crate::config::PipelineConfig;
pub use crate::data::{DataLoader, RawRecord};
pub use crate::error::{ForecastError, Result};
pub use crate::forecast::{ForecastResult, Forecaster, PriceForecast};
pub use crate::models::{FittedModel, ModelSpec, SarmaFitter};
pub use crate::pipeline::Pipeline;
pub use crate::report::{JsonRenderer, Report, ReportRenderer, TextRenderer};
pub use crate::series::{Frequency, Period, TimeSeries};
pub use crate::transform::TransformedSeries;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
