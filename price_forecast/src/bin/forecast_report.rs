//! Command-line front end for the price forecasting pipeline
//!
//! Usage:
//! ```text
//! forecast_report run --input spy.csv --start 2005-01 --format json --output report.json
//! forecast_report diagnose --input spy.csv --max-lag 24
//! forecast_report simulate --output synthetic.csv --n 180 --seed 7
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use price_forecast::models::{ModelSpec, SearchBounds};
use price_forecast::series::{Frequency, Period};
use price_forecast::simulate::{price_path, simulate_sarma, write_price_csv, SarmaProcess};
use price_forecast::{JsonRenderer, Pipeline, PipelineConfig, ReportRenderer, TextRenderer};
use std::error::Error;
use std::fs;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about = "Seasonal ARMA forecasts of monthly stock prices")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compare candidate models and forecast with the selected one
    Run {
        #[command(flatten)]
        input: InputArgs,

        /// Candidate model as `p,d,q` or `p,d,q;P,D,Q;s` (repeatable, replaces the configured list)
        #[arg(short, long = "model")]
        models: Vec<String>,

        /// Add the best models of an AIC order search to the candidates
        #[arg(long)]
        search: bool,

        /// Periods to forecast
        #[arg(short = 'H', long)]
        horizon: Option<usize>,

        /// Significance level of intervals and tests
        #[arg(long)]
        alpha: Option<f64>,

        /// Report format
        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,

        /// Write the report to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Correlogram and white-noise test of the monthly log returns
    Diagnose {
        #[command(flatten)]
        input: InputArgs,

        /// Largest lag in the correlogram
        #[arg(long)]
        max_lag: Option<usize>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
    /// Write a synthetic monthly price file from a seasonal ARMA process of log returns
    Simulate {
        /// File to write
        #[arg(short, long)]
        output: PathBuf,

        /// Number of monthly returns
        #[arg(short, long, default_value_t = 180)]
        n: usize,

        /// Random seed
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Month of the first price
        #[arg(long, default_value = "2005-01")]
        start: String,

        /// AR coefficients, comma separated
        #[arg(long, value_delimiter = ',')]
        ar: Vec<f64>,

        /// MA coefficients, comma separated
        #[arg(long, value_delimiter = ',', default_value = "0.4")]
        ma: Vec<f64>,

        /// Seasonal MA coefficients, comma separated
        #[arg(long, value_delimiter = ',', default_value = "0.3,0.2,0.15")]
        seasonal_ma: Vec<f64>,

        /// Seasonal period
        #[arg(long, default_value_t = 12)]
        period: usize,

        /// Mean monthly log return
        #[arg(long, default_value_t = 0.005)]
        mean: f64,

        /// Standard deviation of the innovations
        #[arg(long, default_value_t = 0.04)]
        sigma: f64,

        /// First price of the path
        #[arg(long, default_value_t = 100.0)]
        initial_price: f64,
    },
}

/// Where the prices come from and which part of them to use
#[derive(Args, Debug)]
struct InputArgs {
    /// JSON configuration file; flags override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Price file
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// First month of the series (YYYY-MM)
    #[arg(long)]
    start: Option<String>,

    /// Last month of the series (YYYY-MM)
    #[arg(long)]
    end: Option<String>,

    /// Later month to start modelling from (YYYY-MM)
    #[arg(long)]
    analysis_start: Option<String>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    Text,
    Json,
}

impl InputArgs {
    fn into_config(self) -> Result<PipelineConfig, Box<dyn Error>> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_json_file(path)?,
            None => PipelineConfig::default(),
        };
        if let Some(input) = self.input {
            config.input = input;
        }
        if self.start.is_some() {
            config.start = self.start;
        }
        if self.end.is_some() {
            config.end = self.end;
        }
        if self.analysis_start.is_some() {
            config.analysis_start = self.analysis_start;
        }
        Ok(config)
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "price_forecast=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Run {
            input,
            models,
            search,
            horizon,
            alpha,
            format,
            output,
        } => {
            let mut config = input.into_config()?;
            if !models.is_empty() {
                config.candidates = models
                    .iter()
                    .map(|m| m.parse::<ModelSpec>())
                    .collect::<Result<_, _>>()?;
            }
            if search && config.search.is_none() {
                config.search = Some(SearchBounds {
                    d: 1,
                    period: config.seasonal_period,
                    ..SearchBounds::default()
                });
            }
            if let Some(horizon) = horizon {
                config.forecast_horizon = horizon;
            }
            if let Some(alpha) = alpha {
                config.alpha = alpha;
            }

            let report = Pipeline::new(config)?.run()?;
            let rendered = match format {
                Format::Text => TextRenderer.render(&report)?,
                Format::Json => JsonRenderer::default().render(&report)?,
            };
            match output {
                Some(path) => {
                    fs::write(&path, rendered)?;
                    info!(path = %path.display(), "report written");
                }
                None => print!("{}", rendered),
            }
        }
        Command::Diagnose {
            input,
            max_lag,
            format,
        } => {
            let mut config = input.into_config()?;
            if let Some(max_lag) = max_lag {
                config.max_lag = max_lag;
            }
            let pipeline = Pipeline::new(config)?;
            let records = pipeline.load()?;
            let logged = pipeline.prepare(&records)?;
            let summary = pipeline.diagnose(&logged)?;
            match format {
                Format::Text => print!("{}", summary),
                Format::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
            }
        }
        Command::Simulate {
            output,
            n,
            seed,
            start,
            ar,
            ma,
            seasonal_ma,
            period,
            mean,
            sigma,
            initial_price,
        } => {
            let process = SarmaProcess {
                ar,
                ma,
                seasonal_ar: Vec::new(),
                seasonal_ma,
                period,
                mean,
                sigma,
            };
            let returns = simulate_sarma(&process, n, seed)?;
            let prices = price_path(&returns, initial_price);
            let start = Period::parse(&start, Frequency::Monthly)?;
            write_price_csv(&output, start, &prices)?;
            info!(path = %output.display(), rows = prices.len(), "synthetic prices written");
        }
    }

    Ok(())
}
