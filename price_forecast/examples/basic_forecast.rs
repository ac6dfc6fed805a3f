use price_forecast::diagnostics::Correlogram;
use price_forecast::evaluation::InformationCriteria;
use price_forecast::models::{shared_conditioning, ModelSpec, SarmaFitter};
use price_forecast::series::{Frequency, Period, TimeSeries, Window};
use price_forecast::simulate::{price_path, simulate_sarma, SarmaProcess};
use price_forecast::transform::{difference, log_transform};
use price_forecast::{Forecaster, RawRecord};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Price Forecast: Basic Forecasting Example");
    println!("=========================================\n");

    // Create sample data: 15 years of month-end prices with seasonal return structure
    println!("Creating sample data...");
    let process = SarmaProcess {
        ma: vec![0.4],
        seasonal_ma: vec![0.3, 0.2, 0.15],
        period: 12,
        mean: 0.005,
        ..SarmaProcess::white_noise(0.04)
    };
    let returns = simulate_sarma(&process, 180, 7)?;
    let prices = price_path(&returns, 100.0);
    let records = create_records(&prices)?;
    println!("Sample data created: {} monthly prices\n", records.len());

    let series = TimeSeries::from_records(&records, Frequency::Monthly, Window::all())?;
    let logged = log_transform(&series.into())?;

    // Inspect the returns
    let diffed = difference(&logged, 1)?;
    let correlogram = Correlogram::compute(diffed.values(), 24)?;
    println!("Significant ACF lags:  {:?}", correlogram.significant_acf_lags());
    println!("Significant PACF lags: {:?}\n", correlogram.significant_pacf_lags());

    // Fit two candidates and compare in sample
    println!("Fitting models...");
    let specs = [
        ModelSpec::arima(0, 1, 1),
        ModelSpec::arima(1, 1, 1).with_seasonal(0, 0, 3, 12),
    ];
    let fitter = SarmaFitter::new().with_conditioning(shared_conditioning(&specs));
    let mut fitted = Vec::new();
    for spec in &specs {
        let model = fitter.fit(&logged, spec)?;
        let criteria = InformationCriteria::of(&model);
        println!(
            "  {:<28} AIC {:>9.2}  BIC {:>9.2}  ({} iterations)",
            spec.to_string(),
            criteria.aic,
            criteria.bic,
            model.iterations()
        );
        fitted.push(model);
    }

    let best = fitted
        .iter()
        .min_by(|a, b| a.aic().total_cmp(&b.aic()))
        .ok_or("no model fitted")?;
    println!("\nCoefficients of {}:", best.spec());
    for c in best.coefficients() {
        println!("  {:<10} {:>8.4} (se {:.4})", c.name, c.value, c.std_error);
    }

    // Forecast the next quarter
    let forecaster = Forecaster::new(0.05)?;
    let forecast = forecaster.forecast(best, 3)?;
    println!("\nNext quarter (95% intervals):");
    for point in forecaster.to_price_scale(&forecast)?.points {
        println!(
            "  {}: {:.2} ({:.2}, {:.2})",
            point.period, point.point, point.lower, point.upper
        );
    }

    println!("\nForecasting complete!");
    Ok(())
}

fn create_records(prices: &[f64]) -> Result<Vec<RawRecord>, Box<dyn std::error::Error>> {
    let start = Period::month(2005, 1)?;
    prices
        .iter()
        .enumerate()
        .map(|(i, price)| -> Result<RawRecord, Box<dyn std::error::Error>> {
            let date = start
                .offset(i as i64)
                .first_day()
                .ok_or("period without a calendar date")?;
            Ok(RawRecord::new(date, *price))
        })
        .collect()
}
