use approx::assert_relative_eq;
use price_forecast::error::ForecastError;
use price_forecast::forecast::{ForecastResult, Forecaster};
use price_forecast::models::{FittedModel, ModelSpec, SarmaFitter};
use price_forecast::series::{Period, TimeSeries};
use price_forecast::simulate::{price_path, simulate_sarma, SarmaProcess};
use price_forecast::transform::{difference, log_transform, TransformedSeries};

fn returns(n: usize, seed: u64) -> Vec<f64> {
    let process = SarmaProcess {
        ma: vec![0.3],
        mean: 0.005,
        ..SarmaProcess::white_noise(0.04)
    };
    simulate_sarma(&process, n, seed).unwrap()
}

fn log_prices(n: usize, seed: u64) -> TransformedSeries {
    let prices = price_path(&returns(n, seed), 100.0);
    let series: TransformedSeries = TimeSeries::new(prices, Period::month(2010, 1).unwrap()).into();
    log_transform(&series).unwrap()
}

fn fit(series: &TransformedSeries, spec: ModelSpec) -> FittedModel {
    SarmaFitter::new().fit(series, &spec).unwrap()
}

#[test]
fn test_price_forecast_brackets_point() {
    let logged = log_prices(120, 7);
    let model = fit(&logged, ModelSpec::arima(0, 1, 1));
    let forecaster = Forecaster::default();

    let result = forecaster.forecast(&model, 6).unwrap();
    let prices = forecaster.to_price_scale(&result).unwrap();

    assert_eq!(prices.alpha, 0.05);
    assert_eq!(prices.points.len(), 6);
    for point in &prices.points {
        assert!(point.lower > 0.0);
        assert!(point.lower <= point.point && point.point <= point.upper);
    }
    // Intervals widen with the horizon
    assert!(result.std_errors().windows(2).all(|w| w[0] <= w[1]));
    let widths: Vec<f64> = prices.points.iter().map(|p| p.upper - p.lower).collect();
    assert!(widths[5] > widths[0]);
}

#[test]
fn test_forecast_periods_follow_series() {
    let logged = log_prices(60, 3);
    let model = fit(&logged, ModelSpec::arima(0, 1, 1));
    let result = Forecaster::default().forecast(&model, 3).unwrap();

    // 61 prices starting 2010-01 end in 2015-01
    let expected: Vec<Period> = vec![
        Period::month(2015, 2).unwrap(),
        Period::month(2015, 3).unwrap(),
        Period::month(2015, 4).unwrap(),
    ];
    assert_eq!(result.periods(), expected.as_slice());
    assert_eq!(result.horizons(), 3);
}

#[test]
fn test_ima_forecast_is_flat_after_first_step() {
    let logged = log_prices(120, 11);
    let model = fit(&logged, ModelSpec::arima(0, 1, 1));
    let result = Forecaster::default().forecast(&model, 4).unwrap();
    let values = result.values();

    assert_relative_eq!(values[1], values[2], epsilon = 1e-12);
    assert_relative_eq!(values[2], values[3], epsilon = 1e-12);

    // psi weights of (1 + θB)/(1 - B) are 1, 1 + θ, 1 + θ, ...
    let theta = model.ma()[0];
    let sigma2 = model.sigma2();
    for (h, se) in result.std_errors().iter().enumerate() {
        let expected = (sigma2 * (1.0 + h as f64 * (1.0 + theta).powi(2))).sqrt();
        assert_relative_eq!(*se, expected, max_relative = 1e-9);
    }
}

#[test]
fn test_ar1_forecast_decays_to_mean() {
    let process = SarmaProcess {
        ar: vec![0.6],
        mean: 2.0,
        ..SarmaProcess::white_noise(0.5)
    };
    let values = simulate_sarma(&process, 150, 21).unwrap();
    let last = *values.last().unwrap();
    let series: TransformedSeries = TimeSeries::new(values, Period::month(2000, 1).unwrap()).into();
    let model = fit(&series, ModelSpec::arima(1, 0, 0));
    let result = Forecaster::default().forecast(&model, 5).unwrap();

    let phi = model.ar()[0];
    let mu = model.constant();
    let mut variance = 0.0;
    for h in 1..=5 {
        let expected = mu + phi.powi(h as i32) * (last - mu);
        assert_relative_eq!(result.values()[h - 1], expected, max_relative = 1e-9);

        variance += phi.powi(2 * (h as i32 - 1));
        assert_relative_eq!(
            result.std_errors()[h - 1],
            (model.sigma2() * variance).sqrt(),
            max_relative = 1e-9
        );
    }
}

#[test]
fn test_untransformed_series_passes_through() {
    let process = SarmaProcess {
        ar: vec![0.4],
        ..SarmaProcess::white_noise(1.0)
    };
    let values = simulate_sarma(&process, 100, 5).unwrap();
    let series: TransformedSeries = TimeSeries::new(values, Period::month(2000, 1).unwrap()).into();
    let model = fit(&series, ModelSpec::arima(1, 0, 0));
    let forecaster = Forecaster::default();
    let result = forecaster.forecast(&model, 2).unwrap();
    let mapped = forecaster.to_price_scale(&result).unwrap();

    assert_eq!(mapped.points[0].point, result.values()[0]);
    let (lower, upper) = result.intervals(forecaster.z())[1];
    assert_eq!(mapped.points[1].lower, lower);
    assert_eq!(mapped.points[1].upper, upper);
}

#[test]
fn test_differenced_input_cannot_be_mapped_to_prices() {
    let logged = log_prices(80, 2);
    let returns = difference(&logged, 1).unwrap();
    let model = fit(&returns, ModelSpec::arima(0, 0, 1));
    let forecaster = Forecaster::default();
    let result = forecaster.forecast(&model, 2).unwrap();

    assert!(matches!(
        forecaster.to_price_scale(&result),
        Err(ForecastError::InvalidSpec(_))
    ));
}

#[test]
fn test_forecaster_validation() {
    let logged = log_prices(60, 1);
    let model = fit(&logged, ModelSpec::arima(0, 1, 1));

    assert!(matches!(
        Forecaster::default().forecast(&model, 0),
        Err(ForecastError::InvalidSpec(_))
    ));
    assert!(matches!(Forecaster::new(0.0), Err(ForecastError::InvalidSpec(_))));
    assert!(matches!(Forecaster::new(1.0), Err(ForecastError::InvalidSpec(_))));

    assert_relative_eq!(Forecaster::new(0.05).unwrap().z(), 1.959964, epsilon = 1e-5);
    assert_relative_eq!(Forecaster::new(0.10).unwrap().z(), 1.644854, epsilon = 1e-5);
}

#[test]
fn test_forecast_result_accuracy() {
    let periods: Vec<Period> = (0..3).map(|i| Period::month(2020, 1).unwrap().offset(i)).collect();
    let result = ForecastResult::new(vec![1.0, 2.0, 3.0], vec![0.1, 0.2, 0.3], periods.clone()).unwrap();

    assert_relative_eq!(result.mean_absolute_error(&[2.0, 2.0, 1.0]).unwrap(), 1.0);
    assert_relative_eq!(result.mean_squared_error(&[2.0, 2.0, 1.0]).unwrap(), 5.0 / 3.0);
    assert!(result.mean_absolute_error(&[1.0]).is_err());
    assert!(ForecastResult::new(vec![1.0], vec![0.1, 0.2], periods).is_err());
}
