use forecast_math::optimize::NelderMeadConfig;
use price_forecast::error::ForecastError;
use price_forecast::models::{
    grid_search, shared_conditioning, FittedModel, ModelSpec, SarmaFitter, SearchBounds,
};
use price_forecast::series::{Period, TimeSeries};
use price_forecast::simulate::{simulate_sarma, SarmaProcess};
use price_forecast::transform::TransformedSeries;
use rstest::rstest;

const AR: f64 = 0.5;
const MA: f64 = 0.3;
const SEASONAL_MA: [f64; 3] = [0.5, 0.3, 0.2];

fn seasonal_process() -> SarmaProcess {
    SarmaProcess {
        ar: vec![AR],
        ma: vec![MA],
        seasonal_ma: SEASONAL_MA.to_vec(),
        period: 12,
        ..SarmaProcess::white_noise(1.0)
    }
}

fn to_series(values: Vec<f64>) -> TransformedSeries {
    TimeSeries::new(values, Period::month(2005, 1).unwrap()).into()
}

fn sarma_spec() -> ModelSpec {
    ModelSpec::arima(1, 0, 1).with_seasonal(0, 0, 3, 12)
}

fn fit_seed(seed: u64) -> FittedModel {
    let values = simulate_sarma(&seasonal_process(), 180, seed).unwrap();
    SarmaFitter::new().fit(&to_series(values), &sarma_spec()).unwrap()
}

fn average(fits: &[FittedModel], f: impl Fn(&FittedModel) -> f64) -> f64 {
    fits.iter().map(f).sum::<f64>() / fits.len() as f64
}

#[test]
fn test_sarma_recovers_generating_coefficients() {
    let fits: Vec<FittedModel> = (1..=5).map(fit_seed).collect();

    let ar = average(&fits, |m| m.ar()[0]);
    let ma = average(&fits, |m| m.ma()[0]);
    assert!((ar - AR).abs() < 0.15, "AR estimate {}", ar);
    assert!((ma - MA).abs() < 0.15, "MA estimate {}", ma);
    for (k, truth) in SEASONAL_MA.iter().enumerate() {
        let estimate = average(&fits, |m| m.seasonal_ma()[k]);
        assert!(
            (estimate - truth).abs() < 0.15,
            "seasonal MA {} estimate {}",
            k + 1,
            estimate
        );
    }

    // Innovation variance of the generating process is 1
    let sigma2 = average(&fits, |m| m.sigma2());
    assert!((sigma2 - 1.0).abs() < 0.25, "sigma2 estimate {}", sigma2);
}

#[test]
fn test_sarma_residuals_are_white_noise() {
    let passes = (1..=5)
        .map(fit_seed)
        .filter(|model| model.residual_test(24).unwrap().p_value > 0.05)
        .count();

    assert!(passes >= 4, "only {} of 5 residual series passed", passes);
}

#[test]
fn test_fitted_model_inspection() {
    let model = fit_seed(3);
    let coefficients = model.coefficients();

    let names: Vec<&str> = coefficients.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["ar.L1", "ma.L1", "ma.S.L12", "ma.S.L24", "ma.S.L36", "const"]);
    assert!(coefficients.iter().all(|c| c.std_error.is_finite() && c.std_error > 0.0));
    assert!(coefficients[0].is_significant());
    for c in &coefficients {
        assert!((c.t_ratio() - c.value / c.std_error).abs() < 1e-12);
    }
    assert!(coefficients[0].t_ratio().abs() > 2.0);

    // AR order 1 conditions on the first observation
    assert_eq!(model.n_obs(), 179);
    assert_eq!(model.residuals().len(), 179);
    assert_eq!(model.n_params(), 7);
    assert!(model.aic() < model.bic());
    assert!((model.aic() - (-2.0 * model.log_likelihood() + 14.0)).abs() < 1e-9);
    assert!(model.log_likelihood().is_finite());
}

#[test]
fn test_warm_start_reaches_same_optimum() {
    let values = simulate_sarma(&seasonal_process(), 180, 4).unwrap();
    let series = to_series(values);
    let fitter = SarmaFitter::new();
    let cold = fitter.fit(&series, &sarma_spec()).unwrap();
    let warm = fitter
        .fit_from(&series, &sarma_spec(), Some(&cold.parameters()))
        .unwrap();

    assert!((cold.log_likelihood() - warm.log_likelihood()).abs() < 1e-4);
}

#[test]
fn test_differenced_model_has_no_constant_by_default() {
    let process = SarmaProcess {
        ma: vec![0.4],
        ..SarmaProcess::white_noise(0.05)
    };
    let returns = simulate_sarma(&process, 120, 8).unwrap();
    let mut level = 0.0;
    let levels: Vec<f64> = returns
        .iter()
        .map(|r| {
            level += r;
            level
        })
        .collect();

    let model = SarmaFitter::new()
        .fit(&to_series(levels), &ModelSpec::arima(0, 1, 1))
        .unwrap();

    assert_eq!(model.parameters().len(), 1);
    assert_eq!(model.constant(), 0.0);
    assert!((model.ma()[0] - 0.4).abs() < 0.25);
}

#[test]
fn test_non_convergence_is_reported() {
    let values = simulate_sarma(&seasonal_process(), 180, 1).unwrap();
    let fitter = SarmaFitter::with_optimizer(NelderMeadConfig {
        max_iter: 3,
        restarts: 0,
        ..NelderMeadConfig::default()
    })
    .unwrap();

    let result = fitter.fit(&to_series(values), &sarma_spec());
    assert!(matches!(result, Err(ForecastError::NonConvergence(_))));
}

#[test]
fn test_series_too_short_for_orders() {
    let series = to_series(vec![1.0, 2.0, 1.5, 2.5, 2.0, 3.0]);
    let result = SarmaFitter::new().fit(&series, &sarma_spec());

    assert!(matches!(result, Err(ForecastError::InvalidSpec(_))));
}

#[rstest]
#[case("1,1,0", ModelSpec::arima(1, 1, 0))]
#[case("1,0,1;0,0,3;12", ModelSpec::arima(1, 0, 1).with_seasonal(0, 0, 3, 12))]
#[case(" 2, 1, 2 +c", ModelSpec::arima(2, 1, 2).with_constant(true))]
fn test_model_spec_parse(#[case] text: &str, #[case] expected: ModelSpec) {
    assert_eq!(text.parse::<ModelSpec>().unwrap(), expected);
}

#[rstest]
#[case("-1,0,1")]
#[case("1,0")]
#[case("1,0,1;0,0,1;1")]
#[case("a,b,c")]
fn test_model_spec_parse_rejects(#[case] text: &str) {
    assert!(matches!(text.parse::<ModelSpec>(), Err(ForecastError::InvalidSpec(_))));
}

#[test]
fn test_model_spec_labels_and_counts() {
    let spec = sarma_spec();

    assert_eq!(spec.to_string(), "SARIMA(1,0,1)(0,0,3)[12]");
    assert_eq!(ModelSpec::arima(0, 1, 1).to_string(), "ARIMA(0,1,1)");
    assert_eq!(spec.arma_params(), 5);
    assert_eq!(spec.n_coefficients(), 6);
    assert_eq!(spec.ma_span(), 37);
    assert!(!ModelSpec::arima(1, 1, 0).uses_constant());
}

#[test]
fn test_grid_search_ranks_by_aic() {
    let process = SarmaProcess {
        ar: vec![0.6],
        ..SarmaProcess::white_noise(1.0)
    };
    let series = to_series(simulate_sarma(&process, 150, 12).unwrap());
    let bounds = SearchBounds {
        max_p: 1,
        max_q: 1,
        max_seasonal_p: 0,
        max_seasonal_q: 0,
        period: 0,
        ..SearchBounds::default()
    };

    let ranked = grid_search(&series, &bounds, &SarmaFitter::new()).unwrap();

    assert_eq!(ranked.len(), 4);
    assert!(ranked.windows(2).all(|w| w[0].aic <= w[1].aic));
    // White noise is clearly worse than any model with an AR or MA term
    assert_eq!(ranked[3].spec, ModelSpec::arima(0, 0, 0));
}

#[test]
fn test_compared_models_share_likelihood_sample() {
    let process = SarmaProcess {
        ar: vec![0.3],
        ..SarmaProcess::white_noise(1.0)
    };
    let series = to_series(simulate_sarma(&process, 150, 21).unwrap());
    let specs = [
        ModelSpec::arima(0, 0, 1),
        ModelSpec::arima(1, 0, 0).with_seasonal(1, 0, 0, 12),
    ];

    // On their own the seasonal AR model drops 13 observations, MA(1) none
    let own: Vec<FittedModel> = specs
        .iter()
        .map(|spec| SarmaFitter::new().fit(&series, spec).unwrap())
        .collect();
    assert_eq!(own[0].n_obs(), 150);
    assert_eq!(own[1].n_obs(), 137);

    let span = shared_conditioning(&specs);
    assert_eq!(span, 13);
    let fitter = SarmaFitter::new().with_conditioning(span);
    let shared: Vec<FittedModel> = specs
        .iter()
        .map(|spec| fitter.fit(&series, spec).unwrap())
        .collect();
    assert!(shared.iter().all(|m| m.n_obs() == 137));
    assert!(shared.iter().all(|m| m.residuals().len() == 137));
    assert!((shared[1].log_likelihood() - own[1].log_likelihood()).abs() < 1e-6);
}

#[test]
fn test_grid_search_scores_every_candidate_on_same_sample() {
    let process = SarmaProcess {
        ar: vec![0.3],
        ..SarmaProcess::white_noise(1.0)
    };
    let series = to_series(simulate_sarma(&process, 150, 21).unwrap());
    let bounds = SearchBounds {
        max_p: 1,
        max_q: 1,
        max_seasonal_p: 1,
        max_seasonal_q: 0,
        period: 12,
        ..SearchBounds::default()
    };

    let ranked = grid_search(&series, &bounds, &SarmaFitter::new()).unwrap();

    assert!(ranked.len() > 1);
    assert!(ranked.iter().all(|r| r.n_obs == 137));
}

#[test]
fn test_iterations_are_recorded() {
    let model = fit_seed(2);
    assert!(model.iterations() > 0);
}
