use approx::assert_relative_eq;
use forecast_math::descriptive::{mean, sample_variance};
use forecast_math::optimize::NelderMeadConfig;
use price_forecast::error::ForecastError;
use price_forecast::evaluation::{
    diebold_mariano, rolling_origin, select_model, CandidateScore, InformationCriteria,
    RollingOrigin, RollingOriginResult, DM_ALPHA,
};
use price_forecast::forecast::Forecaster;
use price_forecast::models::{ModelSpec, SarmaFitter};
use price_forecast::series::{Period, TimeSeries};
use price_forecast::simulate::{simulate_sarma, SarmaProcess};
use price_forecast::transform::TransformedSeries;

fn ar1_series(n: usize, seed: u64) -> TransformedSeries {
    let process = SarmaProcess {
        ar: vec![0.5],
        mean: 1.0,
        ..SarmaProcess::white_noise(0.3)
    };
    TimeSeries::new(simulate_sarma(&process, n, seed).unwrap(), Period::month(2001, 1).unwrap()).into()
}

fn some(values: &[f64]) -> Vec<Option<f64>> {
    values.iter().copied().map(Some).collect()
}

#[test]
fn test_rolling_origin_produces_one_error_per_origin() {
    let series = ar1_series(60, 4);
    let result = rolling_origin(&series, &ModelSpec::arima(1, 0, 0), 4, 0.7).unwrap();

    // S = round(0.7 * 60) = 42, origins 42..=56
    assert_eq!(result.errors.len(), 60 - 4 - 42 + 1);
    assert_eq!(result.origins.first(), Some(&42));
    assert_eq!(result.origins.last(), Some(&56));
    assert_eq!(result.horizon, 4);
    assert!(result.errors.iter().all(|e| e.map_or(false, f64::is_finite)));
}

#[test]
fn test_first_rolling_error_matches_manual_refit() {
    let series = ar1_series(60, 9);
    let spec = ModelSpec::arima(1, 0, 0);
    let result = RollingOrigin::new(4, 0.7).unwrap().evaluate(&series, &spec).unwrap();

    let history = series.head(42).unwrap();
    let model = SarmaFitter::new().without_std_errors().fit(&history, &spec).unwrap();
    let forecast = Forecaster::default().forecast(&model, 4).unwrap();
    let expected = series.values()[42 + 4 - 1] - forecast.values()[3];

    assert_relative_eq!(result.errors[0].unwrap(), expected, epsilon = 1e-12);
}

#[test]
fn test_non_converging_refits_are_recorded_as_missing() {
    let series = ar1_series(60, 4);
    let fitter = SarmaFitter::with_optimizer(NelderMeadConfig {
        max_iter: 3,
        restarts: 0,
        ..NelderMeadConfig::default()
    })
    .unwrap();
    let rolling = RollingOrigin::new(4, 0.7).unwrap().with_fitter(fitter);

    let result = rolling.evaluate(&series, &ModelSpec::arima(1, 0, 1)).unwrap();

    assert_eq!(result.errors.len(), 60 - 4 - 42 + 1);
    assert_eq!(result.origins.len(), result.errors.len());
    assert!(result.errors.iter().all(Option::is_none));
    let summary = result.summary();
    assert_eq!(summary.count, 0);
    assert_eq!(summary.missing, 15);
}

#[test]
fn test_rolling_origin_needs_enough_data() {
    let series = ar1_series(5, 1);
    let result = rolling_origin(&series, &ModelSpec::arima(1, 0, 0), 4, 0.7);
    assert!(matches!(result, Err(ForecastError::InsufficientData(_))));

    assert!(matches!(RollingOrigin::new(0, 0.7), Err(ForecastError::InvalidSpec(_))));
    assert!(matches!(RollingOrigin::new(4, 1.0), Err(ForecastError::InvalidSpec(_))));
    assert_eq!(RollingOrigin::default().first_origin(180), 126);
}

#[test]
fn test_identical_errors_are_not_distinguishable() {
    let errors = some(&[0.3, -0.1, 0.4, -0.2, 0.05, 0.6, -0.3, 0.2]);
    let test = diebold_mariano(&errors, &errors, 1, 1).unwrap();

    assert_eq!(test.statistic, 0.0);
    assert_eq!(test.p_value, 1.0);
    assert!(!test.rejects_equal_accuracy(DM_ALPHA));
}

#[test]
fn test_one_step_statistic_is_a_t_statistic() {
    let e1: Vec<f64> = (0..25).map(|i| 0.2 * (i as f64 * 0.9).sin()).collect();
    let e2: Vec<f64> = (0..25).map(|i| 0.25 * (i as f64 * 1.3).cos()).collect();
    let test = diebold_mariano(&some(&e1), &some(&e2), 1, 1).unwrap();

    // With h = 1 the corrected statistic reduces to mean(d) / (s / √n)
    let d: Vec<f64> = e1.iter().zip(&e2).map(|(a, b)| a.abs() - b.abs()).collect();
    let expected = mean(&d) / (sample_variance(&d) / d.len() as f64).sqrt();

    assert_eq!(test.n, 25);
    assert_relative_eq!(test.statistic, expected, max_relative = 1e-10);
    assert!(test.p_value > 0.0 && test.p_value < 1.0);
}

#[test]
fn test_clearly_different_accuracy_is_rejected() {
    let small: Vec<f64> = (0..30).map(|i| 0.1 * (i as f64).sin()).collect();
    let large: Vec<f64> = (0..30).map(|i| 1.0 + 0.1 * (i as f64).cos()).collect();
    let test = diebold_mariano(&some(&small), &some(&large), 2, 1).unwrap();

    assert!(test.statistic < 0.0);
    assert!(test.p_value < 0.01);
    assert!(test.rejects_equal_accuracy(DM_ALPHA));
}

#[test]
fn test_missing_errors_are_dropped_pairwise() {
    let mut e1 = some(&[0.1, 0.4, -0.2, 0.3, 0.5, -0.1]);
    let e2 = some(&[0.2, -0.3, 0.1, 0.6, -0.2, 0.3]);
    e1[2] = None;

    let test = diebold_mariano(&e1, &e2, 1, 2).unwrap();
    assert_eq!(test.n, 5);
}

#[test]
fn test_negative_long_run_variance_falls_back_to_one_step() {
    let e1 = some(&[2.0, 1.0, 2.0, 1.0, 2.0, 1.0, 2.0, 1.0]);
    let e2 = some(&[1.0, 2.0, 1.0, 2.0, 1.0, 2.0, 1.0, 2.0]);
    let test = diebold_mariano(&e1, &e2, 2, 1).unwrap();

    assert_eq!(test.horizon, 1);
    assert_relative_eq!(test.p_value, 1.0, epsilon = 1e-12);
}

#[test]
fn test_diebold_mariano_rejects_bad_input() {
    let e = some(&[0.1, 0.2, 0.3]);

    assert!(matches!(
        diebold_mariano(&e, &e[..2], 1, 1),
        Err(ForecastError::InvalidSpec(_))
    ));
    assert!(matches!(diebold_mariano(&e, &e, 0, 1), Err(ForecastError::InvalidSpec(_))));
    assert!(matches!(
        diebold_mariano(&[Some(0.1), None], &[None, Some(0.2)], 1, 1),
        Err(ForecastError::InsufficientData(_))
    ));
}

fn score(order: (usize, usize, usize), n_params: usize, aic: f64, errors: Vec<Option<f64>>) -> CandidateScore {
    let spec = ModelSpec::arima(order.0, order.1, order.2);
    let rolling = RollingOriginResult {
        spec,
        horizon: 1,
        origins: (100..100 + errors.len()).collect(),
        errors,
    };
    CandidateScore {
        spec,
        criteria: InformationCriteria {
            log_likelihood: -aic / 2.0,
            aic,
            bic: aic + 10.0,
            n_params,
            n_obs: 150,
        },
        out_of_sample: rolling.summary(),
        rolling,
    }
}

fn base_errors() -> Vec<f64> {
    (0..20).map(|i| 0.1 + 0.05 * (i as f64).sin()).collect()
}

#[test]
fn test_simpler_indistinguishable_model_is_selected() {
    let best = base_errors();
    // Alternating perturbation: slightly worse on average, not significantly so
    let close: Vec<f64> = best
        .iter()
        .enumerate()
        .map(|(i, e)| e + 0.001 + if i % 2 == 0 { 0.02 } else { -0.02 })
        .collect();
    let far: Vec<f64> = best.iter().map(|e| e + 0.5).collect();

    let candidates = vec![
        score((2, 1, 1), 4, 100.0, some(&best)),
        score((0, 1, 1), 2, 104.0, some(&close)),
        score((1, 1, 0), 2, 101.0, some(&far)),
    ];
    let selection = select_model(&candidates, DM_ALPHA).unwrap();

    assert_eq!(selection.most_accurate, 0);
    assert_eq!(selection.indistinguishable, vec![1]);
    assert_eq!(selection.selected, 1);
    assert!(selection.tests[0].is_none());
    assert!(selection.tests[2].unwrap().rejects_equal_accuracy(DM_ALPHA));
}

#[test]
fn test_equal_size_tie_goes_to_lower_aic() {
    let best = base_errors();
    let close: Vec<f64> = best
        .iter()
        .enumerate()
        .map(|(i, e)| e + 0.001 + if i % 2 == 0 { 0.02 } else { -0.02 })
        .collect();

    let candidates = vec![
        score((1, 1, 0), 3, 100.0, some(&best)),
        score((0, 1, 1), 3, 90.0, some(&close)),
    ];
    let selection = select_model(&candidates, DM_ALPHA).unwrap();

    assert_eq!(selection.most_accurate, 0);
    assert_eq!(selection.selected, 1);
}

#[test]
fn test_most_accurate_kept_when_rivals_differ() {
    let best = base_errors();
    let far: Vec<f64> = best.iter().map(|e| e + 0.5).collect();

    let candidates = vec![
        score((0, 1, 1), 2, 110.0, some(&far)),
        score((2, 1, 2), 5, 100.0, some(&best)),
    ];
    let selection = select_model(&candidates, DM_ALPHA).unwrap();

    assert_eq!(selection.most_accurate, 1);
    assert_eq!(selection.selected, 1);
    assert!(selection.indistinguishable.is_empty());
}

#[test]
fn test_selection_needs_some_forecasts() {
    let candidates = vec![score((1, 1, 0), 2, 100.0, vec![None, None])];

    assert!(matches!(
        select_model(&candidates, DM_ALPHA),
        Err(ForecastError::NonConvergence(_))
    ));
}

#[test]
fn test_information_criteria_of_fitted_model() {
    let series = ar1_series(120, 2);
    let model = SarmaFitter::new().fit(&series, &ModelSpec::arima(1, 0, 0)).unwrap();
    let criteria = InformationCriteria::of(&model);

    assert_eq!(criteria.n_params, 3);
    assert_eq!(criteria.n_obs, 119);
    assert_relative_eq!(criteria.aic, -2.0 * criteria.log_likelihood + 6.0, epsilon = 1e-9);
    assert_relative_eq!(
        criteria.bic,
        -2.0 * criteria.log_likelihood + 3.0 * (119f64).ln(),
        epsilon = 1e-9
    );
}
