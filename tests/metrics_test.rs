//! Metric engine integration tests

use trueno_gapbench::metrics::{Direction, Metric, MetricEngine, MetricValue};
use trueno_gapbench::series::Series;
use trueno_gapbench::Error;

fn value(scores: &trueno_gapbench::metrics::MetricVector, metric: Metric) -> f64 {
    scores
        .get(metric)
        .value()
        .unwrap_or_else(|| panic!("{metric} undefined"))
}

#[test]
fn test_identical_series_scores_perfectly() {
    let truth = Series::new(vec![3.0, 1.5, 4.0, 1.0, 5.5, 9.0, 2.0, 6.0]);
    let scores = MetricEngine::score(&truth, &truth).unwrap();

    assert!((value(&scores, Metric::R) - 1.0).abs() < 1e-12);
    assert!((value(&scores, Metric::R2) - 1.0).abs() < 1e-12);
    assert!((value(&scores, Metric::Re) - 1.0).abs() < 1e-12);
    for metric in [
        Metric::AbsDifferences,
        Metric::Mbe,
        Metric::Me,
        Metric::Mae,
        Metric::Mre,
        Metric::Mare,
        Metric::Mape,
        Metric::Sse,
        Metric::Mse,
        Metric::Rms,
        Metric::Nmse,
        Metric::Rmse,
        Metric::Nrmse,
        Metric::Rmss,
    ] {
        assert_eq!(value(&scores, metric), 0.0, "{metric}");
    }
}

#[test]
fn test_zero_in_truth_undefines_relative_metrics_only() {
    let truth = Series::new(vec![0.0, 1.0, 2.0, 3.0, 4.0]);
    let imputed = Series::new(vec![0.0, 1.5, 2.0, 2.5, 4.0]);
    let scores = MetricEngine::score(&truth, &imputed).unwrap();

    let undefined: Vec<Metric> = scores
        .iter()
        .filter(|(_, v)| v.is_undefined())
        .map(|(m, _)| m)
        .collect();
    assert_eq!(undefined, vec![Metric::Mre, Metric::Mare, Metric::Mape, Metric::Rms]);
}

#[test]
fn test_constant_truth_undefines_rmss() {
    let truth = Series::new(vec![2.0; 6]);
    let imputed = Series::new(vec![2.0, 2.0, 3.0, 2.0, 2.0, 2.0]);
    let scores = MetricEngine::score(&truth, &imputed).unwrap();
    assert!(scores.get(Metric::Rmss).is_undefined());
    assert!(!scores.get(Metric::Mape).is_undefined());
}

#[test]
fn test_known_values() {
    let truth = Series::new(vec![1.0, 2.0, 4.0, 8.0]);
    let imputed = Series::new(vec![1.0, 3.0, 4.0, 6.0]);
    let scores = MetricEngine::score(&truth, &imputed).unwrap();

    // errors x - X: 0, -1, 0, 2
    assert_eq!(value(&scores, Metric::AbsDifferences), 3.0);
    assert_eq!(value(&scores, Metric::Me), 0.25);
    assert_eq!(value(&scores, Metric::Mbe), -0.25);
    assert_eq!(value(&scores, Metric::Mae), 0.25);
    assert_eq!(value(&scores, Metric::Sse), 5.0);
    assert_eq!(value(&scores, Metric::Mse), 1.25);
    assert!((value(&scores, Metric::Rmse) - 1.25_f64.sqrt()).abs() < 1e-12);
    // relative errors: 0, -0.5, 0, 0.25
    assert_eq!(value(&scores, Metric::Mre), -0.25);
    assert_eq!(value(&scores, Metric::Mare), 0.1875);
    assert_eq!(value(&scores, Metric::Mape), 18.75);
    // range 7
    assert!((value(&scores, Metric::Nrmse) - 100.0 * 1.25_f64.sqrt() / 7.0).abs() < 1e-12);
}

#[test]
fn test_length_mismatch_is_an_error() {
    let a = Series::new(vec![1.0, 2.0, 3.0]);
    let b = Series::new(vec![1.0, 2.0]);
    assert!(matches!(MetricEngine::score(&a, &b), Err(Error::InvalidInput(_))));
}

#[test]
fn test_metric_names_round_trip() {
    for metric in Metric::ALL {
        assert_eq!(Metric::from_name(metric.name()), Some(metric));
    }
    assert_eq!(Metric::ALL.len(), 17);
}

#[test]
fn test_direction_table() {
    assert_eq!(Metric::R.direction(), Direction::Maximize);
    assert_eq!(Metric::Re.direction(), Direction::Maximize);
    assert_eq!(Metric::Rmse.direction(), Direction::Minimize);
    assert_eq!(Metric::Mbe.direction(), Direction::TowardZero);
    assert!(Direction::TowardZero.is_better(-0.1, 0.2));
    assert!(!Direction::Maximize.is_better(f64::NAN, 0.0));
}

#[test]
fn test_metric_value_serializes_as_nullable_number() {
    assert_eq!(serde_json::to_string(&MetricValue::Undefined).unwrap(), "null");
    assert_eq!(serde_json::to_string(&MetricValue::Value(1.5)).unwrap(), "1.5");
}
