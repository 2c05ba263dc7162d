//! Unit tests for summary metrics and confidence intervals

use approx::assert_relative_eq;
use assert_matches::assert_matches;
use monte_carlo::*;
use proptest::prelude::*;
use rstest::*;

#[fixture]
fn sample() -> SimulationSample {
    SimulationSample::from(vec![4.0, 1.0, 3.0, 2.0, 5.0])
}

#[rstest]
fn test_summary_values(sample: SimulationSample) {
    let metrics = summarize(&sample).unwrap();
    assert_eq!(metrics.mean, 3.0);
    assert_eq!(metrics.median, 3.0);
    assert_eq!(metrics.min, 1.0);
    assert_eq!(metrics.max, 5.0);
    assert_relative_eq!(metrics.std_dev, 2.0_f64.sqrt(), epsilon = 1e-12);

    let sample_std = summarize_with(&sample, StdDevConvention::Sample).unwrap();
    assert_relative_eq!(sample_std.std_dev, 2.5_f64.sqrt(), epsilon = 1e-12);
}

#[rstest]
fn test_even_length_median_interpolates() {
    let metrics = summarize(&SimulationSample::from(vec![1.0, 2.0, 3.0, 10.0])).unwrap();
    assert_eq!(metrics.median, 2.5);
}

#[rstest]
fn test_empty_sample_is_insufficient() {
    assert_matches!(
        summarize(&SimulationSample::from(Vec::new())),
        Err(SimulationError::InsufficientData { .. })
    );
}

#[rstest]
#[case(0.0, 1.0)]
#[case(25.0, 1.75)]
#[case(50.0, 2.5)]
#[case(90.0, 3.7)]
#[case(100.0, 4.0)]
fn test_linear_percentile(#[case] q: f64, #[case] expected: f64) {
    assert_relative_eq!(percentile(&[1.0, 2.0, 3.0, 4.0], q), expected, epsilon = 1e-12);
}

#[rstest]
fn test_confidence_interval_bounds() {
    let values: Vec<f64> = (0..=100).map(f64::from).collect();
    let ci = confidence_interval(&SimulationSample::from(values), 90.0).unwrap();
    assert_relative_eq!(ci.low, 5.0, epsilon = 1e-12);
    assert_relative_eq!(ci.high, 95.0, epsilon = 1e-12);
    assert!(ci.contains(5.0) && ci.contains(95.0));
    assert!(!ci.contains(95.5));
}

#[rstest]
#[case(0.0)]
#[case(-1.0)]
#[case(150.0)]
#[case(f64::NAN)]
fn test_confidence_level_range(sample: SimulationSample, #[case] level: f64) {
    assert_matches!(
        confidence_interval(&sample, level),
        Err(SimulationError::InvalidParameter { parameter: "confidence_level", .. })
    );
}

#[rstest]
fn test_full_confidence_spans_sample(sample: SimulationSample) {
    let ci = confidence_interval(&sample, 100.0).unwrap();
    assert_eq!((ci.low, ci.high), (1.0, 5.0));
}

proptest! {
    #[test]
    fn prop_summary_ordering(values in prop::collection::vec(-1e6f64..1e6, 1..200)) {
        let metrics = summarize(&SimulationSample::from(values)).unwrap();
        let slack = 1e-9 * (1.0 + metrics.max.abs().max(metrics.min.abs()));
        prop_assert!(metrics.min <= metrics.median && metrics.median <= metrics.max);
        prop_assert!(metrics.min - slack <= metrics.mean && metrics.mean <= metrics.max + slack);
        prop_assert!(metrics.std_dev >= 0.0);
    }

    #[test]
    fn prop_interval_is_ordered(
        values in prop::collection::vec(-1e3f64..1e3, 1..200),
        level in 1.0f64..100.0,
    ) {
        let ci = confidence_interval(&SimulationSample::from(values), level).unwrap();
        prop_assert!(ci.low <= ci.high);
    }
}
