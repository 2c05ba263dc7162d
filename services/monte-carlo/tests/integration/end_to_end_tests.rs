//! End-to-end tests for single-asset and portfolio simulation

use crate::test_utils::*;
use assert_matches::assert_matches;
use monte_carlo::*;
use rstest::*;
use std::sync::Arc;

#[fixture]
fn engine() -> MonteCarloEngine {
    init_tracing();
    let (a, b) = TestDataFactory::correlated_pair(120, 21);
    MonteCarloEngine::new(TestDataFactory::provider([TestDataFactory::reference_series(), a, b]))
}

#[rstest]
fn test_reference_ticker_one_day_ahead(engine: MonteCarloEngine) {
    let report = engine.simulate("TEST", 5_000, 1.0, &mut seeded(42)).unwrap();

    assert_eq!(report.simulations.len(), 5_000);
    assert!(report.metrics.min > 0.0);
    TestAssertions::assert_within(report.metrics.mean, 100.0, 0.5, "mean");
    TestAssertions::assert_within(report.metrics.median, 100.0, 0.5, "median");
    TestAssertions::assert_metrics_consistent(&report.metrics);
}

#[rstest]
fn test_longer_horizon_widens_distribution(engine: MonteCarloEngine) {
    let short = engine.simulate("TEST", 5_000, 1.0, &mut seeded(1)).unwrap();
    let long = engine.simulate("TEST", 5_000, 25.0, &mut seeded(1)).unwrap();
    assert!(long.metrics.std_dev > 3.0 * short.metrics.std_dev);
}

#[rstest]
fn test_report_serializes_with_wire_names(engine: MonteCarloEngine) {
    let report = engine.simulate("TEST", 3, 1.0, &mut seeded(0)).unwrap();
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["simulations"].as_array().map(Vec::len), Some(3));
    for key in ["mean", "median", "std_dev", "min_val", "max_val"] {
        assert!(json["metrics"].get(key).is_some(), "missing {}", key);
    }
}

#[rstest]
fn test_portfolio_value_centres_on_weighted_prices(engine: MonteCarloEngine) {
    let stocks = vec!["AAA".to_string(), "BBB".to_string()];
    let weights = [0.6, 0.4];
    let report = engine
        .simulate_portfolio(&stocks, &weights, 5_000, 1.0, &mut seeded(8))
        .unwrap();

    let (a, b) = TestDataFactory::correlated_pair(120, 21);
    let today = 0.6 * a.last().unwrap().1 + 0.4 * b.last().unwrap().1;
    assert_eq!(report.simulations.len(), 5_000);
    TestAssertions::assert_within(report.metrics.mean, today, 0.02 * today, "portfolio mean");
    TestAssertions::assert_metrics_consistent(&report.metrics);
}

#[rstest]
fn test_portfolio_mismatch_rejected_before_any_fetch() {
    let engine = MonteCarloEngine::new(untouched_market_data());
    let stocks = vec!["AAA".to_string(), "BBB".to_string()];
    assert_matches!(
        engine.simulate_portfolio(&stocks, &[1.0], 100, 1.0, &mut seeded(0)),
        Err(SimulationError::InvalidParameter { parameter: "weights", .. })
    );
    assert_matches!(
        engine.simulate_portfolio(&[], &[], 100, 1.0, &mut seeded(0)),
        Err(SimulationError::InvalidParameter { parameter: "stocks", .. })
    );
}

#[rstest]
fn test_portfolio_with_unknown_member_is_no_data(engine: MonteCarloEngine) {
    let stocks = vec!["AAA".to_string(), "ZZZ".to_string()];
    assert_matches!(
        engine.simulate_portfolio(&stocks, &[0.5, 0.5], 100, 1.0, &mut seeded(0)),
        Err(SimulationError::NoData { .. })
    );
}

#[rstest]
fn test_percentile_band_coverage_on_known_model() {
    // Realized outcomes drawn from the simulated law should land in the
    // 95% band about 95% of the time.
    let (s0, drift, vol) = (100.0, 0.0005, 0.02);
    let trials = 400;
    let mut rng = seeded(99);
    let mut hits = 0;
    for _ in 0..trials {
        let sample = simulate_terminal_prices(s0, drift, vol, 2_000, &mut rng).unwrap();
        let band = confidence_interval(&sample, 95.0).unwrap();
        let realized = simulate_terminal_prices(s0, drift, vol, 1, &mut rng).unwrap();
        if band.contains(realized.values()[0]) {
            hits += 1;
        }
    }
    let coverage = hits as f64 / trials as f64;
    assert!((0.9..=0.99).contains(&coverage), "coverage {}", coverage);
}

#[rstest]
fn test_engine_is_shareable_across_threads() {
    let engine = Arc::new(MonteCarloEngine::new(TestDataFactory::provider([
        TestDataFactory::reference_series(),
    ])));
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let engine = Arc::clone(&engine);
            std::thread::spawn(move || {
                engine
                    .simulate("TEST", 200, 1.0, &mut seeded(i))
                    .map(|r| r.simulations.len())
            })
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap().unwrap(), 200);
    }
}
