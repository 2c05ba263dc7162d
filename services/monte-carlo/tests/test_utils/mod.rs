//! Test utilities and factories for Monte Carlo tests

use chrono::NaiveDate;
use mockall::mock;
use monte_carlo::*;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, StandardNormal};
use std::sync::{Arc, Once};

/// Closes of the reference ticker used across the suite
pub const TEST_CLOSES: [f64; 5] = [100.0, 101.0, 99.0, 102.0, 100.0];

static TRACING: Once = Once::new();

/// Install a test subscriber once per process
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("monte_carlo=debug")
            .with_test_writer()
            .try_init();
    });
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Deterministic random source
pub fn seeded(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

mock! {
    pub MarketData {}

    impl MarketDataProvider for MarketData {
        fn get_history(
            &self,
            ticker: &str,
            start: Option<NaiveDate>,
            end: Option<NaiveDate>,
        ) -> SimResult<PriceSeries>;
    }
}

/// Provider that fails the test if it is ever queried
pub fn untouched_market_data() -> Arc<dyn MarketDataProvider> {
    let mut mock = MockMarketData::new();
    mock.expect_get_history().never();
    Arc::new(mock)
}

/// Factory for creating test price series
pub struct TestDataFactory;

impl TestDataFactory {
    /// The five-close reference series, on weekdays from 2023-12-20
    pub fn reference_series() -> PriceSeries {
        PriceSeries::from_daily_closes("TEST", date(2023, 12, 20), &TEST_CLOSES)
    }

    /// Series with a constant daily log return
    pub fn constant_growth(
        ticker: &str,
        start: NaiveDate,
        days: usize,
        start_price: f64,
        daily_log_return: f64,
    ) -> PriceSeries {
        let closes: Vec<f64> = (0..days)
            .map(|i| start_price * (daily_log_return * i as f64).exp())
            .collect();
        PriceSeries::from_daily_closes(ticker, start, &closes)
    }

    /// GBM path with the given daily drift and volatility
    pub fn random_walk(
        ticker: &str,
        start: NaiveDate,
        days: usize,
        start_price: f64,
        daily_drift: f64,
        daily_vol: f64,
        seed: u64,
    ) -> PriceSeries {
        let mut rng = seeded(seed);
        let mut price = start_price;
        let mut closes = Vec::with_capacity(days);
        for _ in 0..days {
            closes.push(price);
            let z: f64 = StandardNormal.sample(&mut rng);
            price *= (daily_drift + daily_vol * z).exp();
        }
        PriceSeries::from_daily_closes(ticker, start, &closes)
    }

    /// Two series driven by the same shocks, so perfectly correlated returns
    pub fn correlated_pair(days: usize, seed: u64) -> (PriceSeries, PriceSeries) {
        let mut rng = seeded(seed);
        let mut a = 100.0;
        let mut b = 50.0;
        let mut closes_a = Vec::with_capacity(days);
        let mut closes_b = Vec::with_capacity(days);
        for _ in 0..days {
            closes_a.push(a);
            closes_b.push(b);
            let z: f64 = StandardNormal.sample(&mut rng);
            a *= (0.01 * z).exp();
            b *= (0.02 * z).exp();
        }
        let start = date(2023, 1, 2);
        (
            PriceSeries::from_daily_closes("AAA", start, &closes_a),
            PriceSeries::from_daily_closes("BBB", start, &closes_b),
        )
    }

    /// In-memory provider holding every given series
    pub fn provider(series: impl IntoIterator<Item = PriceSeries>) -> Arc<dyn MarketDataProvider> {
        let mut store = InMemoryMarketData::new();
        for s in series {
            store.insert(s);
        }
        Arc::new(store)
    }
}

/// Common assertions for simulation results
pub struct TestAssertions;

impl TestAssertions {
    /// Summary ordering that every non-empty sample must satisfy
    pub fn assert_metrics_consistent(metrics: &SummaryMetrics) {
        assert!(metrics.min <= metrics.median, "min {} > median {}", metrics.min, metrics.median);
        assert!(metrics.median <= metrics.max, "median {} > max {}", metrics.median, metrics.max);
        assert!(
            metrics.min <= metrics.mean && metrics.mean <= metrics.max,
            "mean {} outside [min, max]",
            metrics.mean
        );
        assert!(metrics.std_dev >= 0.0, "negative std_dev {}", metrics.std_dev);
    }

    pub fn assert_within(value: f64, expected: f64, tolerance: f64, name: &str) {
        assert!(
            (value - expected).abs() <= tolerance,
            "{} = {} not within {} of {}",
            name,
            value,
            tolerance,
            expected
        );
    }
}
