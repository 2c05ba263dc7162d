//! Market data collaborators
//!
//! The simulation core never fetches data itself. Historical closes and
//! T-bill rates come in through [`MarketDataProvider`] and
//! [`RiskFreeRateProvider`], which callers inject. Two adapters ship with the
//! crate: an in-memory store for embedding and tests, and a CSV directory
//! reader used by the command-line driver.

use crate::calendar;
use crate::error::{SimResult, SimulationError};
use chrono::NaiveDate;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Chronologically ordered daily closing prices for one ticker
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceSeries {
    ticker: String,
    observations: Vec<(NaiveDate, f64)>,
}

impl PriceSeries {
    /// Build a series, sorting by date and rejecting duplicate dates
    pub fn new(
        ticker: impl Into<String>,
        mut observations: Vec<(NaiveDate, f64)>,
    ) -> SimResult<Self> {
        let ticker = ticker.into();
        observations.sort_by_key(|(date, _)| *date);

        if let Some(pair) = observations.windows(2).find(|w| w[0].0 == w[1].0) {
            return Err(SimulationError::invalid_data(format!(
                "duplicate observation for {} on {}",
                ticker, pair[0].0
            )));
        }

        Ok(Self { ticker, observations })
    }

    /// Build a series from consecutive closes, one per weekday starting at `start`
    pub fn from_daily_closes(
        ticker: impl Into<String>,
        start: NaiveDate,
        closes: &[f64],
    ) -> Self {
        let mut observations = Vec::with_capacity(closes.len());
        let mut date = calendar::roll_to_weekday(start);
        for &close in closes {
            observations.push((date, close));
            date = calendar::next_weekday(date);
        }
        Self {
            ticker: ticker.into(),
            observations,
        }
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn observations(&self) -> &[(NaiveDate, f64)] {
        &self.observations
    }

    /// Closing prices in date order
    pub fn closes(&self) -> Vec<f64> {
        self.observations.iter().map(|(_, close)| *close).collect()
    }

    /// Most recent observation
    pub fn last(&self) -> Option<(NaiveDate, f64)> {
        self.observations.last().copied()
    }

    /// Close observed exactly on `date`
    pub fn close_on(&self, date: NaiveDate) -> Option<f64> {
        self.observations
            .binary_search_by_key(&date, |(d, _)| *d)
            .ok()
            .map(|idx| self.observations[idx].1)
    }

    /// Sub-series with both bounds inclusive
    pub fn between(&self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        let observations = self
            .observations
            .iter()
            .filter(|(date, _)| start.is_none_or(|s| *date >= s) && end.is_none_or(|e| *date <= e))
            .copied()
            .collect();
        Self {
            ticker: self.ticker.clone(),
            observations,
        }
    }
}

/// Source of historical daily closes
#[cfg_attr(test, mockall::automock)]
pub trait MarketDataProvider: Send + Sync {
    /// Closes for `ticker` between `start` and `end`, both inclusive.
    ///
    /// Returns the full available history when neither bound is given. An
    /// unknown ticker or an empty range fails with `NoData`.
    fn get_history(
        &self,
        ticker: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> SimResult<PriceSeries>;
}

/// T-bill tenor used to pick the risk-free rate for a pricing horizon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tenor {
    /// 3-month bill, horizons up to 75 days
    ThreeMonth,
    /// 6-month bill, horizons up to 225 days
    SixMonth,
    /// 1-year bill, anything longer
    OneYear,
}

impl Tenor {
    /// Tenor matching a horizon measured in days
    pub fn for_horizon(t_days: f64) -> Self {
        if t_days <= 75.0 {
            Tenor::ThreeMonth
        } else if t_days <= 225.0 {
            Tenor::SixMonth
        } else {
            Tenor::OneYear
        }
    }

    /// FRED series identifier for the tenor
    pub fn series_id(&self) -> &'static str {
        match self {
            Tenor::ThreeMonth => "DTB3",
            Tenor::SixMonth => "DTB6",
            Tenor::OneYear => "DTB1YR",
        }
    }
}

/// Source of annualized T-bill rates, quoted in percent
#[cfg_attr(test, mockall::automock)]
pub trait RiskFreeRateProvider: Send + Sync {
    fn get_rate(&self, tenor: Tenor) -> SimResult<f64>;
}

/// Convert an annual percentage rate to a continuously-compounded rate
pub fn continuous_rate(annual_pct: f64) -> f64 {
    (1.0 + annual_pct / 100.0).ln()
}

// ============================================================================
// IN-MEMORY ADAPTERS
// ============================================================================

/// Market data held in memory, keyed by ticker
#[derive(Debug, Clone, Default)]
pub struct InMemoryMarketData {
    series: FxHashMap<String, PriceSeries>,
}

impl InMemoryMarketData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a series under its own ticker, replacing any previous one
    pub fn with_series(mut self, series: PriceSeries) -> Self {
        self.insert(series);
        self
    }

    pub fn insert(&mut self, series: PriceSeries) {
        self.series.insert(series.ticker().to_string(), series);
    }
}

impl MarketDataProvider for InMemoryMarketData {
    fn get_history(
        &self,
        ticker: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> SimResult<PriceSeries> {
        let series = self
            .series
            .get(ticker)
            .ok_or_else(|| SimulationError::no_data(ticker, "unknown ticker"))?;

        let window = series.between(start, end);
        if window.is_empty() {
            return Err(SimulationError::no_data(
                ticker,
                format!("no observations between {:?} and {:?}", start, end),
            ));
        }
        debug!("Served {} observations for {}", window.len(), ticker);
        Ok(window)
    }
}

/// Fixed T-bill quotes, one per tenor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StaticRateProvider {
    pub three_month: f64,
    pub six_month: f64,
    pub one_year: f64,
}

impl StaticRateProvider {
    /// Same quote for every tenor
    pub fn flat(rate_pct: f64) -> Self {
        Self {
            three_month: rate_pct,
            six_month: rate_pct,
            one_year: rate_pct,
        }
    }
}

impl RiskFreeRateProvider for StaticRateProvider {
    fn get_rate(&self, tenor: Tenor) -> SimResult<f64> {
        Ok(match tenor {
            Tenor::ThreeMonth => self.three_month,
            Tenor::SixMonth => self.six_month,
            Tenor::OneYear => self.one_year,
        })
    }
}

// ============================================================================
// CSV ADAPTER
// ============================================================================

#[derive(Debug, Deserialize)]
struct CloseRecord {
    #[serde(rename = "Date")]
    date: NaiveDate,
    #[serde(rename = "Close")]
    close: f64,
}

/// Reads `<data_dir>/<TICKER>.csv` files with `Date,Close` columns
#[derive(Debug, Clone)]
pub struct CsvMarketData {
    data_dir: PathBuf,
}

impl CsvMarketData {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
        }
    }

    fn path_for(&self, ticker: &str) -> PathBuf {
        self.data_dir.join(format!("{}.csv", ticker))
    }

    fn load(&self, ticker: &str) -> SimResult<PriceSeries> {
        let path = self.path_for(ticker);
        if !path.is_file() {
            return Err(SimulationError::no_data(
                ticker,
                format!("no price file at {}", path.display()),
            ));
        }

        let mut reader = csv::Reader::from_path(&path).map_err(|e| {
            SimulationError::no_data(ticker, format!("cannot open {}: {}", path.display(), e))
        })?;

        let mut observations = Vec::new();
        for (line, record) in reader.deserialize::<CloseRecord>().enumerate() {
            let record = record.map_err(|e| {
                SimulationError::invalid_data(format!(
                    "{} row {}: {}",
                    path.display(),
                    line + 1,
                    e
                ))
            })?;
            observations.push((record.date, record.close));
        }

        // Vendor exports occasionally repeat the last row; keep the first
        let before = observations.len();
        observations.sort_by_key(|(date, _)| *date);
        observations.dedup_by_key(|(date, _)| *date);
        if observations.len() != before {
            warn!(
                "Dropped {} duplicate rows from {}",
                before - observations.len(),
                path.display()
            );
        }

        PriceSeries::new(ticker, observations)
    }
}

impl MarketDataProvider for CsvMarketData {
    fn get_history(
        &self,
        ticker: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> SimResult<PriceSeries> {
        let window = self.load(ticker)?.between(start, end);
        if window.is_empty() {
            return Err(SimulationError::no_data(
                ticker,
                format!("no observations between {:?} and {:?}", start, end),
            ));
        }
        debug!("Loaded {} observations for {} from CSV", window.len(), ticker);
        Ok(window)
    }
}
