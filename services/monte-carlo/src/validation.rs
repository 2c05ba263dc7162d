//! Historical backtest of the price simulation
//!
//! The model is trained on closes up to a fixed cutoff, simulated forward by
//! the number of business days to a target date, and the percentile band of
//! the simulated prices is compared with the close actually observed on that
//! date.

use crate::calendar;
use crate::error::{SimResult, SimulationError};
use crate::market_data::MarketDataProvider;
use crate::report::ValidationReport;
use crate::simulation;
use crate::statistics;
use chrono::NaiveDate;
use rand::Rng;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Last date of the training window unless configured otherwise
pub const DEFAULT_CUTOFF: NaiveDate = match NaiveDate::from_ymd_opt(2023, 12, 31) {
    Some(date) => date,
    None => panic!("invalid default cutoff"),
};

/// Train/test backtest against realized closes
#[derive(Clone)]
pub struct HistoricalValidator {
    market_data: Arc<dyn MarketDataProvider>,
    cutoff: NaiveDate,
}

impl std::fmt::Debug for HistoricalValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoricalValidator")
            .field("cutoff", &self.cutoff)
            .finish_non_exhaustive()
    }
}

impl HistoricalValidator {
    pub fn new(market_data: Arc<dyn MarketDataProvider>) -> Self {
        Self::with_cutoff(market_data, DEFAULT_CUTOFF)
    }

    pub fn with_cutoff(market_data: Arc<dyn MarketDataProvider>, cutoff: NaiveDate) -> Self {
        Self { market_data, cutoff }
    }

    pub fn cutoff(&self) -> NaiveDate {
        self.cutoff
    }

    /// Parse an ISO 8601 target and count business days from the cutoff.
    ///
    /// Fails with `InvalidDate` if the date is malformed, not after the
    /// cutoff, on a weekend, or zero business days away.
    pub fn business_days_to(&self, target_date: &str) -> SimResult<(NaiveDate, i64)> {
        let target = NaiveDate::parse_from_str(target_date.trim(), "%Y-%m-%d").map_err(|e| {
            SimulationError::invalid_date(target_date, format!("expected YYYY-MM-DD: {}", e))
        })?;

        if target <= self.cutoff {
            return Err(SimulationError::invalid_date(
                target_date,
                format!("must be after the training cutoff {}", self.cutoff),
            ));
        }
        if !calendar::is_business_day(target) {
            return Err(SimulationError::invalid_date(target_date, "falls on a weekend"));
        }

        let business_days = calendar::business_days_between(self.cutoff, target);
        if business_days <= 0 {
            return Err(SimulationError::invalid_date(
                target_date,
                format!("no business days between {} and target", self.cutoff),
            ));
        }
        Ok((target, business_days))
    }

    /// Run the backtest for `ticker` at `target_date`
    pub fn validate<R: Rng + ?Sized>(
        &self,
        ticker: &str,
        num_sim: usize,
        target_date: &str,
        confidence_level: f64,
        rng: &mut R,
    ) -> SimResult<ValidationReport> {
        statistics::validate_confidence_level(confidence_level)?;
        simulation::validate_num_sim(num_sim)?;

        let (target, business_days) = self.business_days_to(target_date)?;
        debug!("{} is {} business days after {}", target, business_days, self.cutoff);

        let training = self.market_data.get_history(ticker, None, Some(self.cutoff))?;
        let sample =
            simulation::simulate_from_history(&training, num_sim, business_days as f64, rng)?;

        let realized = self.market_data.get_history(ticker, Some(target), Some(target))?;
        let actual_price = realized.close_on(target).ok_or_else(|| {
            SimulationError::no_data(ticker, format!("no close on {} (market closed?)", target))
        })?;

        let interval = statistics::confidence_interval(&sample, confidence_level)?;
        let within_range = interval.contains(actual_price);
        if !within_range {
            warn!(
                "{} close {:.4} on {} outside {}% band [{:.4}, {:.4}]",
                ticker, actual_price, target, confidence_level, interval.low, interval.high
            );
        }
        info!(
            "Backtest {} on {}: actual={:.4}, band=[{:.4}, {:.4}], within={}",
            ticker, target, actual_price, interval.low, interval.high, within_range
        );

        Ok(ValidationReport {
            ticker: ticker.to_string(),
            date: target,
            business_days,
            actual_price,
            confidence_level,
            range_low: interval.low,
            range_high: interval.high,
            within_range,
        })
    }
}
