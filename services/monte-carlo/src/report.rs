//! Output payloads handed to the surrounding layer
//!
//! Field names are part of the wire contract; callers serialize these with
//! `serde_json` unchanged.

use crate::simulation::SimulationSample;
use crate::statistics::SummaryMetrics;
use chrono::NaiveDate;
use serde::Serialize;

/// Simulated prices or portfolio values with their summary
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationReport {
    pub simulations: SimulationSample,
    pub metrics: SummaryMetrics,
}

impl SimulationReport {
    pub fn new(simulations: SimulationSample, metrics: SummaryMetrics) -> Self {
        Self { simulations, metrics }
    }
}

/// Option payoffs, their summary and the discounted Monte Carlo price
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricingReport {
    pub payoffs: SimulationSample,
    pub metrics: SummaryMetrics,
    pub price: f64,
}

impl PricingReport {
    pub fn new(payoffs: SimulationSample, metrics: SummaryMetrics, price: f64) -> Self {
        Self { payoffs, metrics, price }
    }
}

/// Outcome of a backtest against a realized close
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    pub ticker: String,
    pub date: NaiveDate,
    pub business_days: i64,
    pub actual_price: f64,
    pub confidence_level: f64,
    pub range_low: f64,
    pub range_high: f64,
    pub within_range: bool,
}
