//! European option pricing by risk-neutral Monte Carlo
//!
//! Volatility here is the annualized sample volatility of daily log returns
//! and the rate is the continuously-compounded T-bill rate for the horizon's
//! tenor. The closed-form Black-Scholes price is kept as a benchmark for the
//! Monte Carlo estimate.

use crate::calibration::{self, TRADING_DAYS_PER_YEAR};
use crate::error::{SimResult, SimulationError};
use crate::market_data::{self, MarketDataProvider, RiskFreeRateProvider, Tenor};
use crate::report::PricingReport;
use crate::simulation::{self, SimulationSample};
use crate::statistics::{self, StdDevConvention};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// Option type for derivatives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OptionType {
    /// Call option - right to buy the underlying at strike price
    Call,
    /// Put option - right to sell the underlying at strike price
    Put,
}

impl OptionType {
    pub fn from_is_call(is_call: bool) -> Self {
        if is_call { OptionType::Call } else { OptionType::Put }
    }

    /// Payoff at expiry for a terminal price
    pub fn payoff(&self, terminal: f64, strike: f64) -> f64 {
        match self {
            OptionType::Call => (terminal - strike).max(0.0),
            OptionType::Put => (strike - terminal).max(0.0),
        }
    }
}

// ============================================================================
// MONTE CARLO PRICING
// ============================================================================

/// Payoff of every simulated terminal price
pub fn payoffs(
    terminal: &SimulationSample,
    strike: f64,
    option_type: OptionType,
) -> SimulationSample {
    terminal
        .values()
        .iter()
        .map(|&s_t| option_type.payoff(s_t, strike))
        .collect::<Vec<f64>>()
        .into()
}

/// `exp(-r * T) * mean(payoffs)`
pub fn discounted_mean(payoffs: &SimulationSample, r: f64, time: f64) -> f64 {
    let values = payoffs.values();
    if values.is_empty() {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    (-r * time).exp() * mean
}

/// Monte Carlo price of a European option plus the per-draw payoffs.
///
/// `r` continuously compounded, `sigma` annualized, `time` in years.
#[allow(clippy::too_many_arguments)]
pub fn price_option<R: Rng + ?Sized>(
    s0: f64,
    r: f64,
    sigma: f64,
    time: f64,
    strike: f64,
    num_sim: usize,
    option_type: OptionType,
    rng: &mut R,
) -> SimResult<(f64, SimulationSample)> {
    simulation::validate_num_sim(num_sim)?;
    if !(strike.is_finite() && strike > 0.0) {
        return Err(SimulationError::invalid_parameter(
            "strike",
            format!("must be positive, got {}", strike),
        ));
    }

    let terminal = simulation::simulate_risk_neutral(s0, r, sigma, time, num_sim, rng)?;
    let payoffs = payoffs(&terminal, strike, option_type);
    let price = discounted_mean(&payoffs, r, time);
    Ok((price, payoffs))
}

// ============================================================================
// BLACK-SCHOLES REFERENCE
// ============================================================================

/// Closed-form Black-Scholes price for European options
#[derive(Debug)]
pub struct BlackScholes;

impl BlackScholes {
    /// Standard normal cumulative distribution function
    pub fn norm_cdf(x: f64) -> f64 {
        0.5 * (1.0 + libm::erf(x / std::f64::consts::SQRT_2))
    }

    pub fn d1(s: f64, k: f64, r: f64, sigma: f64, t: f64) -> f64 {
        ((s / k).ln() + (r + 0.5 * sigma * sigma) * t) / (sigma * t.sqrt())
    }

    pub fn d2(s: f64, k: f64, r: f64, sigma: f64, t: f64) -> f64 {
        Self::d1(s, k, r, sigma, t) - sigma * t.sqrt()
    }

    pub fn price(
        option_type: OptionType,
        spot: f64,
        strike: f64,
        rate: f64,
        volatility: f64,
        time: f64,
    ) -> f64 {
        if time <= 0.0 || volatility <= 0.0 {
            let forward_intrinsic = spot - strike * (-rate * time.max(0.0)).exp();
            return match option_type {
                OptionType::Call => forward_intrinsic.max(0.0),
                OptionType::Put => (-forward_intrinsic).max(0.0),
            };
        }

        let d1 = Self::d1(spot, strike, rate, volatility, time);
        let d2 = Self::d2(spot, strike, rate, volatility, time);
        let discount = (-rate * time).exp();

        match option_type {
            OptionType::Call => spot * Self::norm_cdf(d1) - strike * discount * Self::norm_cdf(d2),
            OptionType::Put => strike * discount * Self::norm_cdf(-d2) - spot * Self::norm_cdf(-d1),
        }
    }
}

// ============================================================================
// PRICER
// ============================================================================

/// Prices options on a ticker from its history and the current T-bill curve
#[derive(Clone)]
pub struct OptionPricer {
    market_data: Arc<dyn MarketDataProvider>,
    rates: Arc<dyn RiskFreeRateProvider>,
}

impl std::fmt::Debug for OptionPricer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OptionPricer").finish_non_exhaustive()
    }
}

impl OptionPricer {
    pub fn new(
        market_data: Arc<dyn MarketDataProvider>,
        rates: Arc<dyn RiskFreeRateProvider>,
    ) -> Self {
        Self { market_data, rates }
    }

    /// Continuously-compounded rate for a horizon in days
    pub fn risk_free_rate(&self, t_days: f64) -> SimResult<f64> {
        let tenor = Tenor::for_horizon(t_days);
        let quoted = self.rates.get_rate(tenor)?;
        debug!("Using {} ({:?}) at {}% for {} days", tenor.series_id(), tenor, quoted, t_days);
        Ok(market_data::continuous_rate(quoted))
    }

    /// Price a European option expiring `t_days` trading days from the latest close
    pub fn price<R: Rng + ?Sized>(
        &self,
        ticker: &str,
        t_days: f64,
        num_sim: usize,
        strike: f64,
        option_type: OptionType,
        rng: &mut R,
    ) -> SimResult<PricingReport> {
        simulation::validate_num_sim(num_sim)?;
        calibration::validate_horizon(t_days)?;

        let history = self.market_data.get_history(ticker, None, None)?;
        let returns = calibration::compute_log_returns(&history)?;
        let sigma = calibration::annualized_volatility(&returns)?;
        let r = self.risk_free_rate(t_days)?;
        let time = t_days / TRADING_DAYS_PER_YEAR;
        let (_, s0) = history
            .last()
            .ok_or_else(|| SimulationError::no_data(ticker, "empty history"))?;

        let (price, payoffs) = price_option(s0, r, sigma, time, strike, num_sim, option_type, rng)?;
        let metrics = statistics::summarize_with(&payoffs, StdDevConvention::Sample)?;

        info!(
            "Priced {:?} on {} K={} T={:.4}y: mc={:.4}, bs={:.4}, sigma={:.4}, r={:.4}",
            option_type,
            ticker,
            strike,
            time,
            price,
            BlackScholes::price(option_type, s0, strike, r, sigma, time),
            sigma,
            r
        );
        Ok(PricingReport::new(payoffs, metrics, price))
    }
}
