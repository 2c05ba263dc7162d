//! Terminal-value simulation under Geometric Brownian Motion
//!
//! Only terminal values are needed, so each draw uses the exact GBM solution
//! over the whole horizon instead of stepping a path. Every function takes
//! the random source as a parameter: production callers pass
//! `rand::thread_rng()`, tests pass a seeded `StdRng`.

use crate::calibration::{self, PortfolioCalibration};
use crate::error::{SimResult, SimulationError};
use crate::market_data::{MarketDataProvider, PriceSeries};
use crate::report::SimulationReport;
use crate::statistics;
use nalgebra::DVector;
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

/// Default number of draws when the caller does not specify one
pub const DEFAULT_NUM_SIM: usize = 1000;

/// Fixed-length set of simulated terminal values
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SimulationSample {
    values: Vec<f64>,
}

impl SimulationSample {
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.values
    }
}

impl From<Vec<f64>> for SimulationSample {
    fn from(values: Vec<f64>) -> Self {
        Self { values }
    }
}

pub(crate) fn validate_num_sim(num_sim: usize) -> SimResult<()> {
    if num_sim == 0 {
        return Err(SimulationError::invalid_parameter(
            "num_sim",
            "number of simulations must be positive",
        ));
    }
    Ok(())
}

fn validate_spot(name: &'static str, value: f64) -> SimResult<()> {
    if !(value.is_finite() && value > 0.0) {
        return Err(SimulationError::invalid_parameter(
            name,
            format!("must be a positive price, got {}", value),
        ));
    }
    Ok(())
}

fn validate_volatility(value: f64) -> SimResult<()> {
    if !(value.is_finite() && value >= 0.0) {
        return Err(SimulationError::invalid_parameter(
            "volatility",
            format!("must be non-negative, got {}", value),
        ));
    }
    Ok(())
}

/// `s0 * exp(drift + vol * Z)` for `num_sim` independent standard normal draws
pub fn simulate_terminal_prices<R: Rng + ?Sized>(
    s0: f64,
    drift: f64,
    vol: f64,
    num_sim: usize,
    rng: &mut R,
) -> SimResult<SimulationSample> {
    validate_num_sim(num_sim)?;
    validate_spot("s0", s0)?;
    validate_volatility(vol)?;

    let values = (0..num_sim)
        .map(|_| {
            let z: f64 = StandardNormal.sample(rng);
            s0 * (drift + vol * z).exp()
        })
        .collect();
    Ok(SimulationSample { values })
}

/// Terminal prices under the risk-neutral measure.
///
/// `r` is continuously compounded and annual, `sigma` annualized, `time` in
/// years: `s0 * exp((r - sigma^2 / 2) * T + sigma * sqrt(T) * Z)`.
pub fn simulate_risk_neutral<R: Rng + ?Sized>(
    s0: f64,
    r: f64,
    sigma: f64,
    time: f64,
    num_sim: usize,
    rng: &mut R,
) -> SimResult<SimulationSample> {
    if !(time.is_finite() && time > 0.0) {
        return Err(SimulationError::invalid_parameter(
            "T",
            format!("time to maturity must be positive, got {}", time),
        ));
    }
    validate_volatility(sigma)?;
    let drift = (r - 0.5 * sigma * sigma) * time;
    simulate_terminal_prices(s0, drift, sigma * time.sqrt(), num_sim, rng)
}

/// Weighted portfolio values with correlated shocks.
///
/// Each draw takes `Z ~ N(0, Σ)` through the Cholesky factor of the
/// calibrated covariance and values asset `k` at
/// `weight_k * price_k * exp(drift_k + vol_k * Z_k)`. Weights are used as
/// given, without normalization.
pub fn simulate_portfolio<R: Rng + ?Sized>(
    calibration: &PortfolioCalibration,
    weights: &[f64],
    num_sim: usize,
    rng: &mut R,
) -> SimResult<SimulationSample> {
    validate_num_sim(num_sim)?;
    let n = calibration.covariance.dim();
    if weights.len() != n {
        return Err(SimulationError::invalid_parameter(
            "weights",
            format!("expected {} weights, got {}", n, weights.len()),
        ));
    }
    let per_asset = [
        calibration.prices_today.len(),
        calibration.drifts.len(),
        calibration.volatilities.len(),
    ];
    if per_asset.iter().any(|len| *len != n) {
        return Err(SimulationError::invalid_parameter(
            "calibration",
            format!(
                "expected {} prices, drifts and volatilities, got {:?}",
                n, per_asset
            ),
        ));
    }

    let factor = calibration.covariance.cholesky()?;
    let mut eps = DVector::<f64>::zeros(n);
    let mut values = Vec::with_capacity(num_sim);

    for _ in 0..num_sim {
        for e in eps.iter_mut() {
            *e = StandardNormal.sample(rng);
        }
        let z = &factor * &eps;

        let mut total = 0.0;
        for k in 0..n {
            total += weights[k]
                * calibration.prices_today[k]
                * (calibration.drifts[k] + calibration.volatilities[k] * z[k]).exp();
        }
        values.push(total);
    }

    Ok(SimulationSample { values })
}

// ============================================================================
// MONTE CARLO ENGINE
// ============================================================================

/// Price simulation backed by an injected market data source
#[derive(Clone)]
pub struct MonteCarloEngine {
    market_data: Arc<dyn MarketDataProvider>,
}

impl std::fmt::Debug for MonteCarloEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MonteCarloEngine").finish_non_exhaustive()
    }
}

impl MonteCarloEngine {
    pub fn new(market_data: Arc<dyn MarketDataProvider>) -> Self {
        Self { market_data }
    }

    /// Simulate one ticker `t` trading days ahead from its latest close
    pub fn simulate<R: Rng + ?Sized>(
        &self,
        ticker: &str,
        num_sim: usize,
        t: f64,
        rng: &mut R,
    ) -> SimResult<SimulationReport> {
        validate_num_sim(num_sim)?;
        calibration::validate_horizon(t)?;

        let history = self.market_data.get_history(ticker, None, None)?;
        let sample = simulate_from_history(&history, num_sim, t, rng)?;
        let metrics = statistics::summarize(&sample)?;

        info!(
            "Simulated {} x{} over {} days: mean={:.4}, median={:.4}",
            ticker, num_sim, t, metrics.mean, metrics.median
        );
        Ok(SimulationReport::new(sample, metrics))
    }

    /// Simulate a weighted basket `t` trading days ahead
    pub fn simulate_portfolio<R: Rng + ?Sized>(
        &self,
        stocks: &[String],
        weights: &[f64],
        num_sim: usize,
        t: f64,
        rng: &mut R,
    ) -> SimResult<SimulationReport> {
        if stocks.len() != weights.len() {
            return Err(SimulationError::invalid_parameter(
                "weights",
                format!("{} stocks but {} weights", stocks.len(), weights.len()),
            ));
        }
        if stocks.is_empty() {
            return Err(SimulationError::invalid_parameter(
                "stocks",
                "at least one ticker is required",
            ));
        }
        validate_num_sim(num_sim)?;
        calibration::validate_horizon(t)?;

        let histories = stocks
            .iter()
            .map(|ticker| self.market_data.get_history(ticker, None, None))
            .collect::<SimResult<Vec<PriceSeries>>>()?;

        let portfolio = calibration::calibrate_portfolio(&histories, t)?;
        debug!(
            "Portfolio {:?}: prices_today={:?}, drifts={:?}, vols={:?}",
            portfolio.tickers, portfolio.prices_today, portfolio.drifts, portfolio.volatilities
        );

        let sample = simulate_portfolio(&portfolio, weights, num_sim, rng)?;
        let metrics = statistics::summarize(&sample)?;

        info!(
            "Simulated portfolio of {} assets x{} over {} days: mean={:.4}",
            stocks.len(),
            num_sim,
            t,
            metrics.mean
        );
        Ok(SimulationReport::new(sample, metrics))
    }
}

/// Calibrate on `history` and simulate from its last close
pub(crate) fn simulate_from_history<R: Rng + ?Sized>(
    history: &PriceSeries,
    num_sim: usize,
    t: f64,
    rng: &mut R,
) -> SimResult<SimulationSample> {
    let params = calibration::calibrate(history, t)?;
    let (_, s0) = history
        .last()
        .ok_or_else(|| SimulationError::no_data(history.ticker(), "empty history"))?;
    simulate_terminal_prices(s0, params.drift, params.volatility, num_sim, rng)
}
