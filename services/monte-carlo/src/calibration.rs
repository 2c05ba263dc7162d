//! GBM calibration from historical closes
//!
//! Two volatility conventions live side by side and must not be merged:
//!
//! - [`compute_volatility`]: population standard deviation of daily log
//!   returns scaled by `sqrt(t)`, used by the real-world price simulation
//!   and the backtest.
//! - [`annualized_volatility`]: sample standard deviation (ddof = 1) scaled
//!   by `sqrt(252)`, used by risk-neutral option pricing.

use crate::error::{SimResult, SimulationError};
use crate::market_data::PriceSeries;
use chrono::NaiveDate;
use nalgebra::DMatrix;
use serde::Serialize;
use statrs::statistics::Statistics;
use std::collections::BTreeSet;
use tracing::debug;

/// Trading days per year used to annualize daily volatility
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Daily log returns derived from a price series
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnSeries {
    values: Vec<f64>,
}

impl ReturnSeries {
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Drift and volatility scaled to a horizon of `t` trading days
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CalibrationParams {
    pub drift: f64,
    pub volatility: f64,
}

/// Log returns of a price series
pub fn compute_log_returns(prices: &PriceSeries) -> SimResult<ReturnSeries> {
    log_returns(&prices.closes())
}

/// Log returns `ln(p[i] / p[i-1])` of raw closes
pub fn log_returns(closes: &[f64]) -> SimResult<ReturnSeries> {
    if closes.len() < 2 {
        return Err(SimulationError::insufficient(format!(
            "need at least 2 prices to compute a return, got {}",
            closes.len()
        )));
    }
    if let Some((idx, bad)) = closes
        .iter()
        .enumerate()
        .find(|(_, p)| !(p.is_finite() && **p > 0.0))
    {
        return Err(SimulationError::invalid_data(format!(
            "price at index {} is {}, prices must be positive",
            idx, bad
        )));
    }

    let values = closes.windows(2).map(|w| (w[1] / w[0]).ln()).collect();
    Ok(ReturnSeries { values })
}

/// Drift over `t` periods with the Itô correction: `t * (mean - var / 2)`
pub fn compute_drift(returns: &ReturnSeries, t: f64) -> f64 {
    let mean = returns.values().mean();
    let variance = returns.values().population_variance();
    t * (mean - variance / 2.0)
}

/// Population standard deviation scaled to `t` periods
pub fn compute_volatility(returns: &ReturnSeries, t: f64) -> f64 {
    t.sqrt() * returns.values().population_std_dev()
}

/// Sample standard deviation (ddof = 1) annualized with 252 trading days
pub fn annualized_volatility(returns: &ReturnSeries) -> SimResult<f64> {
    if returns.len() < 2 {
        return Err(SimulationError::insufficient(
            "sample volatility needs at least 2 returns",
        ));
    }
    Ok(returns.values().std_dev() * TRADING_DAYS_PER_YEAR.sqrt())
}

/// Drift and volatility for a horizon of `t` trading days
pub fn calibrate(prices: &PriceSeries, t: f64) -> SimResult<CalibrationParams> {
    validate_horizon(t)?;
    let returns = compute_log_returns(prices)?;
    let params = CalibrationParams {
        drift: compute_drift(&returns, t),
        volatility: compute_volatility(&returns, t),
    };
    debug!(
        "Calibrated {} over {} returns, t={}: drift={:.6}, vol={:.6}",
        prices.ticker(),
        returns.len(),
        t,
        params.drift,
        params.volatility
    );
    Ok(params)
}

pub(crate) fn validate_horizon(t: f64) -> SimResult<()> {
    if !(t.is_finite() && t > 0.0) {
        return Err(SimulationError::invalid_parameter(
            "t",
            format!("horizon must be a positive number of days, got {}", t),
        ));
    }
    Ok(())
}

// ============================================================================
// MULTI-ASSET ALIGNMENT AND COVARIANCE
// ============================================================================

/// Closes of several tickers restricted to the dates they all share
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedCloses {
    pub tickers: Vec<String>,
    pub dates: Vec<NaiveDate>,
    /// One column of closes per ticker, in `dates` order
    pub closes: Vec<Vec<f64>>,
}

impl AlignedCloses {
    /// Closes on the most recent shared date, one per ticker
    pub fn latest(&self) -> Vec<f64> {
        self.closes
            .iter()
            .map(|column| column.last().copied().unwrap_or(f64::NAN))
            .collect()
    }
}

/// Inner-join series on date, dropping dates missing from any series
pub fn align_series(series: &[PriceSeries]) -> SimResult<AlignedCloses> {
    let Some((first, rest)) = series.split_first() else {
        return Err(SimulationError::insufficient("no series to align"));
    };

    let mut shared: BTreeSet<NaiveDate> = first.observations().iter().map(|(d, _)| *d).collect();
    for other in rest {
        let dates: BTreeSet<NaiveDate> = other.observations().iter().map(|(d, _)| *d).collect();
        shared = shared.intersection(&dates).copied().collect();
    }

    if shared.len() < 2 {
        return Err(SimulationError::insufficient(format!(
            "only {} common dates across {} series",
            shared.len(),
            series.len()
        )));
    }

    let dates: Vec<NaiveDate> = shared.into_iter().collect();
    let closes = series
        .iter()
        .map(|s| {
            dates
                .iter()
                .map(|d| s.close_on(*d).unwrap_or(f64::NAN))
                .collect()
        })
        .collect();

    Ok(AlignedCloses {
        tickers: series.iter().map(|s| s.ticker().to_string()).collect(),
        dates,
        closes,
    })
}

/// Symmetric sample covariance matrix of daily log returns
#[derive(Debug, Clone, PartialEq)]
pub struct CovarianceMatrix {
    values: DMatrix<f64>,
}

impl CovarianceMatrix {
    /// Wrap a square matrix
    pub fn new(values: DMatrix<f64>) -> SimResult<Self> {
        if values.nrows() == 0 || !values.is_square() {
            return Err(SimulationError::invalid_data("covariance matrix must be square"));
        }
        Ok(Self { values })
    }

    /// Build from row-major nested vectors
    pub fn from_rows(rows: Vec<Vec<f64>>) -> SimResult<Self> {
        let n = rows.len();
        if rows.iter().any(|row| row.len() != n) {
            return Err(SimulationError::invalid_data("covariance matrix must be square"));
        }
        Self::new(DMatrix::from_fn(n, n, |i, j| rows[i][j]))
    }

    pub fn dim(&self) -> usize {
        self.values.nrows()
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[(i, j)]
    }

    pub fn matrix(&self) -> &DMatrix<f64> {
        &self.values
    }

    /// Lower-triangular factor `L` with `L * L^T = self`.
    ///
    /// Semi-definite input gets a growing diagonal jitter, relative to the
    /// largest variance, until the factorization succeeds. A matrix that
    /// still fails is not positive semi-definite.
    pub fn cholesky(&self) -> SimResult<DMatrix<f64>> {
        let dim = self.dim();
        let scale = (0..dim).map(|i| self.values[(i, i)]).fold(0.0_f64, f64::max);
        if self.values.iter().all(|v| *v == 0.0) {
            return Ok(DMatrix::zeros(dim, dim));
        }

        let mut sigma = self.values.clone();
        let mut jitter = 1e-12 * scale;
        for attempt in 0..8 {
            if let Some(chol) = sigma.clone().cholesky() {
                if attempt > 0 {
                    debug!("Cholesky needed {} jitter steps on a {}x{} matrix", attempt, dim, dim);
                }
                return Ok(chol.l());
            }
            for i in 0..dim {
                sigma[(i, i)] += jitter;
            }
            jitter *= 10.0;
        }

        Err(SimulationError::invalid_data(format!(
            "{}x{} covariance matrix is not positive semi-definite",
            dim, dim
        )))
    }
}

/// Sample covariance (ddof = 1) of the aligned assets' log returns
pub fn compute_covariance(aligned: &AlignedCloses) -> SimResult<CovarianceMatrix> {
    let columns = aligned
        .closes
        .iter()
        .map(|column| log_returns(column).map(|r| r.values))
        .collect::<SimResult<Vec<Vec<f64>>>>()?;

    let observations = columns.first().map_or(0, Vec::len);
    if observations < 2 {
        return Err(SimulationError::insufficient(
            "covariance needs at least 2 aligned returns",
        ));
    }

    // One row per date, one column per asset
    let mut returns = DMatrix::from_fn(observations, columns.len(), |row, col| columns[col][row]);
    for mut column in returns.column_iter_mut() {
        let mean = column.sum() / observations as f64;
        column.add_scalar_mut(-mean);
    }
    let values = returns.tr_mul(&returns) / (observations as f64 - 1.0);

    debug!(
        "Computed {}x{} covariance over {} returns",
        values.nrows(),
        values.ncols(),
        observations
    );
    CovarianceMatrix::new(values)
}

/// Everything the portfolio simulation needs from history
#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioCalibration {
    pub tickers: Vec<String>,
    /// Close on the last shared date, per asset
    pub prices_today: Vec<f64>,
    pub drifts: Vec<f64>,
    pub volatilities: Vec<f64>,
    pub covariance: CovarianceMatrix,
}

/// Calibrate several assets for a joint simulation over `t` trading days.
///
/// Per-asset drift and volatility use each asset's full history; the
/// covariance and today's prices use only the dates all assets share.
pub fn calibrate_portfolio(series: &[PriceSeries], t: f64) -> SimResult<PortfolioCalibration> {
    validate_horizon(t)?;
    let aligned = align_series(series)?;
    let covariance = compute_covariance(&aligned)?;

    let mut drifts = Vec::with_capacity(series.len());
    let mut volatilities = Vec::with_capacity(series.len());
    for s in series {
        let params = calibrate(s, t)?;
        drifts.push(params.drift);
        volatilities.push(params.volatility);
    }

    Ok(PortfolioCalibration {
        tickers: aligned.tickers.clone(),
        prices_today: aligned.latest(),
        drifts,
        volatilities,
        covariance,
    })
}
