//! Monte Carlo stock price simulation
//!
//! Estimates the distribution of a stock's or portfolio's future price under
//! Geometric Brownian Motion calibrated from daily closes.
//!
//! Features:
//! - Log-return calibration of drift and volatility
//! - Single-asset and correlated multi-asset terminal price simulation
//! - Risk-neutral Monte Carlo pricing of European calls and puts
//! - Summary metrics and percentile confidence intervals
//! - Train/test backtest against realized closes
//!
//! Market data and T-bill rates come from injected providers, and every
//! simulation takes its random source as an argument.

pub mod calendar;
pub mod calibration;
pub mod config;
pub mod error;
pub mod market_data;
pub mod pricing;
pub mod report;
pub mod simulation;
pub mod statistics;
pub mod validation;

pub use calibration::{
    align_series, annualized_volatility, calibrate, calibrate_portfolio, compute_covariance,
    compute_drift, compute_log_returns, compute_volatility, log_returns, AlignedCloses,
    CalibrationParams, CovarianceMatrix, PortfolioCalibration, ReturnSeries,
    TRADING_DAYS_PER_YEAR,
};
pub use config::SimulatorConfig;
pub use error::{SimResult, SimulationError};
pub use market_data::{
    continuous_rate, CsvMarketData, InMemoryMarketData, MarketDataProvider, PriceSeries,
    RiskFreeRateProvider, StaticRateProvider, Tenor,
};
pub use pricing::{price_option, BlackScholes, OptionPricer, OptionType};
pub use report::{PricingReport, SimulationReport, ValidationReport};
pub use simulation::{
    simulate_portfolio, simulate_risk_neutral, simulate_terminal_prices, MonteCarloEngine,
    SimulationSample, DEFAULT_NUM_SIM,
};
pub use statistics::{
    confidence_interval, percentile, summarize, summarize_with, ConfidenceInterval,
    StdDevConvention, SummaryMetrics,
};
pub use validation::{HistoricalValidator, DEFAULT_CUTOFF};
