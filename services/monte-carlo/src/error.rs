//! Error types for the Monte Carlo simulation core

use thiserror::Error;

/// Simulation error types
///
/// Every failure aborts the whole computation; the core never returns a
/// partially filled result. Mapping a variant to a transport status is the
/// caller's job, see [`SimulationError::kind`].
#[derive(Error, Debug)]
pub enum SimulationError {
    /// Non-positive, non-finite or otherwise malformed price data
    #[error("Invalid data: {message}")]
    InvalidData {
        /// What was wrong with the data
        message: String,
    },

    /// Too few usable observations, or multi-asset series that do not overlap
    #[error("Insufficient data: {message}")]
    InsufficientData {
        /// How much data was available versus required
        message: String,
    },

    /// Out-of-range caller parameter
    #[error("Invalid parameter {parameter}: {reason}")]
    InvalidParameter {
        /// Name of the offending parameter
        parameter: &'static str,
        /// Why the value was rejected
        reason: String,
    },

    /// Target date that cannot be used for a backtest
    #[error("Invalid date {date}: {reason}")]
    InvalidDate {
        /// The date as supplied by the caller
        date: String,
        /// Why the date was rejected
        reason: String,
    },

    /// Market data source returned nothing for the ticker or date
    #[error("No data for {ticker}: {message}")]
    NoData {
        /// Ticker that was requested
        ticker: String,
        /// Detail about the missing range or date
        message: String,
    },

    /// Configuration could not be loaded or deserialized
    #[error("Configuration error: {0}")]
    Configuration(#[from] config::ConfigError),
}

impl SimulationError {
    /// Stable tag for the error kind
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidData { .. } => "invalid_data",
            Self::InsufficientData { .. } => "insufficient_data",
            Self::InvalidParameter { .. } => "invalid_parameter",
            Self::InvalidDate { .. } => "invalid_date",
            Self::NoData { .. } => "no_data",
            Self::Configuration(_) => "configuration",
        }
    }

    pub(crate) fn invalid_parameter(parameter: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            parameter,
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_date(date: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidDate {
            date: date.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn no_data(ticker: impl Into<String>, message: impl Into<String>) -> Self {
        Self::NoData {
            ticker: ticker.into(),
            message: message.into(),
        }
    }

    pub(crate) fn insufficient(message: impl Into<String>) -> Self {
        Self::InsufficientData {
            message: message.into(),
        }
    }

    pub(crate) fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData {
            message: message.into(),
        }
    }
}

/// Type alias for simulation results
pub type SimResult<T> = Result<T, SimulationError>;
