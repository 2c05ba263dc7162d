//! Configuration for the simulator

use crate::error::SimResult;
use crate::market_data::StaticRateProvider;
use crate::simulation::DEFAULT_NUM_SIM;
use crate::validation::DEFAULT_CUTOFF;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Simulator configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Directory holding `<TICKER>.csv` price files
    pub data_dir: String,
    /// Draws per simulation when the caller gives none
    pub default_num_sim: usize,
    /// Last date of the backtest training window
    pub cutoff_date: NaiveDate,
    /// T-bill quotes in percent, by tenor
    pub rates: StaticRateProvider,
    /// `tracing` filter directive
    pub log_filter: String,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            data_dir: "data".to_string(),
            default_num_sim: DEFAULT_NUM_SIM,
            cutoff_date: DEFAULT_CUTOFF,
            rates: StaticRateProvider {
                three_month: 5.25,
                six_month: 5.15,
                one_year: 4.85,
            },
            log_filter: "monte_carlo=info,warn".to_string(),
        }
    }
}

impl SimulatorConfig {
    /// Load configuration from an optional file plus `MONTE_CARLO_*` overrides.
    ///
    /// Nested keys use a double underscore, e.g. `MONTE_CARLO_RATES__ONE_YEAR`.
    pub fn load(path: Option<&str>) -> SimResult<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path));
        }
        let settings = builder
            .add_source(
                config::Environment::with_prefix("MONTE_CARLO")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
