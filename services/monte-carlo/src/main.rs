//! Monte Carlo Simulator CLI
//!
//! Runs simulations, option pricing and backtests against CSV price files
//! and prints the JSON payloads to stdout.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use monte_carlo::{
    CsvMarketData, HistoricalValidator, MarketDataProvider, MonteCarloEngine, OptionPricer,
    OptionType, SimulatorConfig,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "monte-carlo", about = "GBM Monte Carlo price simulator")]
struct Cli {
    /// Configuration file (TOML, YAML or JSON)
    #[arg(short, long)]
    config: Option<String>,

    /// Override the price data directory
    #[arg(long)]
    data_dir: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Simulate one ticker's price `t` trading days ahead
    Simulate {
        ticker: String,
        #[arg(long)]
        num_sim: Option<usize>,
        #[arg(short, long, default_value_t = 1.0)]
        t: f64,
    },
    /// Simulate a weighted portfolio
    Portfolio {
        /// Comma-separated tickers
        #[arg(long, value_delimiter = ',')]
        stocks: Vec<String>,
        /// Comma-separated weights, same order as the tickers
        #[arg(long, value_delimiter = ',')]
        weights: Vec<f64>,
        #[arg(long)]
        num_sim: Option<usize>,
        #[arg(short, long, default_value_t = 1.0)]
        t: f64,
    },
    /// Price a European option by Monte Carlo
    #[command(name = "option")]
    Price {
        ticker: String,
        /// Days to expiry
        #[arg(short, long)]
        t: f64,
        /// Strike price
        #[arg(short = 'k', long)]
        strike: f64,
        /// Price a put instead of a call
        #[arg(long)]
        put: bool,
        #[arg(long)]
        num_sim: Option<usize>,
    },
    /// Backtest the simulation against a realized close
    Backtest {
        ticker: String,
        /// Target date, YYYY-MM-DD
        #[arg(long)]
        date: String,
        #[arg(long, default_value_t = 95.0)]
        confidence_level: f64,
        #[arg(long)]
        num_sim: Option<usize>,
    },
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let mut config = SimulatorConfig::load(cli.config.as_deref())
        .context("Failed to load simulator configuration")?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_filter.as_str()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    info!("Reading prices from {}", config.data_dir);
    let market_data: Arc<dyn MarketDataProvider> = Arc::new(CsvMarketData::new(&config.data_dir));
    let mut rng = rand::thread_rng();

    let output = match cli.command {
        Command::Simulate { ticker, num_sim, t } => {
            let engine = MonteCarloEngine::new(market_data);
            let report = engine
                .simulate(&ticker, num_sim.unwrap_or(config.default_num_sim), t, &mut rng)
                .with_context(|| format!("Simulation failed for {}", ticker))?;
            serde_json::to_string(&report)?
        }
        Command::Portfolio {
            stocks,
            weights,
            num_sim,
            t,
        } => {
            let engine = MonteCarloEngine::new(market_data);
            let report = engine
                .simulate_portfolio(
                    &stocks,
                    &weights,
                    num_sim.unwrap_or(config.default_num_sim),
                    t,
                    &mut rng,
                )
                .with_context(|| format!("Portfolio simulation failed for {:?}", stocks))?;
            serde_json::to_string(&report)?
        }
        Command::Price {
            ticker,
            t,
            strike,
            put,
            num_sim,
        } => {
            let pricer = OptionPricer::new(market_data, Arc::new(config.rates));
            let option_type = if put { OptionType::Put } else { OptionType::Call };
            let report = pricer
                .price(
                    &ticker,
                    t,
                    num_sim.unwrap_or(config.default_num_sim),
                    strike,
                    option_type,
                    &mut rng,
                )
                .with_context(|| format!("Option pricing failed for {}", ticker))?;
            serde_json::to_string(&report)?
        }
        Command::Backtest {
            ticker,
            date,
            confidence_level,
            num_sim,
        } => {
            let validator = HistoricalValidator::with_cutoff(market_data, config.cutoff_date);
            let report = validator
                .validate(
                    &ticker,
                    num_sim.unwrap_or(config.default_num_sim),
                    &date,
                    confidence_level,
                    &mut rng,
                )
                .with_context(|| format!("Backtest failed for {} on {}", ticker, date))?;
            serde_json::to_string(&report)?
        }
    };

    println!("{}", output);
    Ok(())
}
