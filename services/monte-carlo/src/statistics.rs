//! Summary statistics and percentile confidence intervals

use crate::error::{SimResult, SimulationError};
use crate::simulation::SimulationSample;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

/// Five-number summary of a simulation sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SummaryMetrics {
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
    #[serde(rename = "min_val")]
    pub min: f64,
    #[serde(rename = "max_val")]
    pub max: f64,
}

/// Which standard deviation a summary reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StdDevConvention {
    /// Divide by `n`; used for simulated prices
    #[default]
    Population,
    /// Divide by `n - 1`; used for option payoffs
    Sample,
}

/// Percentile band `[low, high]` of a sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    pub low: f64,
    pub high: f64,
}

impl ConfidenceInterval {
    pub fn contains(&self, value: f64) -> bool {
        self.low <= value && value <= self.high
    }
}

/// Summary with the population standard deviation
pub fn summarize(sample: &SimulationSample) -> SimResult<SummaryMetrics> {
    summarize_with(sample, StdDevConvention::Population)
}

pub fn summarize_with(
    sample: &SimulationSample,
    convention: StdDevConvention,
) -> SimResult<SummaryMetrics> {
    let values = sample.values();
    if values.is_empty() {
        return Err(SimulationError::insufficient("cannot summarize an empty sample"));
    }

    let sorted = sorted_copy(values);
    let std_dev = match convention {
        StdDevConvention::Population => values.population_std_dev(),
        StdDevConvention::Sample => values.std_dev(),
    };

    Ok(SummaryMetrics {
        mean: values.mean(),
        median: percentile(&sorted, 50.0),
        std_dev,
        min: sorted[0],
        max: sorted[sorted.len() - 1],
    })
}

/// Linearly interpolated percentile of an ascending slice.
///
/// `q` is in percent. The rank is `q / 100 * (n - 1)` and values between
/// neighbouring ranks are interpolated, which matches the default method of
/// the common numerical libraries.
pub fn percentile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let rank = (q / 100.0).clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

/// Central interval holding `confidence_level` percent of the sample
pub fn confidence_interval(
    sample: &SimulationSample,
    confidence_level: f64,
) -> SimResult<ConfidenceInterval> {
    validate_confidence_level(confidence_level)?;
    if sample.is_empty() {
        return Err(SimulationError::insufficient(
            "cannot build an interval from an empty sample",
        ));
    }

    let alpha = 100.0 - confidence_level;
    let sorted = sorted_copy(sample.values());
    Ok(ConfidenceInterval {
        low: percentile(&sorted, alpha / 2.0),
        high: percentile(&sorted, 100.0 - alpha / 2.0),
    })
}

/// Accept levels in `(0, 100]`
pub fn validate_confidence_level(confidence_level: f64) -> SimResult<()> {
    if !(confidence_level > 0.0 && confidence_level <= 100.0) {
        return Err(SimulationError::invalid_parameter(
            "confidence_level",
            format!("must be in (0, 100], got {}", confidence_level),
        ));
    }
    Ok(())
}

fn sorted_copy(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted
}
