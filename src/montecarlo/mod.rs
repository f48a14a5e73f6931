//! Monte Carlo forecasting core.
//!
//! Everything in this module is pure, synchronous and total over its inputs:
//!
//! - [`WeightSpecification`]: observed durations grouped by estimation size
//! - [`WeightedSampler`]: empirical resampling with a fallback for unseen sizes
//! - [`simulate`] / [`forecast`]: the trial loop and its quantile reduction
//! - [`quantile`]: ceiling-biased linear interpolation percentile
//!
//! Randomness is always injected as a [`rand::Rng`], so callers decide between
//! a reproducible seeded generator and an entropy-seeded one.

pub mod engine;
pub mod quantile;
pub mod sampler;
pub mod weights;

use serde::{Deserialize, Serialize};

pub use engine::{
    Confidence, ForecastResult, QuantileBand, REPORT_BANDS, forecast, simulate, trial_outcome,
};
pub use quantile::quantile;
pub use sampler::{DAYS_PER_POINT, WeightedSampler};
pub use weights::{WeightSpecification, build_weight_spec};

/// Trials run when no usable iteration count is given.
pub const DEFAULT_ITERATIONS: usize = 1000;

/// Upper bound on trials per run; larger requests are clamped.
pub const MAX_ITERATIONS: usize = 10_000_000;

/// Tasks worked on concurrently when no usable parallelism is given.
pub const DEFAULT_PARALLELISM: u32 = 1;

/// Parameters of one simulation run.
///
/// Always holds sanitized values: `1 <= iterations <= MAX_ITERATIONS` and
/// `parallelism >= 1`. Deserializing goes through [`SimulationConfig::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawSimulationConfig")]
pub struct SimulationConfig {
    iterations: usize,
    parallelism: u32,
    /// Seed for a reproducible run. `None` means entropy-seeded.
    pub seed: Option<u64>,
}

/// Unchecked wire form of [`SimulationConfig`].
#[derive(Deserialize)]
struct RawSimulationConfig {
    #[serde(default)]
    iterations: i64,
    #[serde(default)]
    parallelism: i64,
    #[serde(default)]
    seed: Option<u64>,
}

impl From<RawSimulationConfig> for SimulationConfig {
    fn from(raw: RawSimulationConfig) -> Self {
        Self::new(raw.iterations, raw.parallelism).with_seed(raw.seed)
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
            parallelism: DEFAULT_PARALLELISM,
            seed: None,
        }
    }
}

impl SimulationConfig {
    /// Build a config, replacing unusable values instead of failing.
    ///
    /// Zero or negative iterations fall back to [`DEFAULT_ITERATIONS`] and
    /// more than [`MAX_ITERATIONS`] are clamped to it; zero or negative
    /// parallelism is raised to 1.
    pub fn new(iterations: i64, parallelism: i64) -> Self {
        let iterations = if iterations >= 1 {
            let requested = usize::try_from(iterations).unwrap_or(MAX_ITERATIONS);
            if requested > MAX_ITERATIONS {
                tracing::warn!(requested, max = MAX_ITERATIONS, "clamping iterations");
            }
            requested.min(MAX_ITERATIONS)
        } else {
            DEFAULT_ITERATIONS
        };
        let parallelism = u32::try_from(parallelism.max(1)).unwrap_or(u32::MAX);
        Self {
            iterations,
            parallelism,
            seed: None,
        }
    }

    /// Build a config from unparsed user input.
    ///
    /// Missing or non-numeric values are treated like zero and therefore
    /// replaced by the defaults.
    pub fn from_raw(iterations: Option<&str>, parallelism: Option<&str>) -> Self {
        Self::new(parse_lenient(iterations), parse_lenient(parallelism))
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn parallelism(&self) -> u32 {
        self.parallelism
    }
}

fn parse_lenient(raw: Option<&str>) -> i64 {
    let Some(raw) = raw.map(str::trim) else {
        return 0;
    };
    if let Ok(v) = raw.parse::<i64>() {
        return v;
    }
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => v.trunc().clamp(i64::MIN as f64, i64::MAX as f64) as i64,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_constants() {
        let cfg = SimulationConfig::default();
        assert_eq!(cfg.iterations(), 1000);
        assert_eq!(cfg.parallelism(), 1);
        assert_eq!(cfg.seed, None);
    }

    #[test]
    fn non_positive_values_are_sanitized() {
        let cfg = SimulationConfig::new(0, 0);
        assert_eq!(cfg.iterations(), DEFAULT_ITERATIONS);
        assert_eq!(cfg.parallelism(), 1);

        let cfg = SimulationConfig::new(-5, -3);
        assert_eq!(cfg.iterations(), DEFAULT_ITERATIONS);
        assert_eq!(cfg.parallelism(), 1);
    }

    #[test]
    fn valid_values_are_kept() {
        let cfg = SimulationConfig::new(250, 4);
        assert_eq!(cfg.iterations(), 250);
        assert_eq!(cfg.parallelism(), 4);
    }

    #[test]
    fn raw_input_is_parsed_leniently() {
        let cfg = SimulationConfig::from_raw(Some("abc"), Some("many"));
        assert_eq!(cfg.iterations(), DEFAULT_ITERATIONS);
        assert_eq!(cfg.parallelism(), 1);

        let cfg = SimulationConfig::from_raw(Some(" 500 "), Some("3"));
        assert_eq!(cfg.iterations(), 500);
        assert_eq!(cfg.parallelism(), 3);

        let cfg = SimulationConfig::from_raw(Some("20.7"), None);
        assert_eq!(cfg.iterations(), 20);
        assert_eq!(cfg.parallelism(), 1);
    }

    #[test]
    fn huge_iteration_counts_are_clamped() {
        let cfg = SimulationConfig::from_raw(Some("99999999999999"), None);
        assert_eq!(cfg.iterations(), MAX_ITERATIONS);
        assert_eq!(SimulationConfig::new(i64::MAX, 1).iterations(), MAX_ITERATIONS);
    }

    #[test]
    fn deserializing_sanitizes_values() {
        let cfg: SimulationConfig =
            serde_json::from_str(r#"{"iterations":0,"parallelism":0,"seed":null}"#).unwrap();
        assert_eq!(cfg.iterations(), DEFAULT_ITERATIONS);
        assert_eq!(cfg.parallelism(), 1);

        let cfg: SimulationConfig = serde_json::from_str(r#"{"parallelism":-4,"seed":5}"#).unwrap();
        assert_eq!(cfg.iterations(), DEFAULT_ITERATIONS);
        assert_eq!(cfg.parallelism(), 1);
        assert_eq!(cfg.seed, Some(5));
    }

    #[test]
    fn serialized_config_reads_back_unchanged() {
        let cfg = SimulationConfig::new(250, 3).with_seed(Some(9));
        let back: SimulationConfig =
            serde_json::from_str(&serde_json::to_string(&cfg).unwrap()).unwrap();
        assert_eq!(back, cfg);
    }

    #[test]
    fn seed_is_carried() {
        let cfg = SimulationConfig::default().with_seed(Some(7));
        assert_eq!(cfg.seed, Some(7));
    }
}
