//! Trial loop and quantile reduction.
//!
//! One run builds the weight table and sampler once, then executes
//! `iterations` independent trials. Each trial samples a duration for every
//! scope task, sums them, spreads the total over `parallelism` workers and
//! rounds up to whole days with a floor of one day.

use chrono::{DateTime, Local};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::SimulationConfig;
use super::quantile::quantile;
use super::sampler::WeightedSampler;
use super::weights::WeightSpecification;
use crate::task::{Days, FinishedTask, Task};

/// A confidence level in whole percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Confidence(pub u8);

impl Confidence {
    /// The level as a fraction in `[0, 1]`.
    pub fn fraction(self) -> f64 {
        f64::from(self.0.min(100)) / 100.0
    }
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// Bands reported by [`forecast`], most to least confident.
pub const REPORT_BANDS: [Confidence; 5] = [
    Confidence(99),
    Confidence(95),
    Confidence(90),
    Confidence(70),
    Confidence(60),
];

/// Days and calendar date for one confidence level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuantileBand {
    pub confidence: Confidence,
    pub days: Days,
    pub finish_by: DateTime<Local>,
}

/// Outcome of [`forecast`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastResult {
    /// Instant the simulation started; all finish dates count from here.
    pub start: DateTime<Local>,
    pub iterations: usize,
    pub parallelism: u32,
    /// Set when history was empty and every sample used the fallback.
    pub degraded: bool,
    /// One entry per [`REPORT_BANDS`] level, in the same order.
    pub bands: Vec<QuantileBand>,
}

impl ForecastResult {
    /// Band for `percent`, if it is one of the reported levels.
    pub fn band(&self, percent: u8) -> Option<&QuantileBand> {
        self.bands.iter().find(|b| b.confidence.0 == percent)
    }
}

/// Spread `raw_total` days over `parallelism` workers.
///
/// Rounds up to whole days and never returns less than one day. A
/// parallelism of zero is treated as one.
pub fn trial_outcome(raw_total: u64, parallelism: u32) -> Days {
    let parallelism = u64::from(parallelism.max(1));
    let days = raw_total.div_ceil(parallelism).max(1);
    Days::try_from(days).unwrap_or(Days::MAX)
}

/// Run `config.iterations()` trials with a prepared sampler.
///
/// Returns the outcomes sorted ascending.
pub fn run_trials<R: Rng + ?Sized>(
    sampler: &WeightedSampler,
    scope: &[Task],
    config: &SimulationConfig,
    rng: &mut R,
) -> Vec<Days> {
    let mut outcomes = Vec::with_capacity(config.iterations());
    for _ in 0..config.iterations() {
        let raw_total: u64 = scope
            .iter()
            .map(|task| u64::from(sampler.sample(task.estimation, &mut *rng)))
            .sum();
        outcomes.push(trial_outcome(raw_total, config.parallelism()));
    }
    outcomes.sort_unstable();
    outcomes
}

/// Simulate completing `scope` given how `history` went.
///
/// Returns exactly `config.iterations()` outcomes, sorted ascending, each at
/// least one day. An empty history does not fail: every size then falls
/// back to the fixed days-per-point estimate.
pub fn simulate<R: Rng + ?Sized>(
    history: &[FinishedTask],
    scope: &[Task],
    config: &SimulationConfig,
    rng: &mut R,
) -> Vec<Days> {
    let spec = WeightSpecification::from_history(history);
    let sampler = WeightedSampler::new(&spec);

    if sampler.is_fallback_only() {
        tracing::warn!(
            scope = scope.len(),
            "no history available, every duration uses the days-per-point fallback"
        );
    }
    tracing::info!(
        iterations = config.iterations(),
        parallelism = config.parallelism(),
        scope = scope.len(),
        sizes = spec.len(),
        "running simulation"
    );

    run_trials(&sampler, scope, config, rng)
}

/// Simulate and reduce the outcomes to the [`REPORT_BANDS`].
///
/// `finish_by` for each band is `start` plus that many calendar days.
pub fn forecast<R: Rng + ?Sized>(
    history: &[FinishedTask],
    scope: &[Task],
    config: &SimulationConfig,
    start: DateTime<Local>,
    rng: &mut R,
) -> ForecastResult {
    let outcomes = simulate(history, scope, config, rng);

    let bands = REPORT_BANDS
        .iter()
        .map(|&confidence| {
            let days = quantile(&outcomes, confidence.fraction());
            QuantileBand {
                confidence,
                days,
                finish_by: finish_date(start, days),
            }
        })
        .collect();

    ForecastResult {
        start,
        iterations: config.iterations(),
        parallelism: config.parallelism(),
        degraded: history.is_empty(),
        bands,
    }
}

fn finish_date(start: DateTime<Local>, days: Days) -> DateTime<Local> {
    start
        .checked_add_days(chrono::Days::new(u64::from(days)))
        .unwrap_or_else(|| {
            tracing::warn!(days, "finish date outside the calendar range, keeping start date");
            start
        })
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    fn history() -> Vec<FinishedTask> {
        vec![
            FinishedTask::new("H-1", "H", 3, 5),
            FinishedTask::new("H-2", "H", 3, 5),
            FinishedTask::new("H-3", "H", 3, 9),
        ]
    }

    fn scope() -> Vec<Task> {
        vec![Task::new("S-1", "S", 3), Task::new("S-2", "S", 3)]
    }

    fn start() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
    }

    #[test]
    fn trial_outcome_rounds_up_and_floors() {
        assert_eq!(trial_outcome(0, 1), 1);
        assert_eq!(trial_outcome(10, 1), 10);
        assert_eq!(trial_outcome(10, 3), 4);
        assert_eq!(trial_outcome(1, 8), 1);
        assert_eq!(trial_outcome(10, 0), 10);
    }

    #[test]
    fn trial_outcome_is_monotone_in_parallelism() {
        for raw in [0u64, 1, 7, 18, 101] {
            for p in 1..10 {
                assert!(trial_outcome(raw, p + 1) <= trial_outcome(raw, p));
            }
        }
    }

    #[test]
    fn outcomes_stay_within_sampled_bounds() {
        let mut rng = StdRng::seed_from_u64(42);
        let cfg = SimulationConfig::new(1000, 1);
        let outcomes = simulate(&history(), &scope(), &cfg, &mut rng);
        assert_eq!(outcomes.len(), 1000);
        assert!(outcomes.windows(2).all(|w| w[0] <= w[1]));
        assert!(outcomes.iter().all(|&d| (10..=18).contains(&d)));

        // 10 and 14 each have probability 4/9, 18 has 1/9.
        let median = quantile(&outcomes, 0.5);
        assert!((10..=14).contains(&median), "median was {median}");
    }

    #[test]
    fn empty_scope_is_one_day() {
        let mut rng = StdRng::seed_from_u64(1);
        let outcomes = simulate(&history(), &[], &SimulationConfig::new(50, 1), &mut rng);
        assert_eq!(outcomes, vec![1; 50]);
    }

    #[test]
    fn empty_history_degrades_to_fallback() {
        let mut rng = StdRng::seed_from_u64(1);
        let result = forecast(&[], &scope(), &SimulationConfig::new(20, 1), start(), &mut rng);
        assert!(result.degraded);
        for band in &result.bands {
            assert_eq!(band.days, 18);
        }
    }

    #[test]
    fn higher_parallelism_never_lengthens_trials() {
        let cfg1 = SimulationConfig::new(500, 1);
        let cfg3 = SimulationConfig::new(500, 3);
        let serial = simulate(&history(), &scope(), &cfg1, &mut StdRng::seed_from_u64(9));
        let spread = simulate(&history(), &scope(), &cfg3, &mut StdRng::seed_from_u64(9));
        assert!(serial.iter().zip(&spread).all(|(a, b)| b <= a));
    }

    #[test]
    fn forecast_reports_all_bands_with_dates() {
        let mut rng = StdRng::seed_from_u64(3);
        let cfg = SimulationConfig::default();
        let result = forecast(&history(), &scope(), &cfg, start(), &mut rng);

        let levels: Vec<u8> = result.bands.iter().map(|b| b.confidence.0).collect();
        assert_eq!(levels, vec![99, 95, 90, 70, 60]);
        assert!(!result.degraded);
        assert_eq!(result.iterations, 1000);

        for band in &result.bands {
            let expected = start()
                .checked_add_days(chrono::Days::new(u64::from(band.days)))
                .unwrap();
            assert_eq!(band.finish_by, expected);
        }

        let p99 = result.band(99).unwrap().days;
        let p60 = result.band(60).unwrap().days;
        assert!(p99 >= p60);
        assert!(result.band(50).is_none());
    }

    #[test]
    fn seeded_runs_are_reproducible() {
        let cfg = SimulationConfig::new(200, 2);
        let a = simulate(&history(), &scope(), &cfg, &mut StdRng::seed_from_u64(11));
        let b = simulate(&history(), &scope(), &cfg, &mut StdRng::seed_from_u64(11));
        assert_eq!(a, b);
    }
}
