//! Empirical resampling of task durations.

use std::collections::HashMap;

use rand::Rng;

use super::weights::WeightSpecification;
use crate::task::Days;

/// Days assumed per story point for sizes that have no history.
///
/// A tunable heuristic, not derived from data.
pub const DAYS_PER_POINT: Days = 3;

/// Draws durations for an estimation size with probability proportional to
/// how often each duration was observed.
#[derive(Debug, Clone, Default)]
pub struct WeightedSampler {
    tables: HashMap<u32, Vec<Days>>,
}

impl WeightedSampler {
    /// Precompute one lookup table per size.
    ///
    /// Each observed duration occurs in its table as many times as it was
    /// observed, so a uniform index reproduces the empirical frequencies.
    pub fn new(spec: &WeightSpecification) -> Self {
        let tables = spec
            .iter()
            .map(|(size, durations)| (size, durations.to_vec()))
            .collect();
        Self { tables }
    }

    /// Draw one duration for `estimation`.
    ///
    /// Sampling is with replacement; every call is independent. Sizes without
    /// history return `estimation * DAYS_PER_POINT` and consume no randomness.
    pub fn sample<R: Rng + ?Sized>(&self, estimation: u32, rng: &mut R) -> Days {
        match self.tables.get(&estimation) {
            Some(table) if !table.is_empty() => table[rng.gen_range(0..table.len())],
            _ => fallback(estimation),
        }
    }

    /// Whether `estimation` has historical data.
    pub fn knows(&self, estimation: u32) -> bool {
        self.tables.contains_key(&estimation)
    }

    /// True when no size has history, i.e. every draw is a fallback.
    pub fn is_fallback_only(&self) -> bool {
        self.tables.is_empty()
    }
}

fn fallback(estimation: u32) -> Days {
    estimation.saturating_mul(DAYS_PER_POINT)
}
