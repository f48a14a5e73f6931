//! Empirical weight table: observed durations grouped by estimation size.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::task::{Days, FinishedTask};

/// Estimation size → every duration observed for tasks of that size.
///
/// Duplicates are kept because frequency is the weight. Every duration stored
/// under key `k` came from a [`FinishedTask`] with `estimation == k`, so no key
/// ever maps to an empty list. Deserializing drops empty lists to keep it so.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawWeightSpecification")]
pub struct WeightSpecification {
    durations: BTreeMap<u32, Vec<Days>>,
}

#[derive(Deserialize)]
struct RawWeightSpecification {
    #[serde(default)]
    durations: BTreeMap<u32, Vec<Days>>,
}

impl From<RawWeightSpecification> for WeightSpecification {
    fn from(raw: RawWeightSpecification) -> Self {
        let mut durations = raw.durations;
        durations.retain(|_, observed| !observed.is_empty());
        Self { durations }
    }
}

impl WeightSpecification {
    /// Group `history` by estimation.
    pub fn from_history(history: &[FinishedTask]) -> Self {
        let mut durations: BTreeMap<u32, Vec<Days>> = BTreeMap::new();
        for task in history {
            durations.entry(task.estimation).or_default().push(task.duration);
        }
        Self { durations }
    }

    /// Durations observed for `estimation`, in history order.
    pub fn get(&self, estimation: u32) -> Option<&[Days]> {
        self.durations.get(&estimation).map(Vec::as_slice)
    }

    /// Sizes with at least one observation, ascending.
    pub fn sizes(&self) -> impl Iterator<Item = u32> + '_ {
        self.durations.keys().copied()
    }

    /// `(size, durations)` pairs, ascending by size.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &[Days])> {
        self.durations.iter().map(|(k, v)| (*k, v.as_slice()))
    }

    /// Number of distinct sizes.
    pub fn len(&self) -> usize {
        self.durations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.durations.is_empty()
    }
}

/// Build the weight table for `history`.
pub fn build_weight_spec(history: &[FinishedTask]) -> WeightSpecification {
    WeightSpecification::from_history(history)
}
