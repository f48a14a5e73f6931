//! Distribution analytics over historical durations.
//!
//! Three diagnostic views share the weight table used by the forecaster:
//!
//! - **Histogram**: occurrences of each duration per estimation size, over a
//!   shared duration axis
//! - **Deviation**: median and p50→p99 spread per size, graded by severity
//! - **Outliers**: historical tasks slower than their size's p95

use serde::{Deserialize, Serialize};

use crate::montecarlo::{WeightSpecification, quantile};
use crate::task::{Days, FinishedTask};

/// Deviation above which a size is flagged [`Severity::High`].
pub const DANGEROUS_DEVIATION_IN_DAYS: Days = 10;

/// Deviation above which a size is flagged [`Severity::Medium`].
pub const WARN_DEVIATION_IN_DAYS: Days = 5;

/// Quantile a task must exceed to count as an outlier.
pub const OUTLIER_QUANTILE: f64 = 0.95;

// ---------------------------------------------------------------------------
// Histogram
// ---------------------------------------------------------------------------

/// Occurrence counts for one estimation size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistogramRow {
    pub estimation: u32,
    /// One count per entry of [`DurationHistogram::durations`].
    pub counts: Vec<usize>,
}

/// Size × duration frequency table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurationHistogram {
    /// Every distinct duration seen across all sizes, ascending.
    pub durations: Vec<Days>,
    /// One row per size, ascending by size.
    pub rows: Vec<HistogramRow>,
}

impl DurationHistogram {
    pub fn from_spec(spec: &WeightSpecification) -> Self {
        let mut durations: Vec<Days> = spec.iter().flat_map(|(_, d)| d.iter().copied()).collect();
        durations.sort_unstable();
        durations.dedup();

        let rows = spec
            .iter()
            .map(|(estimation, observed)| {
                let mut counts = vec![0; durations.len()];
                for day in observed {
                    if let Ok(column) = durations.binary_search(day) {
                        counts[column] += 1;
                    }
                }
                HistogramRow { estimation, counts }
            })
            .collect();

        Self { durations, rows }
    }
}

// ---------------------------------------------------------------------------
// Deviation
// ---------------------------------------------------------------------------

/// How unpredictable a size's durations are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    /// Grade a deviation in days.
    pub fn from_deviation(deviation: Days) -> Self {
        if deviation > DANGEROUS_DEVIATION_IN_DAYS {
            Severity::High
        } else if deviation > WARN_DEVIATION_IN_DAYS {
            Severity::Medium
        } else {
            Severity::Low
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Low => write!(f, "low"),
            Severity::Medium => write!(f, "medium"),
            Severity::High => write!(f, "high"),
        }
    }
}

/// Median and spread of one size's durations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeDeviation {
    pub estimation: u32,
    pub median: Days,
    /// `|p50 - p99|` in days.
    pub deviation: Days,
    pub severity: Severity,
}

/// Median and deviation for every size, ascending by size.
pub fn deviation_by_size(spec: &WeightSpecification) -> Vec<SizeDeviation> {
    spec.iter()
        .map(|(estimation, observed)| {
            let sorted = sorted_copy(observed);
            let median = quantile(&sorted, 0.5);
            let deviation = median.abs_diff(quantile(&sorted, 0.99));
            SizeDeviation {
                estimation,
                median,
                deviation,
                severity: Severity::from_deviation(deviation),
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Outliers
// ---------------------------------------------------------------------------

/// A historical task much slower than others of its size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outlier {
    pub task_id: String,
    pub estimation: u32,
    pub duration: Days,
    /// The size's p95 duration the task exceeded.
    pub threshold: Days,
}

/// Tasks whose duration exceeds the p95 of their size, grouped by size.
pub fn find_outliers(spec: &WeightSpecification, history: &[FinishedTask]) -> Vec<Outlier> {
    let mut outliers = Vec::new();
    for (estimation, observed) in spec.iter() {
        let threshold = quantile(&sorted_copy(observed), OUTLIER_QUANTILE);
        outliers.extend(
            history
                .iter()
                .filter(|t| t.estimation == estimation && t.duration > threshold)
                .map(|t| Outlier {
                    task_id: t.task_id.clone(),
                    estimation,
                    duration: t.duration,
                    threshold,
                }),
        );
    }
    outliers
}

// ---------------------------------------------------------------------------
// Combined report
// ---------------------------------------------------------------------------

/// All three views computed from one history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionReport {
    /// Number of historical tasks analysed.
    pub samples: usize,
    pub histogram: DurationHistogram,
    pub deviations: Vec<SizeDeviation>,
    pub outliers: Vec<Outlier>,
}

impl DistributionReport {
    pub fn from_history(history: &[FinishedTask]) -> Self {
        let spec = WeightSpecification::from_history(history);
        let report = Self {
            samples: history.len(),
            histogram: DurationHistogram::from_spec(&spec),
            deviations: deviation_by_size(&spec),
            outliers: find_outliers(&spec, history),
        };
        tracing::info!(
            samples = report.samples,
            sizes = spec.len(),
            outliers = report.outliers.len(),
            "analysed duration distribution"
        );
        report
    }
}

fn sorted_copy(values: &[Days]) -> Vec<Days> {
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    sorted
}
