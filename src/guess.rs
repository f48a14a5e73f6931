//! Synthetic history from a monthly story-point throughput.
//!
//! Used when a team has no usable tracker history but knows roughly how many
//! story points it closes per month. The points are spread over a fixed mix
//! of task sizes, and each size gets the share of the month that the other
//! sizes leave over.

use crate::task::{Days, FinishedTask};

/// Project key given to synthetic tasks.
pub const FAKE_PROJECT: &str = "FAKE";

/// Calendar days assumed in a month.
pub const DAYS_IN_A_MONTH: f64 = 30.0;

/// Story-point size and its share of the monthly work, in percent.
const STORY_POINT_MIX: [(u32, u32); 5] = [(1, 50), (2, 25), (3, 10), (5, 10), (8, 5)];

/// Build a fake history for a team closing `monthly_story_points` per month.
///
/// Every size in the mix gets at least one task. Durations are rounded up to
/// whole days and are never zero. Negative or non-finite input counts as 0.
pub fn guess_history(monthly_story_points: f64) -> Vec<FinishedTask> {
    let monthly = if monthly_story_points.is_finite() {
        monthly_story_points.max(0.0)
    } else {
        0.0
    };

    let mut history = Vec::new();
    for (story_points, percent) in STORY_POINT_MIX {
        let tasks = (monthly * f64::from(percent) / 100.0).max(1.0);
        let days = DAYS_IN_A_MONTH * f64::from(100 - percent) / 100.0;
        let duration = (days / tasks).ceil().max(1.0) as Days;

        for n in 0..tasks.ceil() as usize {
            history.push(FinishedTask::new(
                format!("{FAKE_PROJECT}-{story_points}-{n}"),
                FAKE_PROJECT,
                story_points,
                duration,
            ));
        }
    }

    tracing::debug!(
        monthly_story_points = monthly,
        tasks = history.len(),
        "generated synthetic history"
    );
    history
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::montecarlo::build_weight_spec;

    #[test]
    fn twenty_points_a_month() {
        let history = guess_history(20.0);
        let spec = build_weight_spec(&history);

        assert_eq!(history.len(), 20);
        assert_eq!(spec.get(1), Some(&[2; 10][..]));
        assert_eq!(spec.get(2), Some(&[5; 5][..]));
        assert_eq!(spec.get(3), Some(&[14; 2][..]));
        assert_eq!(spec.get(5), Some(&[14; 2][..]));
        assert_eq!(spec.get(8), Some(&[29][..]));
    }

    #[test]
    fn every_size_gets_a_task() {
        let history = guess_history(0.0);
        assert_eq!(history.len(), 5);
        assert!(history.iter().all(|t| t.duration > 0));
        assert!(history.iter().all(|t| t.project == FAKE_PROJECT));
    }

    #[test]
    fn bad_input_counts_as_zero() {
        assert_eq!(guess_history(f64::NAN), guess_history(0.0));
        assert_eq!(guess_history(-12.0), guess_history(0.0));
    }

    #[test]
    fn ids_are_unique() {
        let history = guess_history(40.0);
        let mut ids: Vec<&str> = history.iter().map(|t| t.task_id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), history.len());
    }
}
