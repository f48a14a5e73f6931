//! Work items fed into the forecaster.
//!
//! [`Task`] is a pending unit of work in the scope being forecast;
//! [`FinishedTask`] is a completed one carrying the number of days it took.
//! Both are created by the tracker layer and read by the core.

use serde::{Deserialize, Serialize};

/// Whole calendar days.
pub type Days = u32;

/// A pending unit of work.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Task {
    /// Tracker key, e.g. `COMPASS-1234`.
    pub task_id: String,
    /// Project key the task belongs to.
    pub project: String,
    /// Estimated size (story points).
    pub estimation: u32,
}

impl Task {
    pub fn new(task_id: impl Into<String>, project: impl Into<String>, estimation: u32) -> Self {
        Self {
            task_id: task_id.into(),
            project: project.into(),
            estimation,
        }
    }

    /// Mark this task as finished after `duration` days.
    pub fn finished(self, duration: Days) -> FinishedTask {
        FinishedTask {
            task_id: self.task_id,
            project: self.project,
            estimation: self.estimation,
            duration,
        }
    }
}

/// A completed task with its observed duration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FinishedTask {
    pub task_id: String,
    pub project: String,
    pub estimation: u32,
    /// Days between the start and done status transitions. Always > 0.
    pub duration: Days,
}

impl FinishedTask {
    pub fn new(
        task_id: impl Into<String>,
        project: impl Into<String>,
        estimation: u32,
        duration: Days,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            project: project.into(),
            estimation,
            duration,
        }
    }

    /// The task without its duration.
    pub fn as_task(&self) -> Task {
        Task::new(self.task_id.clone(), self.project.clone(), self.estimation)
    }
}

/// Sum of all estimations in `scope`.
pub fn total_estimation(scope: &[Task]) -> u64 {
    scope.iter().map(|t| u64::from(t.estimation)).sum()
}
