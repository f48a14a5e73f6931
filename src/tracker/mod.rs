//! Issue tracker access: turning Jira issues into forecaster input.
//!
//! [`IssueTracker`] is the seam between the network and the forecaster.
//! [`JiraClient`] implements it over blocking HTTP; tests substitute an
//! in-memory tracker. [`sample_history`] and [`query_scope`] apply the input
//! contract of the core: history entries always have a positive duration and
//! scope entries always have a non-zero estimation.

pub mod jira;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::error::TrackerResult;
use crate::task::{FinishedTask, Task};

pub use jira::JiraClient;

/// Anything that can answer a JQL search.
pub trait IssueTracker {
    fn search(&self, jql: &str) -> TrackerResult<Vec<JiraIssue>>;
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// How issues are queried and interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerSettings {
    /// Field holding the story-point estimation.
    pub estimation_field: String,
    /// Statuses whose first transition marks the start of work.
    pub start_statuses: Vec<String>,
    /// Statuses whose first transition marks the end of work.
    pub done_statuses: Vec<String>,
    /// Issue type sampled for history.
    pub issue_type: String,
    /// Page size requested from the search endpoint.
    pub max_results: u32,
    /// HTTP timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            estimation_field: "customfield_10555".into(),
            start_statuses: vec!["in progress".into()],
            done_statuses: vec!["closed".into()],
            issue_type: "Task".into(),
            max_results: 25,
            timeout_secs: 30,
        }
    }
}

// ---------------------------------------------------------------------------
// Jira issue model
// ---------------------------------------------------------------------------

/// Body of `GET /rest/api/2/search`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub issues: Vec<JiraIssue>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JiraIssue {
    pub key: String,
    #[serde(default)]
    pub fields: IssueFields,
    #[serde(default)]
    pub changelog: Changelog,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IssueFields {
    #[serde(default)]
    pub project: Option<ProjectRef>,
    /// Every other requested field, custom estimation fields included.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectRef {
    pub key: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Changelog {
    #[serde(default)]
    pub histories: Vec<ChangeHistory>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeHistory {
    pub created: String,
    #[serde(default)]
    pub items: Vec<ChangeItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeItem {
    pub field: String,
    #[serde(rename = "toString", default)]
    pub to_value: Option<String>,
}

impl JiraIssue {
    /// Project key, falling back to the issue key prefix.
    pub fn project_key(&self) -> String {
        match &self.fields.project {
            Some(project) => project.key.clone(),
            None => self.key.split('-').next().unwrap_or_default().to_string(),
        }
    }

    /// Story points in `field`, rounded up. Missing or non-positive is 0.
    pub fn story_points(&self, field: &str) -> u32 {
        match self.fields.extra.get(field).and_then(serde_json::Value::as_f64) {
            Some(points) if points.is_finite() && points > 0.0 => {
                points.ceil().min(f64::from(u32::MAX)) as u32
            }
            _ => 0,
        }
    }

    /// When the issue first moved into one of `statuses`.
    pub fn first_transition_to(&self, statuses: &[String]) -> Option<DateTime<FixedOffset>> {
        self.changelog
            .histories
            .iter()
            .find(|history| {
                history.items.iter().any(|item| {
                    item.field.eq_ignore_ascii_case("status")
                        && item.to_value.as_deref().is_some_and(|to| {
                            statuses.iter().any(|s| s.eq_ignore_ascii_case(to))
                        })
                })
            })
            .and_then(|history| parse_timestamp(&history.created))
    }

    /// Convert to a finished task, if both transitions exist and took time.
    pub fn to_finished_task(&self, settings: &TrackerSettings) -> Option<FinishedTask> {
        let started = self.first_transition_to(&settings.start_statuses)?;
        let done = self.first_transition_to(&settings.done_statuses)?;

        let seconds = (done - started).num_seconds();
        let days = (seconds as f64 / 86_400.0).ceil();
        if days < 1.0 {
            return None;
        }

        let estimation = match self.story_points(&settings.estimation_field) {
            0 => 1,
            points => points,
        };
        Some(FinishedTask::new(
            self.key.clone(),
            self.project_key(),
            estimation,
            days.min(f64::from(u32::MAX)) as u32,
        ))
    }

    /// Convert to a scope task. Unestimated issues get estimation 0.
    pub fn to_task(&self, settings: &TrackerSettings) -> Task {
        Task::new(
            self.key.clone(),
            self.project_key(),
            self.story_points(&settings.estimation_field),
        )
    }
}

/// Parse a Jira (`2023-04-03T10:15:30.000+0000`) or RFC 3339 timestamp.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f%z")
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .ok()
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

fn status_list(statuses: &[String]) -> String {
    statuses
        .iter()
        .map(|s| format!("\"{}\"", s.replace('"', "\\\"")))
        .collect::<Vec<_>>()
        .join(", ")
}

/// JQL selecting recently finished tasks of `projects`.
pub fn history_jql(projects: &[String], settings: &TrackerSettings) -> String {
    format!(
        "project IN ({}) AND status IN ( {} ) AND type = {} ORDER BY updated DESC",
        projects.join(","),
        status_list(&settings.done_statuses),
        settings.issue_type
    )
}

/// JQL selecting the open tasks of `epic`, optionally narrowed to a milestone label.
pub fn scope_jql(epic: &str, milestone: Option<&str>, settings: &TrackerSettings) -> String {
    let milestone = milestone
        .map(|m| format!(" AND labels = \"{}\"", m.replace('"', "\\\"")))
        .unwrap_or_default();
    format!(
        "\"Epic Link\" = '{}'{} AND status NOT IN ( {} ) ORDER BY updated DESC",
        epic.replace('\'', "\\'"),
        milestone,
        status_list(&settings.done_statuses)
    )
}

/// JQL selecting the children of `parents`.
pub fn subtasks_jql(parents: &[String]) -> String {
    format!("\"Parent Link\" IN ({})", parents.join(", "))
}

/// Fetch finished tasks of `projects` with a measurable duration.
pub fn sample_history(
    tracker: &dyn IssueTracker,
    projects: &[String],
    settings: &TrackerSettings,
) -> TrackerResult<Vec<FinishedTask>> {
    let issues = tracker.search(&history_jql(projects, settings))?;
    let fetched = issues.len();

    let history: Vec<FinishedTask> = issues
        .iter()
        .filter_map(|issue| {
            let task = issue.to_finished_task(settings);
            if task.is_none() {
                tracing::debug!(key = %issue.key, "skipping issue without a measurable duration");
            }
            task
        })
        .collect();

    tracing::info!(fetched, kept = history.len(), "sampled history");
    Ok(history)
}

/// Fetch the open, estimated tasks of `epic` and their sub-tasks.
pub fn query_scope(
    tracker: &dyn IssueTracker,
    epic: &str,
    milestone: Option<&str>,
    settings: &TrackerSettings,
) -> TrackerResult<Vec<Task>> {
    let mut issues = tracker.search(&scope_jql(epic, milestone, settings))?;

    let parents: Vec<String> = issues.iter().map(|issue| issue.key.clone()).collect();
    if !parents.is_empty() {
        issues.extend(tracker.search(&subtasks_jql(&parents))?);
    }

    let fetched = issues.len();
    let scope: Vec<Task> = issues
        .iter()
        .map(|issue| issue.to_task(settings))
        .filter(|task| task.estimation != 0)
        .collect();

    tracing::info!(epic, fetched, kept = scope.len(), "queried scope");
    Ok(scope)
}
