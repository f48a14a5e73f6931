//! Rich diagnostic error types for backlog-forecast.
//!
//! The forecasting core is total and never fails. Errors come from the layers
//! around it: talking to the issue tracker, loading configuration, and
//! deciding whether the fetched data is good enough to report on. Each
//! subsystem has its own miette `#[diagnostic]` enum with a code and help text.

use miette::Diagnostic;
use thiserror::Error;

use crate::config::ConfigError;
use crate::paths::PathError;

/// Top-level error type for backlog-forecast.
///
/// Each variant wraps a subsystem error, preserving its diagnostic code and
/// help text through to the user.
#[derive(Debug, Error, Diagnostic)]
pub enum ForecastError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Tracker(#[from] TrackerError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Paths(#[from] PathError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Report(#[from] ReportError),
}

// ---------------------------------------------------------------------------
// Tracker errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum TrackerError {
    #[error("request to {url} failed: {message}")]
    #[diagnostic(
        code(forecast::tracker::request),
        help(
            "The issue tracker could not be reached. Check the --url value, \
             your network connection, and any proxy settings."
        )
    )]
    Request { url: String, message: String },

    #[error("issue tracker at {url} answered with HTTP {status}")]
    #[diagnostic(
        code(forecast::tracker::status),
        help(
            "401 or 403 usually means the personal access token is missing, \
             expired, or lacks permission to browse the projects. \
             400 usually means a project key, epic key, or milestone label is wrong."
        )
    )]
    Status { url: String, status: u16 },

    #[error("unexpected response from issue tracker: {message}")]
    #[diagnostic(
        code(forecast::tracker::response),
        help("The search endpoint returned a body that is not a Jira search result.")
    )]
    Response { message: String },
}

pub type TrackerResult<T> = std::result::Result<T, TrackerError>;

// ---------------------------------------------------------------------------
// Report errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ReportError {
    #[error("could not get historical data for projects: {projects}")]
    #[diagnostic(
        code(forecast::report::empty_history),
        help(
            "No closed task had both an \"in progress\" and a \"closed\" transition. \
             Check the project keys and the status names in the [tracker] config, \
             or pass --monthly-sp to forecast from a monthly throughput instead."
        )
    )]
    EmptyHistory { projects: String },

    #[error("could not get tasks in the scope: {scope}")]
    #[diagnostic(
        code(forecast::report::empty_scope),
        help(
            "The epic (and milestone label, if given) has no open task with a \
             non-zero estimation. Check the keys and that tasks are estimated."
        )
    )]
    EmptyScope { scope: String },

    #[error("invalid deadline: \"{value}\"")]
    #[diagnostic(
        code(forecast::report::invalid_deadline),
        help("Deadlines use the YYYY-MM-DD format, for example 2023-10-30.")
    )]
    InvalidDeadline { value: String },

    #[error("failed to serialize report: {message}")]
    #[diagnostic(
        code(forecast::report::serialize),
        help("This is a bug; rerun without --json to get the terminal report.")
    )]
    Serialize { message: String },
}
