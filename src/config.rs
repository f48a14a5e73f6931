//! User configuration, persisted as TOML in `$XDG_CONFIG_HOME/backlog-forecast/`.
//!
//! Every value can also be given on the command line; flags win over the
//! file. A missing file is not an error.
//!
//! ```toml
//! url = "https://jira.company.org/"
//! token = "..."
//! projects = ["COMPASS", "MONGOSH"]
//!
//! [tracker]
//! estimation_field = "customfield_10555"
//! start_statuses = ["in progress"]
//! done_statuses = ["closed"]
//!
//! [simulation]
//! iterations = 5000
//! parallelism = 2
//! ```

use std::path::Path;

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::montecarlo::SimulationConfig;
use crate::tracker::TrackerSettings;

/// Errors from loading configuration.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("failed to read config: {path}")]
    #[diagnostic(
        code(forecast::config::read),
        help("Ensure the config file is readable, or remove it to use defaults.")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {path}: {message}")]
    #[diagnostic(
        code(forecast::config::parse),
        help("Check the TOML syntax and that every key is spelled as documented.")
    )]
    Parse { path: String, message: String },

    #[error("missing setting: {name}")]
    #[diagnostic(
        code(forecast::config::missing),
        help("Pass --{name} on the command line or set `{name}` in the config file.")
    )]
    MissingSetting { name: &'static str },
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Simulation defaults from the config file.
///
/// Kept raw so that out-of-range values are sanitized the same way as
/// command-line input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationDefaults {
    pub iterations: Option<i64>,
    pub parallelism: Option<i64>,
    pub seed: Option<u64>,
}

/// Complete user configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    /// Base URL of the Jira server.
    pub url: Option<String>,
    /// Personal access token.
    pub token: Option<String>,
    /// Project keys sampled for history.
    pub projects: Vec<String>,
    pub tracker: TrackerSettings,
    pub simulation: SimulationDefaults,
}

/// Everything needed to reach the tracker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub url: String,
    pub token: String,
    pub projects: Vec<String>,
}

impl ForecastConfig {
    /// Load from a TOML file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Load from `path` if it exists, defaults otherwise.
    pub fn load_or_default(path: &Path) -> ConfigResult<Self> {
        if path.exists() {
            tracing::debug!(path = %path.display(), "loading config");
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Apply command-line connection flags on top of the file values.
    pub fn with_overrides(
        mut self,
        url: Option<String>,
        token: Option<String>,
        projects: Option<&str>,
    ) -> Self {
        if url.is_some() {
            self.url = url;
        }
        if token.is_some() {
            self.token = token;
        }
        if let Some(projects) = projects {
            self.projects = split_projects(projects);
        }
        self
    }

    /// Resolve the tracker connection, failing on the first missing piece.
    pub fn connection(&self) -> ConfigResult<Connection> {
        let url =
            non_empty(self.url.as_deref()).ok_or(ConfigError::MissingSetting { name: "url" })?;
        let token =
            non_empty(self.token.as_deref()).ok_or(ConfigError::MissingSetting { name: "token" })?;
        if self.projects.is_empty() {
            return Err(ConfigError::MissingSetting { name: "projects" });
        }
        Ok(Connection {
            url: url.to_string(),
            token: token.to_string(),
            projects: self.projects.clone(),
        })
    }

    /// Simulation parameters: raw flags first, then the file, then defaults.
    pub fn simulation_config(
        &self,
        iterations: Option<&str>,
        parallelism: Option<&str>,
        seed: Option<u64>,
    ) -> SimulationConfig {
        let iterations = iterations
            .map(str::to_string)
            .or_else(|| self.simulation.iterations.map(|v| v.to_string()));
        let parallelism = parallelism
            .map(str::to_string)
            .or_else(|| self.simulation.parallelism.map(|v| v.to_string()));
        SimulationConfig::from_raw(iterations.as_deref(), parallelism.as_deref())
            .with_seed(seed.or(self.simulation.seed))
    }
}

/// Split a comma-separated project list, dropping blanks.
pub fn split_projects(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
