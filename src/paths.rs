//! XDG-compliant path resolution for backlog-forecast.
//!
//! Only configuration lives on disk; nothing is persisted between runs.

use std::path::{Path, PathBuf};

use miette::Diagnostic;
use thiserror::Error;

/// Directory name under the XDG config home.
pub const APP_DIR: &str = "backlog-forecast";

/// File name of the user configuration.
pub const CONFIG_FILE: &str = "config.toml";

/// Errors from path resolution.
#[derive(Debug, Error, Diagnostic)]
pub enum PathError {
    #[error("cannot determine home directory")]
    #[diagnostic(
        code(forecast::paths::no_home),
        help(
            "Set the HOME or XDG_CONFIG_HOME environment variable, \
             or pass --config with an explicit path."
        )
    )]
    NoHome,
}

pub type PathResult<T> = std::result::Result<T, PathError>;

/// Where backlog-forecast looks for its files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForecastPaths {
    /// `$XDG_CONFIG_HOME/backlog-forecast/`
    pub config_dir: PathBuf,
}

impl ForecastPaths {
    /// Resolve from `XDG_CONFIG_HOME`, falling back to `$HOME/.config`.
    pub fn resolve() -> PathResult<Self> {
        let config_home = match std::env::var("XDG_CONFIG_HOME") {
            Ok(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => std::env::var("HOME")
                .map(|home| PathBuf::from(home).join(".config"))
                .map_err(|_| PathError::NoHome)?,
        };
        Ok(Self::in_config_home(&config_home))
    }

    /// Paths rooted at an explicit config home.
    pub fn in_config_home(config_home: &Path) -> Self {
        Self {
            config_dir: config_home.join(APP_DIR),
        }
    }

    /// `config_dir/config.toml`
    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_file_lives_in_app_dir() {
        let paths = ForecastPaths::in_config_home(Path::new("/home/planner/.config"));
        assert_eq!(
            paths.config_dir,
            PathBuf::from("/home/planner/.config/backlog-forecast")
        );
        assert_eq!(
            paths.config_file(),
            PathBuf::from("/home/planner/.config/backlog-forecast/config.toml")
        );
    }
}
