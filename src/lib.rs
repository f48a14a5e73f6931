// thiserror's #[error("...{field}...")] format strings reference struct fields,
// but the compiler doesn't see through the derive macro and reports false positives.
#![allow(unused_assignments)]

//! # backlog-forecast
//!
//! Probabilistic completion forecasts for a backlog, driven by how long
//! similar work actually took.
//!
//! ## Architecture
//!
//! - **Monte Carlo core** (`montecarlo`): weight table, empirical sampler,
//!   trial loop and ceiling-biased quantiles
//! - **Analytics** (`analysis`): duration histogram, deviation grading, outliers
//! - **Tracker** (`tracker`): Jira search over blocking HTTP, issue → task conversion
//! - **Reporting** (`report`): bar chart and tables for the terminal
//!
//! ## Library usage
//!
//! ```
//! use backlog_forecast::montecarlo::{forecast, SimulationConfig};
//! use backlog_forecast::task::{FinishedTask, Task};
//! use rand::SeedableRng;
//!
//! let history = vec![
//!     FinishedTask::new("PRJ-1", "PRJ", 3, 5),
//!     FinishedTask::new("PRJ-2", "PRJ", 3, 9),
//! ];
//! let scope = vec![Task::new("PRJ-3", "PRJ", 3)];
//! let mut rng = rand::rngs::StdRng::seed_from_u64(7);
//!
//! let start = chrono::Local::now();
//! let result = forecast(&history, &scope, &SimulationConfig::default(), start, &mut rng);
//! assert!(result.band(90).unwrap().days <= 9);
//! ```

pub mod analysis;
pub mod config;
pub mod error;
pub mod guess;
pub mod montecarlo;
pub mod paths;
pub mod report;
pub mod task;
pub mod tracker;
