//! backlog-forecast CLI: Monte Carlo completion forecasts from Jira history.

use std::path::PathBuf;

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use rand::SeedableRng;
use rand::rngs::StdRng;

use backlog_forecast::analysis::DistributionReport;
use backlog_forecast::config::ForecastConfig;
use backlog_forecast::error::{ForecastError, ReportError};
use backlog_forecast::guess::guess_history;
use backlog_forecast::montecarlo::forecast;
use backlog_forecast::paths::ForecastPaths;
use backlog_forecast::report;
use backlog_forecast::task::total_estimation;
use backlog_forecast::tracker::{self, JiraClient};

#[derive(Parser)]
#[command(
    name = "backlog-forecast",
    version,
    about = "Statistical completion forecasts for a Jira epic, based on how past tasks went"
)]
struct Cli {
    /// URL of the Jira server, e.g. "https://jira.company.org/".
    #[arg(long, global = true)]
    url: Option<String>,

    /// Personal access token for Jira.
    #[arg(long, global = true)]
    token: Option<String>,

    /// Projects sampled for history, comma separated, e.g. COMPASS,VSCODE,MONGOSH.
    #[arg(long, global = true)]
    projects: Option<String>,

    /// Config file (default: $XDG_CONFIG_HOME/backlog-forecast/config.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print machine-readable JSON instead of charts and tables.
    #[arg(long, global = true)]
    json: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate when an epic (or one of its milestones) will be finished.
    ///
    /// Before setting --parallel to the number of developers in the team,
    /// consider blocks and dependencies between tasks.
    Estimate {
        /// Key of the epic to estimate, e.g. COMPASS-0000.
        #[arg(long)]
        epic: String,

        /// Milestone label to narrow the epic to. Defaults to the entire epic.
        #[arg(long)]
        milestone: Option<String>,

        /// Potential deadline in YYYY-MM-DD format, e.g. 2023-04-03.
        #[arg(long)]
        deadline: Option<String>,

        /// Number of simulated trials (default: 1000).
        #[arg(long, allow_hyphen_values = true)]
        iterations: Option<String>,

        /// Estimated number of tasks worked on in parallel (default: 1).
        #[arg(long, allow_hyphen_values = true)]
        parallel: Option<String>,

        /// Story points finished in a month. Replaces tracker history with a synthetic one.
        #[arg(long = "monthly-sp")]
        monthly_sp: Option<f64>,

        /// Seed for a reproducible simulation.
        #[arg(long)]
        seed: Option<u64>,

        /// Also print the tasks in the scope.
        #[arg(long)]
        verbose: bool,
    },

    /// Print a summary of the historical task durations.
    #[command(alias = "analyze")]
    Analyse,
}

fn main() -> miette::Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok(); // Ignore error if hook already set (e.g., in tests)

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    run(cli)?;
    Ok(())
}

fn run(cli: Cli) -> Result<(), ForecastError> {
    let config_path = match cli.config {
        Some(path) => path,
        None => ForecastPaths::resolve()?.config_file(),
    };
    let config = ForecastConfig::load_or_default(&config_path)?.with_overrides(
        cli.url,
        cli.token,
        cli.projects.as_deref(),
    );
    let color = !cli.no_color && std::env::var_os("NO_COLOR").is_none();

    match cli.command {
        Commands::Estimate {
            epic,
            milestone,
            deadline,
            iterations,
            parallel,
            monthly_sp,
            seed,
            verbose,
        } => {
            let deadline = deadline
                .as_deref()
                .map(|d| {
                    NaiveDate::parse_from_str(d, "%Y-%m-%d").map_err(|_| {
                        ReportError::InvalidDeadline {
                            value: d.to_string(),
                        }
                    })
                })
                .transpose()?;

            let connection = config.connection()?;
            let client =
                JiraClient::authorized(&connection.url, &connection.token, &config.tracker);

            let history = match monthly_sp {
                Some(points) => guess_history(points),
                None => {
                    tracker::sample_history(&client, &connection.projects, &config.tracker)?
                }
            };
            if history.is_empty() {
                return Err(ReportError::EmptyHistory {
                    projects: connection.projects.join(","),
                }
                .into());
            }

            let scope =
                tracker::query_scope(&client, &epic, milestone.as_deref(), &config.tracker)?;
            if scope.is_empty() {
                let scope = match &milestone {
                    Some(m) => format!("{epic} {m}"),
                    None => epic.clone(),
                };
                return Err(ReportError::EmptyScope { scope }.into());
            }

            let simulation =
                config.simulation_config(iterations.as_deref(), parallel.as_deref(), seed);
            let mut rng = match simulation.seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            let result = forecast(&history, &scope, &simulation, Local::now(), &mut rng);

            if cli.json {
                print_json(&result)?;
            } else {
                let points = total_estimation(&scope);
                println!("{}", report::render_forecast_chart(&result, points, deadline, color));
                if verbose {
                    println!("{}", report::render_scope_table(&scope));
                }
            }
        }

        Commands::Analyse => {
            let connection = config.connection()?;
            let client =
                JiraClient::authorized(&connection.url, &connection.token, &config.tracker);
            let history = tracker::sample_history(&client, &connection.projects, &config.tracker)?;
            if history.is_empty() {
                return Err(ReportError::EmptyHistory {
                    projects: connection.projects.join(","),
                }
                .into());
            }

            let analysis = DistributionReport::from_history(&history);
            if cli.json {
                print_json(&analysis)?;
            } else {
                println!("{}", report::render_distribution_report(&analysis));
            }
        }
    }

    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), ReportError> {
    let json = serde_json::to_string_pretty(value).map_err(|e| ReportError::Serialize {
        message: e.to_string(),
    })?;
    println!("{json}");
    Ok(())
}
