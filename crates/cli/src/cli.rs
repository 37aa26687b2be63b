use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use twin_core::frame::SIMULATED_ROWS;
use twin_core::{ModelKind, ReportFormat};

/// Hybrid digital-twin monitoring for industrial sensor data.
///
/// Settings not given on the command line come from the environment
/// (`TWIN_PROFILE`, `TWIN_MODEL`, `HEALTH_THRESHOLD`, ...) or `.env`.
#[derive(Parser, Debug)]
#[command(name = "twin", about = "Hybrid digital-twin monitoring pipeline")]
pub struct CliArgs {
    /// Config profile; `{PROFILE}_{KEY}` variables override plain `{KEY}`
    #[arg(long, env = "TWIN_PROFILE", global = true)]
    pub profile: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Assess, model and score a dataset, then write the summary report
    Run(RunArgs),

    /// Create an operator account
    Register {
        #[arg(long)]
        user: String,
        /// Operator, Engineer, Supervisor, Analyst, Admin (free text accepted)
        #[arg(long, default_value = "Operator")]
        role: String,
        #[arg(long, env = "TWIN_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Check an account's credentials
    Login {
        #[arg(long)]
        user: String,
        #[arg(long, env = "TWIN_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// List registered accounts and their roles
    Users,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Sensor CSV with a header row; non-numeric columns are ignored
    #[arg(long, conflicts_with = "simulate")]
    pub input: Option<PathBuf>,

    /// Use the built-in simulated plant (default when no input is given)
    #[arg(long)]
    pub simulate: bool,

    /// Rows to simulate
    #[arg(long, default_value_t = SIMULATED_ROWS)]
    pub rows: usize,

    /// Sensor column to include; repeat for fusion (default: first two columns)
    #[arg(long = "sensor")]
    pub sensors: Vec<String>,

    /// Linear Regression, Random Forest, LSTM or Autoencoder
    #[arg(long)]
    pub model: Option<ModelKind>,

    /// Forecast steps
    #[arg(long)]
    pub horizon: Option<usize>,

    /// Health below this is Critical
    #[arg(long)]
    pub health_threshold: Option<f64>,

    /// More anomalies than this is Critical
    #[arg(long)]
    pub anomaly_limit: Option<usize>,

    /// CSV, JSON or Text
    #[arg(long)]
    pub format: Option<ReportFormat>,

    /// Report destination; a directory gets `digital_twin_report.<ext>`
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Write per-sample actual / predicted / error rows as CSV
    #[arg(long)]
    pub series: Option<PathBuf>,

    /// Seed for simulation and model training
    #[arg(long)]
    pub seed: Option<u64>,
}
