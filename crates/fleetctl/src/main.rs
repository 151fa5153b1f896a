//! fleetctl — inspect and drive taint/toleration placement decisions.
//!
//! # Usage
//!
//! ```text
//! fleetctl evaluate --snapshot snapshot.json --now 2024-05-01T12:01:00Z
//! fleetctl validate --snapshot snapshot.toml
//! fleetctl --config testdata/fleet.toml watch --snapshot testdata/snapshot.toml
//! ```

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

use config::{FleetConfig, LogFormat};

#[derive(Parser)]
#[command(
    name = "fleetctl",
    about = "Fleet placement — taint/toleration scheduling and eviction requeue",
    version,
    propagate_version = true,
)]
struct Cli {
    /// Path to fleet.toml.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log filter (overridden by RUST_LOG).
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Log output format.
    #[arg(long, global = true, value_enum)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one scheduling cycle and print each placement's decision.
    Evaluate {
        /// Snapshot of clusters and placements (.toml or .json).
        #[arg(short, long)]
        snapshot: PathBuf,
        /// Only evaluate this placement (namespace/name).
        #[arg(short, long)]
        placement: Option<String>,
        /// Evaluation time (RFC 3339). Defaults to the current time.
        #[arg(long)]
        now: Option<DateTime<Utc>>,
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// Check every placement's tolerations for structural errors.
    Validate {
        #[arg(short, long)]
        snapshot: PathBuf,
    },
    /// Keep decisions current, re-evaluating as tolerations expire.
    Watch {
        #[arg(short, long)]
        snapshot: PathBuf,
        /// Seconds between full re-evaluations.
        #[arg(long)]
        resync_secs: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let resync_override = match &cli.command {
        Commands::Watch { resync_secs, .. } => *resync_secs,
        _ => None,
    };
    let config = match &cli.config {
        Some(path) => FleetConfig::from_file(path)?,
        None => FleetConfig::default(),
    }
    .with_overrides(cli.log_level, cli.log_format, resync_override);

    init_tracing(&config);

    match cli.command {
        Commands::Evaluate {
            snapshot,
            placement,
            now,
            format,
        } => commands::evaluate::evaluate(
            &snapshot,
            placement.as_deref(),
            now.unwrap_or_else(Utc::now),
            format,
        ),
        Commands::Validate { snapshot } => commands::validate::validate(&snapshot),
        Commands::Watch { snapshot, .. } => commands::watch::watch(&snapshot, config.driver_config()).await,
    }
}

fn init_tracing(config: &FleetConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level()));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match config.log_format() {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}
