//! # Turret Tracker CLI
//!
//! Command-line entry point.
//!
//! Provides:
//! - Configuration loading and validation
//! - Tracker orchestration over log-backed collaborators
//! - Graceful shutdown on Ctrl+C / SIGTERM

mod cli;
mod commands;
mod error;
mod tracker;

use anyhow::Result;
use clap::Parser;
use observability::LoggingConfig;
use tracing::info;

use cli::{Cli, Commands, LogFormat};
use commands::{run_info, run_tracker, run_validate};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    observability::init_logging(&logging_config(&cli))?;

    info!(version = env!("CARGO_PKG_VERSION"), "Turret tracker starting");

    let result = match &cli.command {
        Commands::Run(args) => run_tracker(args).await,
        Commands::Validate(args) => run_validate(args),
        Commands::Info(args) => run_info(args),
    };

    if let Err(ref e) = result {
        tracing::error!(error = %e, "Command failed");
    }

    result
}

/// Map verbosity flags onto the subscriber; the exporter is started by `run`
fn logging_config(cli: &Cli) -> LoggingConfig {
    let level = if cli.quiet {
        "warn"
    } else {
        match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    LoggingConfig {
        format: match cli.log_format {
            LogFormat::Json => observability::LogFormat::Json,
            LogFormat::Pretty => observability::LogFormat::Pretty,
            LogFormat::Compact => observability::LogFormat::Compact,
        },
        level: level.to_string(),
    }
}
