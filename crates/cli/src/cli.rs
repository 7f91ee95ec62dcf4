//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Turret Tracker - vision-guided pursuit and firing
#[derive(Parser, Debug)]
#[command(
    name = "turret-tracker",
    author,
    version,
    about = "Vision-guided turret tracker",
    long_about = "Connects to a vision peer, recovers target measurements from its \n\
                  telemetry stream, steers the drivetrain onto the target and fires \n\
                  a bounded number of shots once aligned."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "TURRET_TRACKER_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "TURRET_TRACKER_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Track the target and fire
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(
        short,
        long,
        default_value = "tracker.toml",
        env = "TURRET_TRACKER_CONFIG"
    )]
    pub config: PathBuf,

    /// Override vision peer host from configuration
    #[arg(long, env = "TURRET_TRACKER_VISION_HOST")]
    pub host: Option<String>,

    /// Override vision peer port from configuration
    #[arg(long, env = "TURRET_TRACKER_VISION_PORT")]
    pub port: Option<u16>,

    /// Tracking sessions to complete before exiting (0 = until interrupted)
    #[arg(long, default_value = "1", env = "TURRET_TRACKER_SESSIONS")]
    pub sessions: u32,

    /// Run timeout in seconds (0 = no timeout)
    #[arg(long, default_value = "0", env = "TURRET_TRACKER_TIMEOUT")]
    pub timeout: u64,

    /// Validate configuration and exit without connecting
    #[arg(long)]
    pub dry_run: bool,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "TURRET_TRACKER_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "tracker.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "tracker.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Show pursuit controller tuning
    #[arg(long)]
    pub tuning: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}
