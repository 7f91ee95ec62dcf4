//! # Observability
//!
//! Logging and Prometheus metrics for the tracker.
//!
//! - `init_logging` installs the tracing subscriber. Without `RUST_LOG` the
//!   workspace crates log at the requested level and dependencies at `warn`.
//! - `init_metrics` starts the Prometheus endpoint and registers metric
//!   descriptions.
//! - Recorders are no-ops until an exporter is installed.
//!
//! ## Usage
//!
//! ```ignore
//! observability::init_logging(&LoggingConfig::default())?;
//! observability::init_metrics(9000)?;
//!
//! observability::record_frame_received();
//! observability::record_drive_command(command);
//! ```

pub mod metrics;

use anyhow::{Context, Result};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::Subscriber;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

// Re-exports
pub use crate::metrics::{
    describe_metrics, record_actuator_write, record_bytes_read, record_drive_command,
    record_frame_dropped, record_frame_received, record_link_state, record_malformed_frame,
    record_session_completed, record_shot_fired, record_stale_tick, RunningStats, StatsSummary,
    TrackingStatsAggregator, TrackingSummary,
};

/// Crates whose events follow the requested level
const TRACKER_TARGETS: &[&str] = &[
    "turret_tracker",
    "config_loader",
    "telemetry_link",
    "pursuit",
    "dispatcher",
    "supervisor",
    "observability",
];

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub format: LogFormat,
    /// Level for tracker crates when RUST_LOG is unset
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Compact,
            level: "info".to_string(),
        }
    }
}

/// Log format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Structured JSON
    Json,
    /// Human readable, multi-line
    Pretty,
    /// Single line
    #[default]
    Compact,
}

/// Default directives: tracker crates at `level`, everything else at `warn`
pub fn default_directives(level: &str) -> String {
    let mut directives = String::from("warn");
    for target in TRACKER_TARGETS {
        directives.push_str(&format!(",{target}={level}"));
    }
    directives
}

fn fmt_layer<S>(format: LogFormat) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    match format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_thread_names(true)
            .boxed(),
        LogFormat::Pretty => fmt::layer().pretty().boxed(),
        LogFormat::Compact => fmt::layer().compact().boxed(),
    }
}

/// Install the global tracing subscriber
///
/// `RUST_LOG` overrides the default directives.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directives(&config.level)))
        .with_context(|| format!("Invalid log level '{}'", config.level))?;

    tracing_subscriber::registry()
        .with(fmt_layer(config.format).with_filter(filter))
        .try_init()
        .context("Failed to initialize tracing subscriber")?;

    tracing::debug!(format = ?config.format, level = %config.level, "Logging initialized");
    Ok(())
}

/// Start the Prometheus endpoint on `0.0.0.0:port`
pub fn init_metrics(port: u16) -> Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], port))
        .install()
        .context("Failed to install Prometheus recorder")?;
    describe_metrics();

    tracing::info!(port, "Prometheus metrics endpoint initialized");
    Ok(())
}
