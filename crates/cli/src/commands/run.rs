//! `run` command implementation.

use anyhow::{Context, Result};
use config_loader::{ConfigFormat, ConfigLoader, LinkOverride};
use std::time::Duration;
use tracing::{info, warn};

use crate::cli::RunArgs;
use crate::error::CliError;
use crate::tracker::{Tracker, TrackerConfig};

/// Execute the `run` command
pub async fn run_tracker(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    if !args.config.exists() {
        return Err(CliError::config_not_found(args.config.display().to_string()).into());
    }

    let overrides = LinkOverride {
        host: args.host.clone(),
        port: args.port,
    };
    let blueprint = ConfigLoader::load_with_overrides(&args.config, &overrides)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    info!(
        address = %blueprint.link.address(),
        channels = blueprint.dispatcher.channels.len(),
        max_shots = blueprint.firing.max_shots,
        "Configuration loaded"
    );

    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&blueprint);
        let effective = ConfigFormat::Toml
            .render(&blueprint)
            .context("Failed to render effective configuration")?;
        println!("=== Effective Configuration ===\n\n{effective}");
        return Ok(());
    }

    if args.metrics_port != 0 {
        observability::init_metrics(args.metrics_port)?;
        info!(port = args.metrics_port, "Metrics endpoint available");
    }

    let tracker = Tracker::new(TrackerConfig {
        blueprint,
        sessions: (args.sessions != 0).then_some(args.sessions),
        timeout: (args.timeout != 0).then(|| Duration::from_secs(args.timeout)),
    });

    info!("Starting tracker...");
    let stats = tracker
        .run(shutdown_signal())
        .await
        .context("Tracker failed")?;

    info!(
        frames = stats.tracking.total_frames,
        shots = stats.tracking.shots_fired,
        sessions = stats.tracking.sessions_completed,
        duration_secs = stats.duration.as_secs_f64(),
        "Tracker finished"
    );
    stats.print_summary();
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
///
/// A handler that cannot be installed never resolves.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => warn!("Received Ctrl+C, stopping tracker..."),
        _ = terminate => warn!("Received SIGTERM, stopping tracker..."),
    }
}

/// Print configuration summary for dry-run mode
fn print_config_summary(blueprint: &contracts::TrackerBlueprint) {
    println!("\n=== Configuration Summary ===\n");
    println!("Vision peer: {}", blueprint.link.address());
    println!(
        "Frame reader: {} byte buffer, {} zero bytes per delimiter",
        blueprint.link.buffer_capacity, blueprint.link.zero_threshold
    );
    println!(
        "Pursuit: every {} ms, goal width {} +/- {}",
        blueprint.pursuit.period_ms, blueprint.pursuit.goal_distance, blueprint.pursuit.goal_threshold
    );
    println!("\nChannels ({}):", blueprint.dispatcher.channels.len());
    for binding in &blueprint.dispatcher.channels {
        println!("  - slot {} -> {}", binding.index, binding.actuator);
    }
    println!(
        "\nFiring: {} shots, {} ms apart",
        blueprint.firing.max_shots, blueprint.firing.min_interval_ms
    );
    println!();
}
