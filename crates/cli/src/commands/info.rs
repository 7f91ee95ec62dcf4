//! `info` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use contracts::TrackerBlueprint;

use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    link: LinkInfo,
    channels: Vec<ChannelInfo>,
    firing: FiringInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    tuning: Option<TuningInfo>,
}

#[derive(Serialize)]
struct LinkInfo {
    address: String,
    connect_timeout_ms: u64,
    idle_poll_ms: u64,
    buffer_capacity: usize,
    zero_threshold: usize,
}

#[derive(Serialize)]
struct ChannelInfo {
    index: usize,
    actuator: String,
}

#[derive(Serialize)]
struct FiringInfo {
    max_shots: u32,
    min_interval_ms: u64,
    dispense_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    boost_ms: Option<u64>,
}

#[derive(Serialize)]
struct TuningInfo {
    period_ms: u64,
    stale_timeout_ms: u64,
    goal_distance: f64,
    goal_threshold: f64,
    drive_speed: f64,
    distance_divisor: f64,
    angle_drive_ratio: f64,
    zone: f64,
    speed_threshold: f64,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if args.json {
        let info = build_config_info(&blueprint, args);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&blueprint, args);
    }

    Ok(())
}

fn build_config_info(blueprint: &TrackerBlueprint, args: &InfoArgs) -> ConfigInfo {
    let link = &blueprint.link;
    let dispense = &blueprint.dispense;
    let pursuit = &blueprint.pursuit;

    ConfigInfo {
        version: format!("{:?}", blueprint.version),
        link: LinkInfo {
            address: link.address(),
            connect_timeout_ms: link.connect_timeout_ms,
            idle_poll_ms: link.idle_poll_ms,
            buffer_capacity: link.buffer_capacity,
            zero_threshold: link.zero_threshold,
        },
        channels: blueprint
            .dispatcher
            .channels
            .iter()
            .map(|c| ChannelInfo {
                index: c.index,
                actuator: c.actuator.clone(),
            })
            .collect(),
        firing: FiringInfo {
            max_shots: blueprint.firing.max_shots,
            min_interval_ms: blueprint.firing.min_interval_ms,
            dispense_ms: dispense.park_ms + dispense.settle_ms + dispense.release_ms,
            boost_ms: dispense.boost.as_ref().map(|b| b.duration_ms),
        },
        tuning: args.tuning.then(|| TuningInfo {
            period_ms: pursuit.period_ms,
            stale_timeout_ms: pursuit.stale_timeout_ms,
            goal_distance: pursuit.goal_distance,
            goal_threshold: pursuit.goal_threshold,
            drive_speed: pursuit.drive_speed,
            distance_divisor: pursuit.distance_divisor,
            angle_drive_ratio: pursuit.angle_drive_ratio,
            zone: pursuit.zone,
            speed_threshold: pursuit.speed_threshold,
        }),
    }
}

fn print_config_info(blueprint: &TrackerBlueprint, args: &InfoArgs) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║               Turret Tracker Configuration                   ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    let link = &blueprint.link;
    println!("📡 Vision Link");
    println!("   ├─ Version: {:?}", blueprint.version);
    println!("   ├─ Peer: {}", link.address());
    println!("   ├─ Buffer: {} bytes", link.buffer_capacity);
    println!("   ├─ Delimiter: {} zero bytes", link.zero_threshold);
    match link.idle_poll() {
        Some(poll) => println!("   └─ Idle poll: {:?}", poll),
        None => println!("   └─ Idle poll: disabled"),
    }

    let channels = &blueprint.dispatcher.channels;
    println!(
        "\n🔁 Output Channels ({}, every {} ms)",
        channels.len(),
        blueprint.dispatcher.period_ms
    );
    for (i, binding) in channels.iter().enumerate() {
        let prefix = if i == channels.len() - 1 { "└─" } else { "├─" };
        println!("   {} slot {} -> {}", prefix, binding.index, binding.actuator);
    }

    let dispense = &blueprint.dispense;
    println!("\n🎯 Firing");
    println!("   ├─ Shots per session: {}", blueprint.firing.max_shots);
    println!("   ├─ Min interval: {} ms", blueprint.firing.min_interval_ms);
    println!(
        "   ├─ Dispense: park {} ms, settle {} ms, release {} ms",
        dispense.park_ms, dispense.settle_ms, dispense.release_ms
    );
    match &dispense.boost {
        Some(boost) => println!(
            "   └─ Boost: {:+} for {} ms over {}",
            boost.delta, boost.duration_ms, boost.base_speed
        ),
        None => println!("   └─ Boost: off"),
    }

    if args.tuning {
        let p = &blueprint.pursuit;
        println!("\n⚙️  Pursuit Tuning");
        println!("   ├─ Period: {} ms (stale after {} ms)", p.period_ms, p.stale_timeout_ms);
        println!("   ├─ Goal width: {} +/- {}", p.goal_distance, p.goal_threshold);
        println!("   ├─ Drive speed: {} / {}", p.drive_speed, p.distance_divisor);
        println!("   ├─ Steering ratio: {}", p.angle_drive_ratio);
        println!("   ├─ Dead zone: {}", p.zone);
        println!("   └─ Ramp threshold: {}", p.speed_threshold);
    }

    println!();
}
