//! `validate` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;
use crate::tracker::SHOOTER_NAME;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    vision_peer: String,
    channel_count: usize,
    max_shots: u32,
    min_interval_ms: u64,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(blueprint) => {
            let warnings = collect_warnings(&blueprint);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    version: format!("{:?}", blueprint.version),
                    vision_peer: blueprint.link.address(),
                    channel_count: blueprint.dispatcher.channels.len(),
                    max_shots: blueprint.firing.max_shots,
                    min_interval_ms: blueprint.firing.min_interval_ms,
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(blueprint: &contracts::TrackerBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();

    if blueprint.dispatcher.channels.is_empty() {
        warnings.push("No dispatcher channels - actuators will not follow the target".to_string());
    }

    if blueprint.link.idle_poll().is_none() {
        warnings.push(
            "link.idle_poll_ms is 0 - a frame closes only after the next zero run arrives"
                .to_string(),
        );
    }

    let dispense = &blueprint.dispense;
    let dispense_ms = dispense.park_ms + dispense.settle_ms + dispense.release_ms;
    if dispense_ms >= blueprint.firing.min_interval_ms {
        warnings.push(format!(
            "dispense sequence ({} ms) outlasts firing.min_interval_ms ({} ms)",
            dispense_ms, blueprint.firing.min_interval_ms
        ));
    }

    if dispense.boost.is_some()
        && blueprint
            .dispatcher
            .channels
            .iter()
            .any(|binding| binding.actuator == SHOOTER_NAME)
    {
        warnings.push(format!(
            "dispense.boost drives '{SHOOTER_NAME}', which a dispatcher channel also writes every {} ms - the boost is overwritten",
            blueprint.dispatcher.period_ms
        ));
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Vision peer: {}", summary.vision_peer);
            println!("  Channels: {}", summary.channel_count);
            println!(
                "  Firing: {} shots, {} ms apart",
                summary.max_shots, summary.min_interval_ms
            );
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
