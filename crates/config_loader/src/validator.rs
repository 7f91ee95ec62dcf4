//! Config validation
//!
//! Rules:
//! - field ranges declared on the blueprint (`validator` derive)
//! - channel bindings address a slot of the frame vector
//! - actuator names are unique and non-empty
//! - feed arm outputs are within the actuator range
//! - the stale timeout outlasts at least one control period

use std::collections::HashSet;

use contracts::{ContractError, TrackerBlueprint, FRAME_VECTOR_WIDTH};
use ::validator::Validate;

/// Validate a TrackerBlueprint
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(blueprint: &TrackerBlueprint) -> Result<(), ContractError> {
    validate_ranges(blueprint)?;
    validate_channels(blueprint)?;
    validate_dispense(blueprint)?;
    validate_pursuit_timing(blueprint)?;
    Ok(())
}

/// Declared field ranges
fn validate_ranges(blueprint: &TrackerBlueprint) -> Result<(), ContractError> {
    blueprint
        .validate()
        .map_err(|e| ContractError::config_validation("blueprint", e.to_string()))
}

/// Channel bindings
fn validate_channels(blueprint: &TrackerBlueprint) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for (idx, binding) in blueprint.dispatcher.channels.iter().enumerate() {
        if binding.actuator.is_empty() {
            return Err(ContractError::config_validation(
                format!("dispatcher.channels[{}].actuator", idx),
                "actuator name cannot be empty",
            ));
        }
        if binding.index >= FRAME_VECTOR_WIDTH {
            return Err(ContractError::config_validation(
                format!("dispatcher.channels[{}].index", idx),
                format!(
                    "index {} out of range, frame vector has {} slots",
                    binding.index, FRAME_VECTOR_WIDTH
                ),
            ));
        }
        if !seen.insert(&binding.actuator) {
            return Err(ContractError::config_validation(
                format!("dispatcher.channels[actuator={}]", binding.actuator),
                "duplicate actuator",
            ));
        }
    }
    Ok(())
}

/// Feed arm outputs
fn validate_dispense(blueprint: &TrackerBlueprint) -> Result<(), ContractError> {
    let dispense = &blueprint.dispense;
    for (field, value) in [
        ("dispense.park_speed", dispense.park_speed),
        ("dispense.release_speed", dispense.release_speed),
    ] {
        if !(-1.0..=1.0).contains(&value) {
            return Err(ContractError::config_validation(
                field,
                format!("output must be within [-1, 1], got {}", value),
            ));
        }
    }
    Ok(())
}

/// Stale timeout vs. control period
fn validate_pursuit_timing(blueprint: &TrackerBlueprint) -> Result<(), ContractError> {
    let pursuit = &blueprint.pursuit;
    if pursuit.stale_timeout_ms <= pursuit.period_ms {
        return Err(ContractError::config_validation(
            "pursuit.stale_timeout_ms / pursuit.period_ms",
            format!(
                "stale_timeout_ms ({}) must be > period_ms ({})",
                pursuit.stale_timeout_ms, pursuit.period_ms
            ),
        ));
    }
    Ok(())
}
