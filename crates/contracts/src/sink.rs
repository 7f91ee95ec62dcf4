//! Collaborator traits - what the tracker drives
//!
//! The drivetrain, actuators, dispense mechanism and status reporting live
//! outside the core; these traits are the whole contract with them.

use crate::{ContractError, DriveCommand};

/// Drivetrain abstraction (tank drive)
pub trait DriveSink: Send + Sync {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Apply a differential drive command
    ///
    /// # Errors
    /// Returns `ContractError::ActuatorWrite`; callers retry on the next tick.
    fn apply(&self, command: DriveCommand) -> Result<(), ContractError>;
}

/// Single scalar actuator refreshed by the output dispatcher
pub trait ActuatorSink: Send + Sync {
    /// Actuator name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Apply an output value
    ///
    /// # Errors
    /// Returns `ContractError::ActuatorWrite`; callers retry on the next cycle.
    fn apply(&self, value: f64) -> Result<(), ContractError>;
}

/// External status publication
pub trait ReportSink: Send + Sync {
    /// A tracking session finished after firing `count` shots
    fn report_fired(&self, count: u32);
}

/// Payload dispense mechanism
///
/// Invoked synchronously (awaited) by the firing supervisor while firing.
#[trait_variant::make(DispenseAction: Send)]
pub trait LocalDispenseAction {
    /// Run one full park / settle / release sequence
    async fn dispense(&self) -> Result<(), ContractError>;
}
