//! Log-backed collaborators
//!
//! Stand-ins for hardware: every output is reported through `tracing`.
//! Changes are logged at info, repeats at trace.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use contracts::{ActuatorSink, ContractError, DriveCommand, DriveSink, ReportSink};
use tracing::{info, trace};

/// Actuator that logs each applied value
pub struct LogActuator {
    name: String,
    last: Mutex<Option<f64>>,
    applied: AtomicU64,
}

impl LogActuator {
    /// Create a new LogActuator with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            last: Mutex::new(None),
            applied: AtomicU64::new(0),
        }
    }

    /// Last applied value
    pub fn last_value(&self) -> Option<f64> {
        *self.last.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of apply calls
    pub fn applied(&self) -> u64 {
        self.applied.load(Ordering::Relaxed)
    }
}

impl ActuatorSink for LogActuator {
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, value: f64) -> Result<(), ContractError> {
        self.applied.fetch_add(1, Ordering::Relaxed);
        let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
        if *last != Some(value) {
            info!(actuator = %self.name, value, "Actuator output changed");
        } else {
            trace!(actuator = %self.name, value, "Actuator output");
        }
        *last = Some(value);
        Ok(())
    }
}

/// Drivetrain that logs each command
pub struct LogDrive {
    name: String,
    last: Mutex<Option<DriveCommand>>,
}

impl LogDrive {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            last: Mutex::new(None),
        }
    }

    /// Last applied command
    pub fn last_command(&self) -> Option<DriveCommand> {
        *self.last.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl DriveSink for LogDrive {
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, command: DriveCommand) -> Result<(), ContractError> {
        let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
        if *last != Some(command) {
            info!(
                drive = %self.name,
                left = command.left,
                right = command.right,
                "Drive command changed"
            );
        } else {
            trace!(drive = %self.name, left = command.left, right = command.right, "Drive command");
        }
        *last = Some(command);
        Ok(())
    }
}

/// Status reporter that logs completions
#[derive(Default)]
pub struct LogReport {
    reports: AtomicU32,
    last_count: AtomicU32,
}

impl LogReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Completions reported so far
    pub fn reports(&self) -> u32 {
        self.reports.load(Ordering::Relaxed)
    }

    /// Shot count of the last report
    pub fn last_count(&self) -> u32 {
        self.last_count.load(Ordering::Relaxed)
    }
}

impl ReportSink for LogReport {
    fn report_fired(&self, count: u32) {
        self.reports.fetch_add(1, Ordering::Relaxed);
        self.last_count.store(count, Ordering::Relaxed);
        info!(shots = count, "Target engaged, firing complete");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_actuator_tracks_last_value() {
        let actuator = LogActuator::new("traam");
        assert_eq!(actuator.name(), "traam");
        assert_eq!(actuator.last_value(), None);

        actuator.apply(0.4).unwrap();
        actuator.apply(0.4).unwrap();
        assert_eq!(actuator.last_value(), Some(0.4));
        assert_eq!(actuator.applied(), 2);
    }

    #[test]
    fn test_log_drive_tracks_last_command() {
        let drive = LogDrive::new("tank");
        drive.apply(DriveCommand::new(0.2, -0.2)).unwrap();
        assert_eq!(drive.last_command(), Some(DriveCommand::new(0.2, -0.2)));
    }

    #[test]
    fn test_log_report_counts() {
        let report = LogReport::new();
        report.report_fired(4);
        assert_eq!(report.reports(), 1);
        assert_eq!(report.last_count(), 4);
    }
}
