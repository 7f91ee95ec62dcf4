//! Collaborator implementations
//!
//! Log-backed drivetrain, actuator and report sinks.

mod log;

pub use self::log::{LogActuator, LogDrive, LogReport};
