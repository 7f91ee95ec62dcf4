//! Layered error definitions
//!
//! Categorized by source: config / actuator / dispense

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Actuation Errors =====
    /// An actuator or drivetrain rejected a write
    #[error("actuator '{actuator}' write error: {message}")]
    ActuatorWrite { actuator: String, message: String },

    /// The dispense sequence could not complete
    #[error("dispense failed: {message}")]
    Dispense { message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create actuator write error
    pub fn actuator_write(actuator: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ActuatorWrite {
            actuator: actuator.into(),
            message: message.into(),
        }
    }

    /// Create dispense error
    pub fn dispense(message: impl Into<String>) -> Self {
        Self::Dispense {
            message: message.into(),
        }
    }
}
