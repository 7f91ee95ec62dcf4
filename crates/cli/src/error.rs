//! Error types for CLI operations.

use supervisor::SupervisorError;
use telemetry_link::LinkError;
use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Vision link could not be established
    #[error("Failed to reach vision peer: {0}")]
    Link(#[from] LinkError),

    /// Tracking session could not be started
    #[error("Tracking failed: {0}")]
    Tracking(#[from] SupervisorError),
}

impl CliError {
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }
}

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
