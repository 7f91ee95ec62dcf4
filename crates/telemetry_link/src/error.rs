//! Telemetry link error types

use thiserror::Error;

/// Telemetry link error
#[derive(Debug, Error)]
pub enum LinkError {
    /// Vision peer unreachable
    #[error("failed to connect to {address}: {message}")]
    Connection {
        /// `host:port` that was dialed
        address: String,
        /// Error message
        message: String,
    },

    /// Frame text does not hold a measurement
    #[error("malformed payload {payload:?}: {message}")]
    MalformedPayload {
        /// Frame text as received
        payload: String,
        /// Error message
        message: String,
    },

    /// Socket I/O failure
    #[error("link I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl LinkError {
    pub fn connection(address: impl Into<String>, message: impl ToString) -> Self {
        Self::Connection {
            address: address.into(),
            message: message.to_string(),
        }
    }

    pub fn malformed(payload: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedPayload {
            payload: payload.into(),
            message: message.into(),
        }
    }
}

/// Telemetry link Result alias
pub type Result<T> = std::result::Result<T, LinkError>;
