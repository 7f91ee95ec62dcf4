//! Dispatcher error types

use thiserror::Error;

/// Dispatcher-specific errors
#[derive(Debug, Error)]
pub enum DispatcherError {
    /// Every worker slot is taken
    #[error("dispatcher capacity of {capacity} channels exhausted")]
    CapacityExceeded { capacity: usize },

    /// Channel index outside the output vector
    #[error("channel {index} out of range, output vector has {len} slots")]
    ChannelOutOfRange { index: usize, len: usize },

    /// Bindings cannot change while workers run
    #[error("dispatcher is already running")]
    AlreadyRunning,
}
