//! Supervisor error types

use dispatcher::DispatcherError;
use thiserror::Error;

/// Firing supervisor errors
#[derive(Debug, Error)]
pub enum SupervisorError {
    /// A channel binding names an actuator that was not supplied
    #[error("no actuator named '{name}' for channel {index}")]
    UnknownActuator { name: String, index: usize },

    /// Output dispatcher rejected a binding
    #[error("dispatcher error: {0}")]
    Dispatcher(#[from] DispatcherError),

    /// Collaborator failure
    #[error("contract error: {0}")]
    Contract(#[from] contracts::ContractError),
}
