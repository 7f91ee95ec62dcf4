//! # Dispatcher
//!
//! Periodic output dispatch.
//!
//! Responsibilities:
//! - Hold the shared `OutputVector`
//! - Re-apply each bound channel to its actuator on a fixed period
//! - Isolate actuator failures, retrying on the next cycle
//! - Log-backed collaborator sinks

pub mod dispatcher;
pub mod error;
pub mod handle;
pub mod metrics;
pub mod output;
pub mod sinks;

pub use contracts::ActuatorSink;
pub use dispatcher::{OutputDispatcher, DEFAULT_PERIOD};
pub use error::DispatcherError;
pub use handle::ChannelHandle;
pub use metrics::{ChannelMetrics, ChannelMetricsSnapshot};
pub use output::OutputVector;
pub use sinks::{LogActuator, LogDrive, LogReport};
