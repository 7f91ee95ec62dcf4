//! # Contracts
//!
//! Frozen interface contracts shared by every crate of the tracker: telemetry
//! frames, drive commands, collaborator traits and the configuration blueprint.
//! Business crates depend on this crate only; reverse dependencies are prohibited.
//!
//! ## Time Model
//! - All deadlines use `tokio::time::Instant` in the runtime crates so tests can
//!   run on a paused clock; contracts only carry durations in milliseconds.

mod blueprint;
mod drive;
mod error;
mod frame;
mod sink;

pub use blueprint::*;
pub use drive::*;
pub use error::*;
pub use frame::*;
pub use sink::*;
