//! # Supervisor
//!
//! Firing supervisor: owns one tracking session at a time.
//!
//! Responsibilities:
//! - Start and stop the pursuit controller and output dispatcher together
//! - Route telemetry frames into both
//! - Fire when aligned, at most `max_shots` per session and no faster than
//!   `min_interval`
//! - Report completion once per session
//!
//! ## Usage Example
//!
//! ```ignore
//! use supervisor::{Collaborators, FeedArmDispenser, FiringSupervisor, FrameOutcome};
//!
//! let dispenser = FeedArmDispenser::new(feed_arm, blueprint.dispense.clone());
//! let mut supervisor = FiringSupervisor::new(&blueprint, collaborators, dispenser);
//! supervisor.start_tracking()?;
//!
//! while let Some(frame) = frames.recv().await {
//!     if let FrameOutcome::Completed(_) = supervisor.on_frame(&frame).await {
//!         break;
//!     }
//! }
//! supervisor.stop_tracking().await;
//! ```

mod dispense;
mod error;
mod session;
mod supervisor;

pub use dispense::FeedArmDispenser;
pub use error::SupervisorError;
pub use session::ShotSession;
pub use supervisor::{Collaborators, FiringSupervisor, FrameOutcome, SupervisorState};
