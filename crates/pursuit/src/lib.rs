//! # Pursuit
//!
//! Closed-loop pursuit controller.
//!
//! Responsibilities:
//! - Keep the latest two `(angle, width)` measurements
//! - Turn them into a differential drive command every period
//! - Hold the drive at zero when telemetry goes stale
//! - Expose the alignment flag used to authorize firing
//!
//! ## Usage Example
//!
//! ```ignore
//! use pursuit::PursuitController;
//!
//! let mut controller = PursuitController::new(blueprint.pursuit.clone());
//! controller.start(drive);
//!
//! controller.update(frame.angle, frame.width);
//! if controller.can_shoot() {
//!     // aligned
//! }
//!
//! controller.stop();
//! controller.join().await;
//! ```

mod controller;
mod tick;

// Re-exports
pub use contracts::{DriveCommand, PursuitConfig};
pub use controller::{PursuitController, PursuitMetrics, PursuitMetricsSnapshot};
pub use tick::{PursuitCore, TickOutcome};
