//! Tracker orchestration module.

mod orchestrator;
mod stats;

pub use orchestrator::{Tracker, TrackerConfig, SHOOTER_NAME};
pub use stats::RunStats;
