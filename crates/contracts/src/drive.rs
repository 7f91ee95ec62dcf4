//! DriveCommand - Pursuit Controller output

use serde::{Deserialize, Serialize};

/// Differential (tank) drive command, each side in `[-1.0, 1.0]`
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DriveCommand {
    pub left: f64,
    pub right: f64,
}

impl DriveCommand {
    /// Both sides stopped
    pub const STOP: Self = Self {
        left: 0.0,
        right: 0.0,
    };

    pub fn new(left: f64, right: f64) -> Self {
        Self { left, right }
    }

    /// Clamp both sides into the actuator range
    pub fn clamped(self) -> Self {
        Self {
            left: self.left.clamp(-1.0, 1.0),
            right: self.right.clamp(-1.0, 1.0),
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.left == 0.0 && self.right == 0.0
    }

    /// Largest absolute side output
    pub fn magnitude(&self) -> f64 {
        self.left.abs().max(self.right.abs())
    }
}
