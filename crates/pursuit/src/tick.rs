//! Pursuit numeric core
//!
//! Pure tick computation: no I/O, no clock reads. The caller supplies `now`.
//!
//! Per tick:
//! 1. no update within `stale_timeout` -> stale, drive held at zero and
//!    alignment cleared
//! 2. distance term from the averaged width (dead-zone `goal_threshold`)
//! 3. steering term from the averaged angle (dead-zone `zone`)
//! 4. per-side ramp limiting against the previous output
//! 5. alignment: both sides below `zone`

use std::time::Duration;

use contracts::{DriveCommand, PursuitConfig};
use tokio::time::Instant;

/// One `(angle, width)` measurement
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Sample {
    angle: f64,
    width: f64,
}

/// Result of one control tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// No update within the stale timeout; zero drive is commanded
    Stale {
        /// Time since the last update
        since: Duration,
    },
    /// Drive command computed from the latest two measurements
    Drive {
        command: DriveCommand,
        can_shoot: bool,
    },
}

impl TickOutcome {
    /// Command to issue to the drivetrain
    pub fn command(&self) -> DriveCommand {
        match self {
            Self::Stale { .. } => DriveCommand::STOP,
            Self::Drive { command, .. } => *command,
        }
    }
}

/// Pursuit controller state
#[derive(Debug, Clone)]
pub struct PursuitCore {
    config: PursuitConfig,
    latest: Sample,
    previous: Sample,
    last_update: Instant,
    /// Output of the last computed tick, the ramp reference
    output: DriveCommand,
    can_shoot: bool,
}

impl PursuitCore {
    /// Create a core with zeroed measurements, fresh as of `now`
    pub fn new(config: PursuitConfig, now: Instant) -> Self {
        Self {
            config,
            latest: Sample::default(),
            previous: Sample::default(),
            last_update: now,
            output: DriveCommand::STOP,
            can_shoot: false,
        }
    }

    /// Record a measurement; the latest one becomes the previous
    pub fn update(&mut self, angle: f64, width: f64, now: Instant) {
        self.previous = self.latest;
        self.latest = Sample { angle, width };
        self.last_update = now;
    }

    /// Compute one control tick
    pub fn tick(&mut self, now: Instant) -> TickOutcome {
        let since = now.saturating_duration_since(self.last_update);
        if since > self.config.stale_timeout() {
            self.output = DriveCommand::STOP;
            self.can_shoot = false;
            return TickOutcome::Stale { since };
        }

        let avg_width = (self.previous.width + self.latest.width) / 2.0;
        let avg_angle = (self.previous.angle + self.latest.angle) / 2.0;

        let distance = self.distance_term(avg_width);
        let steer = self.steering_term(avg_angle);

        let left = ramp(self.output.left, distance + steer, self.config.speed_threshold);
        let right = ramp(self.output.right, distance - steer, self.config.speed_threshold);

        self.output = DriveCommand::new(left, right);
        self.can_shoot = left.abs() < self.config.zone && right.abs() < self.config.zone;

        TickOutcome::Drive {
            command: self.output,
            can_shoot: self.can_shoot,
        }
    }

    /// Alignment flag from the last tick; false once stale
    pub fn can_shoot(&self) -> bool {
        self.can_shoot
    }

    /// Output of the last tick
    pub fn output(&self) -> DriveCommand {
        self.output
    }

    pub fn last_update(&self) -> Instant {
        self.last_update
    }

    pub fn config(&self) -> &PursuitConfig {
        &self.config
    }

    /// Back off when too close, advance when too far
    fn distance_term(&self, avg_width: f64) -> f64 {
        let delta = avg_width - self.config.goal_distance;
        if delta.abs() > self.config.goal_threshold {
            -self.config.drive_speed * delta / self.config.distance_divisor
        } else {
            0.0
        }
    }

    /// Added to the left side, subtracted from the right
    ///
    /// Both signs of the angle take the same adjustment.
    fn steering_term(&self, avg_angle: f64) -> f64 {
        if avg_angle.abs() > self.config.zone {
            avg_angle * self.config.angle_drive_ratio
        } else {
            0.0
        }
    }
}

/// Small changes are averaged with the previous output
fn ramp(previous: f64, target: f64, threshold: f64) -> f64 {
    if (target - previous).abs() < threshold {
        (previous + target) / 2.0
    } else {
        target
    }
}
