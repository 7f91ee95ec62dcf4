//! Tracker metrics
//!
//! Prometheus recorders for each stage plus an in-memory aggregator used for
//! the end-of-run summary.

use contracts::{DriveCommand, TelemetryFrame};
use metrics::{
    counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram, Unit,
};

/// Register help text with the installed recorder
pub fn describe_metrics() {
    describe_counter!(
        "turret_tracker_link_bytes_total",
        Unit::Bytes,
        "Raw bytes read from the vision peer"
    );
    describe_counter!(
        "turret_tracker_frames_received_total",
        "Frames parsed into a measurement"
    );
    describe_counter!(
        "turret_tracker_frames_malformed_total",
        "Frames discarded at the framing or payload stage"
    );
    describe_counter!(
        "turret_tracker_frames_dropped_total",
        "Frames superseded before the listener took them"
    );
    describe_gauge!(
        "turret_tracker_link_connected",
        "1 while the vision link is connected"
    );
    describe_counter!(
        "turret_tracker_link_disconnects_total",
        "Vision link disconnects"
    );
    describe_gauge!(
        "turret_tracker_drive_output",
        "Last drive output per side, in [-1, 1]"
    );
    describe_histogram!(
        "turret_tracker_drive_magnitude",
        "Larger of the two drive outputs per tick"
    );
    describe_counter!(
        "turret_tracker_stale_ticks_total",
        "Control ticks that found the telemetry stale"
    );
    describe_counter!(
        "turret_tracker_actuator_writes_total",
        "Actuator and drive writes by outcome"
    );
    describe_counter!("turret_tracker_shots_fired_total", "Payloads dispensed");
    describe_counter!(
        "turret_tracker_sessions_completed_total",
        "Firing sessions that spent their budget"
    );
    describe_histogram!(
        "turret_tracker_session_shots",
        "Shots reported per completed session"
    );
}

/// Raw bytes pulled off the vision link
pub fn record_bytes_read(count: usize) {
    counter!("turret_tracker_link_bytes_total").increment(count as u64);
}

/// A frame was recovered and parsed
pub fn record_frame_received() {
    counter!("turret_tracker_frames_received_total").increment(1);
}

/// A frame was discarded; `stage` is `framing` or `payload`
pub fn record_malformed_frame(stage: &str) {
    counter!(
        "turret_tracker_frames_malformed_total",
        "stage" => stage.to_string()
    )
    .increment(1);
}

/// An unread frame was replaced by a newer one, or nobody was listening
pub fn record_frame_dropped() {
    counter!("turret_tracker_frames_dropped_total").increment(1);
}

/// Link connection state (1 = connected)
pub fn record_link_state(connected: bool) {
    gauge!("turret_tracker_link_connected").set(if connected { 1.0 } else { 0.0 });
    if !connected {
        counter!("turret_tracker_link_disconnects_total").increment(1);
    }
}

/// Drive command issued by the pursuit controller
pub fn record_drive_command(command: DriveCommand) {
    gauge!("turret_tracker_drive_output", "side" => "left").set(command.left);
    gauge!("turret_tracker_drive_output", "side" => "right").set(command.right);
    histogram!("turret_tracker_drive_magnitude").record(command.magnitude());
}

/// Control tick with no fresh measurement
pub fn record_stale_tick() {
    counter!("turret_tracker_stale_ticks_total").increment(1);
}

/// Actuator or drive write
pub fn record_actuator_write(actuator: &str, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "turret_tracker_actuator_writes_total",
        "actuator" => actuator.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// One payload dispensed
pub fn record_shot_fired() {
    counter!("turret_tracker_shots_fired_total").increment(1);
}

/// A tracking session reported completion after `shots`
pub fn record_session_completed(shots: u32) {
    counter!("turret_tracker_sessions_completed_total").increment(1);
    histogram!("turret_tracker_session_shots").record(shots as f64);
}

/// Tracking statistics aggregator
///
/// Aggregates in memory for the run summary.
#[derive(Debug, Clone, Default)]
pub struct TrackingStatsAggregator {
    /// Frames received
    pub total_frames: u64,

    /// Frames discarded as malformed
    pub malformed_frames: u64,

    /// Control ticks without a fresh measurement
    pub stale_ticks: u64,

    /// Payloads dispensed
    pub shots_fired: u64,

    /// Sessions reported complete
    pub sessions_completed: u64,

    /// Apparent target width
    pub width_stats: RunningStats,

    /// Angle to target
    pub angle_stats: RunningStats,
}

impl TrackingStatsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Account one received frame
    pub fn update_frame(&mut self, frame: &TelemetryFrame) {
        self.total_frames += 1;
        self.width_stats.push(frame.width);
        self.angle_stats.push(frame.angle);
    }

    pub fn record_malformed(&mut self) {
        self.malformed_frames += 1;
    }

    /// Account control ticks that ran without a fresh measurement
    pub fn add_stale_ticks(&mut self, count: u64) {
        self.stale_ticks += count;
    }

    pub fn record_shot(&mut self) {
        self.shots_fired += 1;
    }

    pub fn record_session(&mut self) {
        self.sessions_completed += 1;
    }

    /// Build the summary report
    pub fn summary(&self) -> TrackingSummary {
        let seen = self.total_frames + self.malformed_frames;
        TrackingSummary {
            total_frames: self.total_frames,
            malformed_frames: self.malformed_frames,
            malformed_rate: if seen > 0 {
                self.malformed_frames as f64 / seen as f64 * 100.0
            } else {
                0.0
            },
            stale_ticks: self.stale_ticks,
            shots_fired: self.shots_fired,
            sessions_completed: self.sessions_completed,
            width: StatsSummary::from(&self.width_stats),
            angle: StatsSummary::from(&self.angle_stats),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Tracking summary
#[derive(Debug, Clone, Default)]
pub struct TrackingSummary {
    pub total_frames: u64,
    pub malformed_frames: u64,
    pub malformed_rate: f64,
    pub stale_ticks: u64,
    pub shots_fired: u64,
    pub sessions_completed: u64,
    pub width: StatsSummary,
    pub angle: StatsSummary,
}

impl std::fmt::Display for TrackingSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Tracking Summary ===")?;
        writeln!(f, "Frames received: {}", self.total_frames)?;
        writeln!(
            f,
            "Malformed frames: {} ({:.2}%)",
            self.malformed_frames, self.malformed_rate
        )?;
        writeln!(f, "Stale ticks: {}", self.stale_ticks)?;
        writeln!(f, "Shots fired: {}", self.shots_fired)?;
        writeln!(f, "Sessions completed: {}", self.sessions_completed)?;
        writeln!(f, "Target width: {}", self.width)?;
        writeln!(f, "Target angle: {}", self.angle)?;
        Ok(())
    }
}

/// Summary of a `RunningStats`
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online statistics (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// Add a sample
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    /// Sample count
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Mean
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    /// Standard deviation
    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// Minimum
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Maximum
    pub fn max(&self) -> f64 {
        self.max
    }
}
