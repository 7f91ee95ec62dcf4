//! Run statistics.

use std::time::Duration;

use observability::TrackingStatsAggregator;
use telemetry_link::LinkMetricsSnapshot;

/// Statistics from a tracker run
#[derive(Debug, Clone, Default)]
pub struct RunStats {
    /// Total duration of the run
    pub duration: Duration,

    /// Frame, shot and session counters
    pub tracking: TrackingStatsAggregator,

    /// Link counters at disconnect
    pub link: LinkMetricsSnapshot,

    /// Completion reports published
    pub reports: u32,
}

impl RunStats {
    /// Parsed frames per second
    pub fn fps(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.tracking.total_frames as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!();
        println!("Duration: {:.2}s ({:.2} frames/s)", self.duration.as_secs_f64(), self.fps());
        print!("{}", self.tracking.summary());
        println!("=== Link ===");
        println!("Bytes read: {}", self.link.bytes_read);
        println!("Frames delivered: {}", self.link.frames_delivered);
        println!("Frames dropped: {}", self.link.frames_dropped);
        println!("Empty frames: {}", self.link.malformed_frames);
        println!("Overwritten bytes: {}", self.link.overwritten_bytes);
        println!("Reports published: {}", self.reports);
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::TelemetryFrame;

    #[test]
    fn test_fps() {
        let mut stats = RunStats::default();
        assert_eq!(stats.fps(), 0.0);

        stats.duration = Duration::from_secs(2);
        stats.tracking.update_frame(&TelemetryFrame::new(100.0, 0.0));
        stats.tracking.update_frame(&TelemetryFrame::new(110.0, 1.0));
        assert!((stats.fps() - 1.0).abs() < 1e-9);
    }
}
