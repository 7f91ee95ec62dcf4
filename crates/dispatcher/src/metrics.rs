//! Channel metrics for observability

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics for a single dispatcher channel
#[derive(Debug, Default)]
pub struct ChannelMetrics {
    /// Total successful writes
    write_count: AtomicU64,
    /// Total write failures
    failure_count: AtomicU64,
}

impl ChannelMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Get total write count
    pub fn write_count(&self) -> u64 {
        self.write_count.load(Ordering::Relaxed)
    }

    /// Increment write count
    pub fn inc_write_count(&self) {
        self.write_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Get failure count
    pub fn failure_count(&self) -> u64 {
        self.failure_count.load(Ordering::Relaxed)
    }

    /// Increment failure count
    pub fn inc_failure_count(&self) {
        self.failure_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> ChannelMetricsSnapshot {
        ChannelMetricsSnapshot {
            write_count: self.write_count(),
            failure_count: self.failure_count(),
        }
    }
}

/// Snapshot of channel metrics (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChannelMetricsSnapshot {
    pub write_count: u64,
    pub failure_count: u64,
}
