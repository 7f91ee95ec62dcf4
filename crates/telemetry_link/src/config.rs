//! Link metrics

use std::sync::atomic::{AtomicU64, Ordering};

/// Telemetry link metrics
///
/// Shared between the link handle and its reader task; cumulative across
/// reconnects.
#[derive(Debug, Default)]
pub struct LinkMetrics {
    /// Raw bytes read
    pub bytes_read: AtomicU64,

    /// Frames handed to the listener slot
    pub frames_delivered: AtomicU64,

    /// Frames replaced before the listener took them, or with no listener
    pub frames_dropped: AtomicU64,

    /// Frames discarded by the reader (empty after trim)
    pub malformed_frames: AtomicU64,

    /// Bytes lost to buffer overwrite
    pub overwritten_bytes: AtomicU64,

    /// Connections lost (peer close or I/O error)
    pub disconnects: AtomicU64,
}

impl LinkMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_bytes(&self, count: usize) {
        self.bytes_read.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn record_delivered(&self) {
        self.frames_delivered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dropped(&self) {
        self.frames_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_malformed(&self, count: u64) {
        self.malformed_frames.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_overwritten(&self, count: u64) {
        self.overwritten_bytes.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_disconnect(&self) {
        self.disconnects.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot
    pub fn snapshot(&self) -> LinkMetricsSnapshot {
        LinkMetricsSnapshot {
            bytes_read: self.bytes_read.load(Ordering::Relaxed),
            frames_delivered: self.frames_delivered.load(Ordering::Relaxed),
            frames_dropped: self.frames_dropped.load(Ordering::Relaxed),
            malformed_frames: self.malformed_frames.load(Ordering::Relaxed),
            overwritten_bytes: self.overwritten_bytes.load(Ordering::Relaxed),
            disconnects: self.disconnects.load(Ordering::Relaxed),
        }
    }
}

/// Metrics snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkMetricsSnapshot {
    pub bytes_read: u64,
    pub frames_delivered: u64,
    pub frames_dropped: u64,
    pub malformed_frames: u64,
    pub overwritten_bytes: u64,
    pub disconnects: u64,
}
