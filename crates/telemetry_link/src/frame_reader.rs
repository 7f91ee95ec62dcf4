//! Zero-delimited frame recovery
//!
//! The vision peer writes a text measurement followed by a run of zero
//! bytes. A silent line also reads as zero. A frame is closed once
//! `zero_threshold` consecutive zeros have been seen; its text is the
//! buffered bytes decoded and trimmed of leading/trailing control and space
//! characters.
//!
//! The buffer is circular: once `capacity` bytes accumulate without a frame
//! boundary the oldest bytes are overwritten, which keeps the most recent
//! text.

use std::fmt;

use ringbuf::{traits::*, HeapRb};

/// Frame reader counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameReaderStats {
    /// Bytes pushed (idle ticks excluded)
    pub bytes_read: u64,
    /// Frames emitted
    pub frames_emitted: u64,
    /// Boundaries reached over text that trimmed to nothing
    pub malformed_frames: u64,
    /// Bytes lost to overwrite
    pub overwritten_bytes: u64,
}

/// Byte-at-a-time frame state machine
pub struct FrameReader {
    buffer: HeapRb<u8>,
    zero_threshold: usize,
    consec_zero: usize,
    /// A non-zero byte is buffered
    has_content: bool,
    stats: FrameReaderStats,
}

impl fmt::Debug for FrameReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameReader")
            .field("len", &self.buffer.occupied_len())
            .field("consec_zero", &self.consec_zero)
            .field("stats", &self.stats)
            .finish()
    }
}

impl FrameReader {
    /// Create a reader
    ///
    /// `capacity` and `zero_threshold` are clamped to at least 1.
    pub fn new(capacity: usize, zero_threshold: usize) -> Self {
        Self {
            buffer: HeapRb::new(capacity.max(1)),
            zero_threshold: zero_threshold.max(1),
            consec_zero: 0,
            has_content: false,
            stats: FrameReaderStats::default(),
        }
    }

    /// Push one byte read from the wire
    ///
    /// Returns the frame text when this byte closes a frame.
    pub fn push(&mut self, byte: u8) -> Option<String> {
        self.stats.bytes_read += 1;
        self.step(byte)
    }

    /// Account one poll of a silent line
    pub fn idle_tick(&mut self) -> Option<String> {
        self.step(0)
    }

    /// Push a slice, collecting every frame it closes
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<String> {
        bytes.iter().filter_map(|&b| self.push(b)).collect()
    }

    /// Drop buffered bytes and the zero count; counters are kept
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.consec_zero = 0;
        self.has_content = false;
    }

    pub fn stats(&self) -> FrameReaderStats {
        self.stats
    }

    /// Bytes currently buffered
    pub fn buffered_len(&self) -> usize {
        self.buffer.occupied_len()
    }

    fn step(&mut self, byte: u8) -> Option<String> {
        // Leading zeros never start a frame
        if byte == 0 && self.buffer.is_empty() {
            return None;
        }

        if byte == 0 {
            self.consec_zero += 1;
        } else {
            self.consec_zero = 0;
            self.has_content = true;
        }

        let mut frame = None;
        if self.consec_zero >= self.zero_threshold && self.has_content {
            let text = self.buffered_text();
            self.reset();
            if text.is_empty() {
                self.stats.malformed_frames += 1;
            } else {
                self.stats.frames_emitted += 1;
                frame = Some(text);
            }
        }

        // The byte is stored even when it closed a frame
        if self.buffer.push_overwrite(byte).is_some() {
            self.stats.overwritten_bytes += 1;
        }
        frame
    }

    /// Buffered bytes, oldest first, decoded and trimmed
    fn buffered_text(&self) -> String {
        let bytes: Vec<u8> = self.buffer.iter().copied().collect();
        String::from_utf8_lossy(&bytes)
            .trim_matches(|c: char| c <= ' ')
            .to_string()
    }
}
