//! TelemetryFrame - Telemetry Link output
//!
//! One measurement recovered from the vision peer, plus the link state.

use serde::{Deserialize, Serialize};

/// Output vector slot carrying the target width
pub const WIDTH_CHANNEL: usize = 0;

/// Output vector slot carrying the target angle
pub const ANGLE_CHANNEL: usize = 1;

/// Output vector slot carrying the target height
pub const HEIGHT_CHANNEL: usize = 2;

/// Number of slots a frame occupies in the output vector
pub const FRAME_VECTOR_WIDTH: usize = 3;

/// Target measurement
///
/// Immutable once parsed; superseded by the next frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TelemetryFrame {
    /// Apparent target width (pixels), used as a distance proxy
    pub width: f64,

    /// Horizontal angle to the target, negative = left
    pub angle: f64,

    /// Apparent target height, carried to the output vector only
    #[serde(default)]
    pub height: Option<f64>,
}

impl TelemetryFrame {
    /// Create a frame without height
    pub fn new(width: f64, angle: f64) -> Self {
        Self {
            width,
            angle,
            height: None,
        }
    }

    /// Create a frame with height
    pub fn with_height(width: f64, angle: f64, height: f64) -> Self {
        Self {
            width,
            angle,
            height: Some(height),
        }
    }

    /// Lay the frame out as `[width, angle, height]`; missing height reads as 0
    pub fn to_output_vector(&self) -> [f64; FRAME_VECTOR_WIDTH] {
        let mut out = [0.0; FRAME_VECTOR_WIDTH];
        out[WIDTH_CHANNEL] = self.width;
        out[ANGLE_CHANNEL] = self.angle;
        out[HEIGHT_CHANNEL] = self.height.unwrap_or(0.0);
        out
    }
}

/// Telemetry link connection state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connected,
}

impl ConnectionState {
    pub fn is_connected(self) -> bool {
        self == Self::Connected
    }
}
