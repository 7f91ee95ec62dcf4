//! # Telemetry Link
//!
//! Vision peer link.
//!
//! Responsibilities:
//! - Hold one TCP connection to the vision peer
//! - Recover zero-delimited text frames from the byte stream
//! - Hand frame text to a single listener, newest frame wins
//! - Parse frame text into `TelemetryFrame`
//!
//! ## Usage Example
//!
//! ```ignore
//! use telemetry_link::{parse_frame, LinkEvent, TelemetryLink};
//!
//! let mut link = TelemetryLink::new(blueprint.link.clone());
//! let mut events = link.attach_listener();
//! link.connect().await?;
//!
//! while let Some(event) = events.recv().await {
//!     match event {
//!         LinkEvent::Frame(text) => controller.update(parse_frame(&text)?),
//!         LinkEvent::Disconnected { reason } => break,
//!     }
//! }
//! ```

mod config;
mod error;
mod frame_reader;
mod link;
mod mailbox;
mod payload;

// Re-exports
pub use config::{LinkMetrics, LinkMetricsSnapshot};
pub use contracts::{ConnectionState, TelemetryFrame};
pub use error::{LinkError, Result};
pub use frame_reader::{FrameReader, FrameReaderStats};
pub use link::{LinkEvent, TelemetryLink};
pub use mailbox::LinkListener;
pub use payload::parse_frame;
