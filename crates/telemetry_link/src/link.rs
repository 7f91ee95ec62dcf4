//! TCP link to the vision peer
//!
//! A background reader task pulls bytes off the socket, runs them through a
//! [`FrameReader`] and hands recovered frame text to the single attached
//! listener. Delivery is last-write-wins: a frame the listener has not taken
//! yet is replaced by the next one. Connection changes are published on a
//! `watch` channel.

use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use bytes::BytesMut;
use contracts::{ConnectionState, LinkConfig};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, trace, warn};

use crate::config::{LinkMetrics, LinkMetricsSnapshot};
use crate::error::{LinkError, Result};
use crate::frame_reader::{FrameReader, FrameReaderStats};
use crate::mailbox::{LinkListener, Mailbox};

const READ_CHUNK: usize = 4096;

/// What the listener receives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    /// Trimmed, non-empty frame text
    Frame(String),
    /// The peer closed the connection or a read failed
    Disconnected { reason: String },
}

type ListenerSlot = Arc<Mutex<Option<Mailbox>>>;
type WriterSlot = Arc<tokio::sync::Mutex<Option<OwnedWriteHalf>>>;

/// Telemetry link handle
pub struct TelemetryLink {
    config: LinkConfig,
    state: Arc<watch::Sender<ConnectionState>>,
    listener: ListenerSlot,
    writer: WriterSlot,
    reader: Option<JoinHandle<()>>,
    metrics: Arc<LinkMetrics>,
}

impl TelemetryLink {
    /// Create a disconnected link
    pub fn new(config: LinkConfig) -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            config,
            state: Arc::new(state),
            listener: Arc::new(Mutex::new(None)),
            writer: Arc::new(tokio::sync::Mutex::new(None)),
            reader: None,
            metrics: Arc::new(LinkMetrics::new()),
        }
    }

    /// Connect to the configured peer and start reading
    ///
    /// An existing connection is closed first.
    ///
    /// # Errors
    /// `LinkError::Connection` when the peer is unreachable or the connect
    /// timeout elapses.
    #[instrument(name = "link_connect", skip(self), fields(address = %self.config.address()))]
    pub async fn connect(&mut self) -> Result<()> {
        if self.reader.is_some() {
            self.disconnect().await;
        }

        let address = self.config.address();
        let dial = TcpStream::connect(address.as_str());
        let stream = match self.config.connect_timeout() {
            Some(limit) => tokio::time::timeout(limit, dial)
                .await
                .map_err(|_| LinkError::connection(&address, format!("timed out after {limit:?}")))?,
            None => dial.await,
        }
        .map_err(|e| LinkError::connection(&address, e))?;
        stream.set_nodelay(true)?;

        let (read_half, write_half) = stream.into_split();
        *self.writer.lock().await = Some(write_half);
        self.state.send_replace(ConnectionState::Connected);
        observability::record_link_state(true);

        let task = ReaderTask {
            frames: FrameReader::new(self.config.buffer_capacity, self.config.zero_threshold),
            reported: FrameReaderStats::default(),
            idle_poll: self.config.idle_poll(),
            listener: Arc::clone(&self.listener),
            writer: Arc::clone(&self.writer),
            state: Arc::clone(&self.state),
            metrics: Arc::clone(&self.metrics),
        };
        self.reader = Some(tokio::spawn(task.run(read_half)));

        info!(address = %address, "Vision link connected");
        Ok(())
    }

    /// Register the frame consumer
    ///
    /// Replaces any previous listener; the old one drains and then returns
    /// `None`.
    pub fn attach_listener(&self) -> LinkListener {
        let (mailbox, listener) = Mailbox::pair();
        let previous = self
            .listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(mailbox);
        if let Some(previous) = previous {
            previous.close();
        }
        listener
    }

    /// Send raw text to the peer
    ///
    /// A no-op while disconnected.
    ///
    /// # Errors
    /// `LinkError::Io` when the socket write fails; the writer is then
    /// released.
    pub async fn write(&self, text: &str) -> Result<()> {
        let mut guard = self.writer.lock().await;
        let Some(writer) = guard.as_mut() else {
            debug!(len = text.len(), "Write ignored, link is disconnected");
            return Ok(());
        };

        if let Err(e) = writer.write_all(text.as_bytes()).await {
            guard.take();
            return Err(e.into());
        }
        Ok(())
    }

    /// Close the connection and stop the reader
    ///
    /// Idempotent. No listener event is delivered after this returns; a
    /// frame the listener had not taken yet is discarded.
    pub async fn disconnect(&mut self) {
        let Some(handle) = self.reader.take() else {
            return;
        };
        handle.abort();
        let _ = handle.await;

        if let Some(mailbox) = self
            .listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            mailbox.clear();
        }

        if let Some(mut writer) = self.writer.lock().await.take() {
            let _ = writer.shutdown().await;
        }
        if self
            .state
            .send_replace(ConnectionState::Disconnected)
            .is_connected()
        {
            observability::record_link_state(false);
            info!("Vision link disconnected");
        }
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    pub fn is_connected(&self) -> bool {
        self.state().is_connected()
    }

    /// Follow connection state changes
    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    /// Get metrics snapshot
    pub fn metrics(&self) -> LinkMetricsSnapshot {
        self.metrics.snapshot()
    }
}

impl Drop for TelemetryLink {
    fn drop(&mut self) {
        if let Some(handle) = self.reader.take() {
            handle.abort();
        }
    }
}

/// Socket reader, owned by the spawned task
struct ReaderTask {
    frames: FrameReader,
    /// Reader counters already forwarded to metrics
    reported: FrameReaderStats,
    idle_poll: Option<Duration>,
    listener: ListenerSlot,
    writer: WriterSlot,
    state: Arc<watch::Sender<ConnectionState>>,
    metrics: Arc<LinkMetrics>,
}

impl ReaderTask {
    async fn run(mut self, mut stream: OwnedReadHalf) {
        let mut buf = BytesMut::with_capacity(READ_CHUNK);

        let reason = loop {
            let read = match self.idle_poll {
                Some(poll) => match tokio::time::timeout(poll, stream.read_buf(&mut buf)).await {
                    Ok(read) => read,
                    Err(_) => {
                        // Silent line reads as a zero byte
                        if let Some(text) = self.frames.idle_tick() {
                            self.deliver(text);
                        }
                        self.sync_stats();
                        continue;
                    }
                },
                None => stream.read_buf(&mut buf).await,
            };

            match read {
                Ok(0) => break "peer closed the connection".to_string(),
                Ok(n) => {
                    self.metrics.record_bytes(n);
                    observability::record_bytes_read(n);
                    for &byte in buf.iter() {
                        if let Some(text) = self.frames.push(byte) {
                            self.deliver(text);
                        }
                    }
                    buf.clear();
                    self.sync_stats();
                }
                Err(e) => break e.to_string(),
            }
        };

        self.finish(reason).await;
    }

    fn listener(&self) -> Option<Mailbox> {
        self.listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn deliver(&self, text: String) {
        let Some(mailbox) = self.listener() else {
            self.metrics.record_dropped();
            trace!("No listener attached, frame dropped");
            return;
        };

        self.metrics.record_delivered();
        if mailbox.put_frame(text) {
            self.metrics.record_dropped();
            observability::record_frame_dropped();
            debug!(
                dropped = self.metrics.frames_dropped.load(Ordering::Relaxed),
                "Listener behind, unread frame replaced"
            );
        }
    }

    /// Forward reader counters accumulated since the last call
    fn sync_stats(&mut self) {
        let stats = self.frames.stats();

        let malformed = stats.malformed_frames - self.reported.malformed_frames;
        if malformed > 0 {
            self.metrics.record_malformed(malformed);
            for _ in 0..malformed {
                observability::record_malformed_frame("framing");
            }
            debug!(count = malformed, "Discarded empty frame");
        }

        let overwritten = stats.overwritten_bytes - self.reported.overwritten_bytes;
        if overwritten > 0 {
            self.metrics.record_overwritten(overwritten);
            warn!(
                bytes = overwritten,
                "Frame buffer overflowed, oldest bytes overwritten"
            );
        }

        self.reported = stats;
    }

    async fn finish(self, reason: String) {
        warn!(reason = %reason, "Vision link lost");
        self.metrics.record_disconnect();
        self.writer.lock().await.take();
        self.state.send_replace(ConnectionState::Disconnected);
        observability::record_link_state(false);

        if let Some(mailbox) = self.listener() {
            mailbox.put_disconnected(reason);
        }
    }
}
