//! OutputDispatcher - keeps actuators refreshed from the output vector

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use contracts::ActuatorSink;
use tracing::{info, instrument};

use crate::error::DispatcherError;
use crate::handle::ChannelHandle;
use crate::metrics::ChannelMetricsSnapshot;
use crate::output::OutputVector;

/// Default refresh period per channel
pub const DEFAULT_PERIOD: Duration = Duration::from_millis(100);

/// Periodic output dispatcher
///
/// Bindings are collected with [`attach`](Self::attach), then
/// [`run`](Self::run) starts one worker per binding. [`stop`](Self::stop)
/// only clears the shared flag; workers exit within one period.
pub struct OutputDispatcher {
    vector: OutputVector,
    capacity: usize,
    period: Duration,
    bindings: Vec<(usize, Arc<dyn ActuatorSink>)>,
    handles: Vec<ChannelHandle>,
    running: Arc<AtomicBool>,
}

impl OutputDispatcher {
    /// Create a dispatcher over `vector` with room for `capacity` channels
    pub fn new(vector: OutputVector, capacity: usize) -> Self {
        Self {
            vector,
            capacity,
            period: DEFAULT_PERIOD,
            bindings: Vec::with_capacity(capacity),
            handles: Vec::new(),
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Override the refresh period
    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    /// Bind vector slot `index` to `sink`
    ///
    /// # Errors
    /// - `CapacityExceeded` when every slot is bound
    /// - `ChannelOutOfRange` when `index` is outside the vector
    /// - `AlreadyRunning` once workers have been started
    pub fn attach(
        &mut self,
        index: usize,
        sink: Arc<dyn ActuatorSink>,
    ) -> Result<(), DispatcherError> {
        if self.is_running() || !self.handles.is_empty() {
            return Err(DispatcherError::AlreadyRunning);
        }
        if self.bindings.len() >= self.capacity {
            return Err(DispatcherError::CapacityExceeded {
                capacity: self.capacity,
            });
        }
        let len = self.vector.len();
        if index >= len {
            return Err(DispatcherError::ChannelOutOfRange { index, len });
        }

        self.bindings.push((index, sink));
        Ok(())
    }

    /// Start one worker per binding
    ///
    /// # Errors
    /// `AlreadyRunning` if workers were started and not yet joined.
    #[instrument(name = "dispatcher_run", skip(self), fields(channels = self.bindings.len()))]
    pub fn run(&mut self) -> Result<(), DispatcherError> {
        if self.is_running() || !self.handles.is_empty() {
            return Err(DispatcherError::AlreadyRunning);
        }
        self.running.store(true, Ordering::Release);

        for (index, sink) in &self.bindings {
            self.handles.push(ChannelHandle::spawn(
                *index,
                Arc::clone(sink),
                self.vector.clone(),
                self.period,
                Arc::clone(&self.running),
            ));
        }

        info!(
            channels = self.handles.len(),
            period_ms = self.period.as_millis() as u64,
            "Dispatcher started"
        );
        Ok(())
    }

    /// Signal every worker to exit; does not wait
    pub fn stop(&self) {
        self.running.store(false, Ordering::Release);
    }

    /// Wait for every worker to exit
    #[instrument(name = "dispatcher_join", skip(self))]
    pub async fn join(&mut self) {
        for handle in self.handles.drain(..) {
            handle.join().await;
        }
        info!("Dispatcher workers joined");
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn vector(&self) -> &OutputVector {
        &self.vector
    }

    /// Number of bound channels
    pub fn channel_count(&self) -> usize {
        self.bindings.len()
    }

    /// Get metrics for all running channels
    pub fn metrics(&self) -> Vec<(String, ChannelMetricsSnapshot)> {
        self.handles
            .iter()
            .map(|h| (h.name().to_string(), h.metrics().snapshot()))
            .collect()
    }
}

impl Drop for OutputDispatcher {
    fn drop(&mut self) {
        self.stop();
    }
}
