//! ChannelHandle - one periodic worker per output channel

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use contracts::ActuatorSink;
use tokio::task::JoinHandle;
use tracing::{debug, error, instrument, warn};

use crate::metrics::ChannelMetrics;
use crate::output::OutputVector;

/// Handle to a running channel worker
pub struct ChannelHandle {
    /// Actuator name
    name: String,
    /// Output vector slot
    index: usize,
    /// Shared metrics
    metrics: Arc<ChannelMetrics>,
    /// Worker task handle
    worker_handle: JoinHandle<()>,
}

impl ChannelHandle {
    /// Spawn a worker re-applying `vector[index]` to `sink` every `period`
    ///
    /// The worker exits once `running` is cleared.
    pub fn spawn(
        index: usize,
        sink: Arc<dyn ActuatorSink>,
        vector: OutputVector,
        period: Duration,
        running: Arc<AtomicBool>,
    ) -> Self {
        let name = sink.name().to_string();
        let metrics = Arc::new(ChannelMetrics::new());

        let worker_metrics = Arc::clone(&metrics);
        let worker_handle = tokio::spawn(async move {
            channel_worker(index, sink, vector, period, running, worker_metrics).await;
        });

        Self {
            name,
            index,
            metrics,
            worker_handle,
        }
    }

    /// Get actuator name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get current metrics
    pub fn metrics(&self) -> &Arc<ChannelMetrics> {
        &self.metrics
    }

    /// Wait for the worker to exit
    #[instrument(
        name = "channel_handle_join",
        skip(self),
        fields(actuator = %self.name, index = self.index)
    )]
    pub async fn join(self) {
        if let Err(e) = self.worker_handle.await {
            error!(actuator = %self.name, error = ?e, "Worker task panicked");
        }
        debug!(actuator = %self.name, "Channel worker joined");
    }
}

/// Read, apply, sleep until stopped
#[instrument(
    name = "channel_worker_loop",
    skip(sink, vector, running, metrics),
    fields(actuator = %sink.name())
)]
async fn channel_worker(
    index: usize,
    sink: Arc<dyn ActuatorSink>,
    vector: OutputVector,
    period: Duration,
    running: Arc<AtomicBool>,
    metrics: Arc<ChannelMetrics>,
) {
    debug!(index, "Channel worker started");

    while running.load(Ordering::Acquire) {
        let value = vector.get(index).unwrap_or(0.0);

        match sink.apply(value) {
            Ok(()) => {
                metrics.inc_write_count();
                observability::record_actuator_write(sink.name(), true);
            }
            Err(e) => {
                metrics.inc_failure_count();
                observability::record_actuator_write(sink.name(), false);
                warn!(index, value, error = %e, "Actuator write failed");
                // Retried on the next cycle
            }
        }

        tokio::time::sleep(period).await;
    }

    debug!(index, "Channel worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::ContractError;
    use std::sync::Mutex;

    /// Mock actuator for testing
    #[derive(Default)]
    struct MockActuator {
        values: Mutex<Vec<f64>>,
        should_fail: bool,
    }

    impl ActuatorSink for MockActuator {
        fn name(&self) -> &str {
            "mock"
        }

        fn apply(&self, value: f64) -> Result<(), ContractError> {
            self.values.lock().unwrap().push(value);
            if self.should_fail {
                return Err(ContractError::actuator_write("mock", "mock failure"));
            }
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_worker_reapplies_current_value() {
        let sink = Arc::new(MockActuator::default());
        let vector = OutputVector::new(3);
        vector.set(2, 0.5);
        let running = Arc::new(AtomicBool::new(true));

        let handle = ChannelHandle::spawn(
            2,
            sink.clone(),
            vector.clone(),
            Duration::from_millis(100),
            Arc::clone(&running),
        );

        tokio::time::sleep(Duration::from_millis(150)).await;
        vector.set(2, -0.25);
        tokio::time::sleep(Duration::from_millis(100)).await;

        running.store(false, Ordering::Release);
        handle.join().await;

        assert_eq!(*sink.values.lock().unwrap(), vec![0.5, 0.5, -0.25]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_worker_failure_isolation() {
        let sink = Arc::new(MockActuator {
            should_fail: true,
            ..Default::default()
        });
        let running = Arc::new(AtomicBool::new(true));

        let handle = ChannelHandle::spawn(
            0,
            sink.clone(),
            OutputVector::new(1),
            Duration::from_millis(100),
            Arc::clone(&running),
        );

        tokio::time::sleep(Duration::from_millis(350)).await;
        assert_eq!(handle.metrics().failure_count(), 4);
        assert_eq!(handle.metrics().write_count(), 0);

        running.store(false, Ordering::Release);
        handle.join().await;
    }
}
