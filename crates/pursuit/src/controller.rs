//! PursuitController - runs the pursuit core on a fixed period

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use contracts::{DriveCommand, DriveSink, PursuitConfig};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, instrument, warn};

use crate::tick::{PursuitCore, TickOutcome};

/// Pursuit loop counters
#[derive(Debug, Default)]
pub struct PursuitMetrics {
    ticks: AtomicU64,
    stale_ticks: AtomicU64,
    drive_failures: AtomicU64,
}

impl PursuitMetrics {
    pub fn snapshot(&self) -> PursuitMetricsSnapshot {
        PursuitMetricsSnapshot {
            ticks: self.ticks.load(Ordering::Relaxed),
            stale_ticks: self.stale_ticks.load(Ordering::Relaxed),
            drive_failures: self.drive_failures.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of pursuit counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PursuitMetricsSnapshot {
    pub ticks: u64,
    pub stale_ticks: u64,
    pub drive_failures: u64,
}

/// State shared between the handle and the control task
struct Shared {
    core: Mutex<PursuitCore>,
    running: AtomicBool,
    last_command: Mutex<DriveCommand>,
    metrics: PursuitMetrics,
}

impl Shared {
    fn core(&self) -> MutexGuard<'_, PursuitCore> {
        self.core.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Handle to the pursuit control loop
///
/// `update` and `can_shoot` may be called from any task while the loop runs.
pub struct PursuitController {
    shared: Arc<Shared>,
    period: Duration,
    worker: Option<JoinHandle<()>>,
}

impl PursuitController {
    /// Create a stopped controller; measurements start at zero
    pub fn new(config: PursuitConfig) -> Self {
        let period = config.period();
        Self {
            shared: Arc::new(Shared {
                core: Mutex::new(PursuitCore::new(config, Instant::now())),
                running: AtomicBool::new(false),
                last_command: Mutex::new(DriveCommand::STOP),
                metrics: PursuitMetrics::default(),
            }),
            period,
            worker: None,
        }
    }

    /// Record a fresh measurement
    pub fn update(&self, angle: f64, width: f64) {
        self.shared.core().update(angle, width, Instant::now());
    }

    /// Alignment flag from the last computed tick
    pub fn can_shoot(&self) -> bool {
        self.shared.core().can_shoot()
    }

    /// Last command issued to the drivetrain
    pub fn last_command(&self) -> DriveCommand {
        *self
            .shared
            .last_command
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }

    pub fn metrics(&self) -> PursuitMetricsSnapshot {
        self.shared.metrics.snapshot()
    }

    /// Spawn the control loop driving `drive`
    ///
    /// A no-op if the loop was already started.
    #[instrument(name = "pursuit_start", skip(self, drive), fields(drive = %drive.name()))]
    pub fn start(&mut self, drive: Arc<dyn DriveSink>) {
        if self.worker.is_some() {
            warn!("Pursuit controller already started");
            return;
        }
        self.shared.running.store(true, Ordering::Release);

        let shared = Arc::clone(&self.shared);
        let period = self.period;
        self.worker = Some(tokio::spawn(async move {
            control_loop(shared, drive, period).await;
        }));
    }

    /// Ask the loop to exit; it finishes within one period
    pub fn stop(&self) {
        self.shared.running.store(false, Ordering::Release);
    }

    /// Wait for the loop to exit
    pub async fn join(&mut self) {
        if let Some(worker) = self.worker.take() {
            if let Err(e) = worker.await {
                error!(error = ?e, "Pursuit task panicked");
            }
        }
    }
}

impl Drop for PursuitController {
    fn drop(&mut self) {
        self.stop();
    }
}

#[instrument(name = "pursuit_loop", skip_all, fields(drive = %drive.name()))]
async fn control_loop(shared: Arc<Shared>, drive: Arc<dyn DriveSink>, period: Duration) {
    info!(period_ms = period.as_millis() as u64, "Pursuit controller started");
    let mut stale = false;

    while shared.running.load(Ordering::Acquire) {
        let outcome = shared.core().tick(Instant::now());
        shared.metrics.ticks.fetch_add(1, Ordering::Relaxed);

        match outcome {
            TickOutcome::Stale { since } => {
                shared.metrics.stale_ticks.fetch_add(1, Ordering::Relaxed);
                observability::record_stale_tick();
                if !stale {
                    warn!(
                        since_ms = since.as_millis() as u64,
                        "No telemetry updates, holding drive at zero"
                    );
                }
                stale = true;
            }
            TickOutcome::Drive { command, can_shoot } => {
                if stale {
                    info!("Telemetry resumed");
                }
                stale = false;
                observability::record_drive_command(command);
                debug!(
                    left = command.left,
                    right = command.right,
                    can_shoot,
                    "Pursuit tick"
                );
            }
        }

        let command = outcome.command().clamped();
        *shared
            .last_command
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = command;

        match drive.apply(command) {
            Ok(()) => observability::record_actuator_write(drive.name(), true),
            Err(e) => {
                shared.metrics.drive_failures.fetch_add(1, Ordering::Relaxed);
                observability::record_actuator_write(drive.name(), false);
                warn!(error = %e, "Drive write failed");
            }
        }

        tokio::time::sleep(period).await;
    }

    info!("Pursuit controller stopped");
}
