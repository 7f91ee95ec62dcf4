//! Tracker orchestrator - wires the link to the firing supervisor.
//!
//! Hardware collaborators are log-backed: every drive command, actuator
//! output and completion report goes to the tracing subscriber.

use std::collections::BTreeSet;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use contracts::{ActuatorSink, TrackerBlueprint};
use dispatcher::{LogActuator, LogDrive, LogReport};
use supervisor::{Collaborators, FeedArmDispenser, FiringSupervisor, FrameOutcome};
use telemetry_link::{parse_frame, LinkEvent, LinkListener, TelemetryLink};
use tracing::{debug, info, warn};

use super::RunStats;
use crate::error::Result;

/// Drivetrain sink name
pub const DRIVE_NAME: &str = "tank";

/// Feed arm actuator used by the dispense sequence
pub const FEED_ARM_NAME: &str = "feed_arm";

/// Shooter wheel actuator, boosted after each release when configured
pub const SHOOTER_NAME: &str = "shooter_wheel";

/// Run configuration
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// The tracker blueprint
    pub blueprint: TrackerBlueprint,

    /// Sessions to complete before returning (None = until shutdown)
    pub sessions: Option<u32>,

    /// Run timeout (None = no timeout)
    pub timeout: Option<Duration>,
}

/// Why the event loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StopReason {
    SessionsDone,
    PeerClosed,
    Timeout,
    Shutdown,
}

/// Main tracker orchestrator
pub struct Tracker {
    config: TrackerConfig,
}

impl Tracker {
    pub fn new(config: TrackerConfig) -> Self {
        Self { config }
    }

    /// Connect, track and fire until the session budget, the timeout, a
    /// peer disconnect or `shutdown` ends the run
    pub async fn run(self, shutdown: impl Future<Output = ()>) -> Result<RunStats> {
        let start_time = Instant::now();
        let blueprint = &self.config.blueprint;

        let report = Arc::new(LogReport::new());
        let collaborators = build_collaborators(blueprint, report.clone());
        let dispenser = build_dispenser(blueprint, &collaborators);
        let mut supervisor = FiringSupervisor::new(blueprint, collaborators, dispenser);

        let mut link = TelemetryLink::new(blueprint.link.clone());
        let mut events = link.attach_listener();
        link.connect().await?;

        let mut stats = RunStats::default();
        let reason = match supervisor.start_tracking() {
            Ok(()) => {
                self.event_loop(&mut supervisor, &mut events, &mut stats, shutdown)
                    .await
            }
            Err(e) => {
                link.disconnect().await;
                return Err(e.into());
            }
        };

        info!(?reason, "Shutting down tracker...");
        supervisor.stop_tracking().await;
        link.disconnect().await;

        stats.tracking.add_stale_ticks(supervisor.stale_ticks());
        stats.link = link.metrics();
        stats.reports = report.reports();
        stats.duration = start_time.elapsed();
        Ok(stats)
    }

    async fn event_loop(
        &self,
        supervisor: &mut FiringSupervisor<FeedArmDispenser>,
        events: &mut LinkListener,
        stats: &mut RunStats,
        shutdown: impl Future<Output = ()>,
    ) -> StopReason {
        let deadline = async {
            match self.config.timeout {
                Some(limit) => tokio::time::sleep(limit).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::pin!(shutdown);
        tokio::pin!(deadline);

        loop {
            let event = tokio::select! {
                event = events.recv() => event,
                _ = &mut deadline => {
                    warn!(timeout = ?self.config.timeout, "Run timed out");
                    return StopReason::Timeout;
                }
                _ = &mut shutdown => return StopReason::Shutdown,
            };

            let text = match event {
                Some(LinkEvent::Frame(text)) => text,
                Some(LinkEvent::Disconnected { reason }) => {
                    warn!(reason = %reason, "Vision peer disconnected");
                    return StopReason::PeerClosed;
                }
                None => return StopReason::PeerClosed,
            };

            let frame = match parse_frame(&text) {
                Ok(frame) => frame,
                Err(e) => {
                    debug!(error = %e, "Discarding frame");
                    observability::record_malformed_frame("payload");
                    stats.tracking.record_malformed();
                    continue;
                }
            };
            observability::record_frame_received();
            stats.tracking.update_frame(&frame);

            match supervisor.on_frame(&frame).await {
                FrameOutcome::Fired(_) => stats.tracking.record_shot(),
                FrameOutcome::Completed(shots) => {
                    stats.tracking.record_session();
                    info!(shots, sessions = stats.tracking.sessions_completed, "Session complete");
                    if self
                        .config
                        .sessions
                        .is_some_and(|limit| stats.tracking.sessions_completed >= u64::from(limit))
                    {
                        return StopReason::SessionsDone;
                    }
                    if let Err(e) = supervisor.start_tracking() {
                        warn!(error = %e, "Failed to rearm tracking");
                        return StopReason::Shutdown;
                    }
                }
                FrameOutcome::Tracking | FrameOutcome::Ignored => {}
            }
        }
    }
}

/// Log-backed drive, one actuator per bound name, the feed arm and the report
fn build_collaborators(blueprint: &TrackerBlueprint, report: Arc<LogReport>) -> Collaborators {
    let names: BTreeSet<&str> = blueprint
        .dispatcher
        .channels
        .iter()
        .map(|c| c.actuator.as_str())
        .chain([FEED_ARM_NAME])
        .collect();

    let actuators: Vec<Arc<dyn ActuatorSink>> = names
        .into_iter()
        .map(|name| Arc::new(LogActuator::new(name)) as Arc<dyn ActuatorSink>)
        .collect();

    Collaborators {
        drive: Arc::new(LogDrive::new(DRIVE_NAME)),
        actuators,
        report,
    }
}

fn build_dispenser(blueprint: &TrackerBlueprint, collaborators: &Collaborators) -> FeedArmDispenser {
    let find = |name: &str| {
        collaborators
            .actuators
            .iter()
            .find(|a| a.name() == name)
            .cloned()
    };

    let feed_arm = find(FEED_ARM_NAME)
        .unwrap_or_else(|| Arc::new(LogActuator::new(FEED_ARM_NAME)) as Arc<dyn ActuatorSink>);
    let dispenser = FeedArmDispenser::new(feed_arm, blueprint.dispense.clone());

    match find(SHOOTER_NAME) {
        Some(shooter) => dispenser.with_shooter(shooter),
        None => dispenser,
    }
}
