//! FiringSupervisor - tracking session lifecycle and shot sequencing
//!
//! ```text
//! Idle --start_tracking--> Tracking --aligned, interval ok--> Firing
//!   ^                        |  ^                               |
//!   |                        |  +-------- dispense done --------+
//!   +-- budget spent / stop -+
//! ```

use std::sync::Arc;

use contracts::{
    ActuatorSink, DispatcherConfig, DispenseAction, DriveCommand, DriveSink, FiringConfig,
    PursuitConfig, ReportSink, TelemetryFrame, TrackerBlueprint, FRAME_VECTOR_WIDTH,
};
use dispatcher::{OutputDispatcher, OutputVector};
use pursuit::PursuitController;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use crate::error::SupervisorError;
use crate::session::ShotSession;

/// Supervisor state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SupervisorState {
    #[default]
    Idle,
    Tracking,
    Firing,
}

/// What a frame caused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// No session is active
    Ignored,
    /// Frame applied, no shot this time
    Tracking,
    /// A payload was dispensed; total shots so far
    Fired(u32),
    /// Budget spent, session closed and reported
    Completed(u32),
}

/// Everything the supervisor drives
#[derive(Clone)]
pub struct Collaborators {
    pub drive: Arc<dyn DriveSink>,
    /// Looked up by name from the dispatcher channel bindings
    pub actuators: Vec<Arc<dyn ActuatorSink>>,
    pub report: Arc<dyn ReportSink>,
}

impl Collaborators {
    fn actuator(&self, name: &str) -> Option<Arc<dyn ActuatorSink>> {
        self.actuators.iter().find(|a| a.name() == name).cloned()
    }
}

/// Live session: bookkeeping plus the two periodic workers
struct ActiveSession {
    shots: ShotSession,
    controller: PursuitController,
    dispatcher: OutputDispatcher,
}

/// Firing supervisor
pub struct FiringSupervisor<D: DispenseAction> {
    pursuit: PursuitConfig,
    dispatch: DispatcherConfig,
    firing: FiringConfig,
    collaborators: Collaborators,
    dispenser: D,
    vector: OutputVector,
    state: SupervisorState,
    active: Option<ActiveSession>,
    /// Stale ticks of sessions already torn down
    stale_ticks: u64,
}

impl<D: DispenseAction> FiringSupervisor<D> {
    pub fn new(blueprint: &TrackerBlueprint, collaborators: Collaborators, dispenser: D) -> Self {
        Self {
            pursuit: blueprint.pursuit.clone(),
            dispatch: blueprint.dispatcher.clone(),
            firing: blueprint.firing.clone(),
            collaborators,
            dispenser,
            vector: OutputVector::new(FRAME_VECTOR_WIDTH),
            state: SupervisorState::Idle,
            active: None,
            stale_ticks: 0,
        }
    }

    /// Begin a tracking session
    ///
    /// Starts the pursuit controller and the output dispatcher. A no-op while
    /// a session is already active.
    ///
    /// # Errors
    /// `UnknownActuator` or `Dispatcher` when a channel binding cannot be
    /// attached; the supervisor stays idle.
    #[instrument(name = "supervisor_start_tracking", skip(self))]
    pub fn start_tracking(&mut self) -> Result<(), SupervisorError> {
        if self.active.is_some() {
            debug!("Tracking already active");
            return Ok(());
        }

        self.vector.zero();
        let mut dispatcher =
            OutputDispatcher::new(self.vector.clone(), self.dispatch.channels.len())
                .with_period(self.dispatch.period());
        for binding in &self.dispatch.channels {
            let sink = self.collaborators.actuator(&binding.actuator).ok_or_else(|| {
                SupervisorError::UnknownActuator {
                    name: binding.actuator.clone(),
                    index: binding.index,
                }
            })?;
            dispatcher.attach(binding.index, sink)?;
        }

        let mut controller = PursuitController::new(self.pursuit.clone());
        controller.start(Arc::clone(&self.collaborators.drive));
        dispatcher.run()?;

        self.active = Some(ActiveSession {
            shots: ShotSession::new(&self.firing),
            controller,
            dispatcher,
        });
        self.state = SupervisorState::Tracking;
        info!(
            max_shots = self.firing.max_shots,
            channels = self.dispatch.channels.len(),
            "Tracking started"
        );
        Ok(())
    }

    /// End the session from any state
    ///
    /// Zero drive is commanded before the workers are stopped.
    #[instrument(name = "supervisor_stop_tracking", skip(self))]
    pub async fn stop_tracking(&mut self) {
        if self.active.is_none() {
            return;
        }
        let shots = self.teardown().await;
        info!(shots, "Tracking stopped");
    }

    /// Apply one measurement
    ///
    /// Ignored while idle. Otherwise the controller and output vector are
    /// updated, then a shot is fired when aligned and allowed, or the session
    /// is closed once the budget is spent.
    pub async fn on_frame(&mut self, frame: &TelemetryFrame) -> FrameOutcome {
        let Some(active) = self.active.as_mut() else {
            return FrameOutcome::Ignored;
        };

        active.controller.update(frame.angle, frame.width);
        self.vector.write_all(&frame.to_output_vector());

        let now = Instant::now();
        if active.controller.can_shoot() && active.shots.can_fire(now) {
            self.state = SupervisorState::Firing;
            active.shots.begin_dispense(now);
            let result = self.dispenser.dispense().await;
            let shots = active.shots.end_dispense(result.is_ok());
            self.state = SupervisorState::Tracking;

            return match result {
                Ok(()) => {
                    observability::record_shot_fired();
                    info!(shot = shots, max_shots = active.shots.max_shots(), "Payload dispensed");
                    FrameOutcome::Fired(shots)
                }
                Err(e) => {
                    warn!(error = %e, shots, "Dispense failed");
                    FrameOutcome::Tracking
                }
            };
        }

        if active.shots.is_exhausted() {
            let shots = self.teardown().await;
            self.collaborators.report.report_fired(shots);
            observability::record_session_completed(shots);
            info!(shots, "Firing complete");
            return FrameOutcome::Completed(shots);
        }

        FrameOutcome::Tracking
    }

    /// True while a session is active (tracking or firing)
    pub fn is_firing(&self) -> bool {
        self.active.is_some()
    }

    /// Current lifecycle state
    ///
    /// `on_frame` holds `&mut self` across the dispense, so a caller never
    /// observes `Firing` through this handle. Only the dispense logs show it.
    pub fn state(&self) -> SupervisorState {
        self.state
    }

    /// Shots fired in the active session
    pub fn shots_fired(&self) -> Option<u32> {
        self.active.as_ref().map(|a| a.shots.shots_fired())
    }

    /// Alignment flag of the active controller
    pub fn can_shoot(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|a| a.controller.can_shoot())
    }

    /// Last command issued by the active controller
    pub fn last_command(&self) -> Option<DriveCommand> {
        self.active.as_ref().map(|a| a.controller.last_command())
    }

    pub fn vector(&self) -> &OutputVector {
        &self.vector
    }

    /// Stale control ticks across every session so far
    pub fn stale_ticks(&self) -> u64 {
        let live = self
            .active
            .as_ref()
            .map_or(0, |a| a.controller.metrics().stale_ticks);
        self.stale_ticks + live
    }

    /// Zero outputs, stop and join workers, drop the session
    async fn teardown(&mut self) -> u32 {
        let Some(mut active) = self.active.take() else {
            return 0;
        };

        active.controller.stop();
        active.dispatcher.stop();
        if let Err(e) = self.collaborators.drive.apply(DriveCommand::STOP) {
            warn!(error = %e, "Failed to zero drive on teardown");
        }
        self.vector.zero();

        active.controller.join().await;
        active.dispatcher.join().await;
        self.stale_ticks += active.controller.metrics().stale_ticks;
        // The loop may have issued one last tick before seeing the flag
        if let Err(e) = self.collaborators.drive.apply(DriveCommand::STOP) {
            warn!(error = %e, "Failed to zero drive on teardown");
        }

        self.state = SupervisorState::Idle;
        active.shots.shots_fired()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{ChannelBinding, ContractError};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingDrive {
        commands: Mutex<Vec<(Instant, DriveCommand)>>,
    }

    impl DriveSink for RecordingDrive {
        fn name(&self) -> &str {
            "drive"
        }

        fn apply(&self, command: DriveCommand) -> Result<(), ContractError> {
            self.commands.lock().unwrap().push((Instant::now(), command));
            Ok(())
        }
    }

    struct RecordingActuator {
        name: &'static str,
        values: Mutex<Vec<(Instant, f64)>>,
    }

    impl RecordingActuator {
        fn new(name: &'static str) -> Arc<Self> {
            Arc::new(Self {
                name,
                values: Mutex::new(Vec::new()),
            })
        }
    }

    impl ActuatorSink for RecordingActuator {
        fn name(&self) -> &str {
            self.name
        }

        fn apply(&self, value: f64) -> Result<(), ContractError> {
            self.values.lock().unwrap().push((Instant::now(), value));
            Ok(())
        }
    }

    #[derive(Default)]
    struct CountingReport {
        reports: Mutex<Vec<u32>>,
    }

    impl ReportSink for CountingReport {
        fn report_fired(&self, count: u32) {
            self.reports.lock().unwrap().push(count);
        }
    }

    /// Takes `duration` per dispense; fails when `fail` is set
    #[derive(Default)]
    struct MockDispenser {
        calls: AtomicU32,
        duration: Duration,
        fail: bool,
    }

    impl DispenseAction for MockDispenser {
        async fn dispense(&self) -> Result<(), ContractError> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            tokio::time::sleep(self.duration).await;
            if self.fail {
                return Err(ContractError::dispense("jammed"));
            }
            Ok(())
        }
    }

    struct Rig {
        drive: Arc<RecordingDrive>,
        traam: Arc<RecordingActuator>,
        wheel: Arc<RecordingActuator>,
        report: Arc<CountingReport>,
    }

    fn rig(dispenser: MockDispenser) -> (FiringSupervisor<MockDispenser>, Rig) {
        let rig = Rig {
            drive: Arc::new(RecordingDrive::default()),
            traam: RecordingActuator::new("traam"),
            wheel: RecordingActuator::new("shooter_wheel"),
            report: Arc::new(CountingReport::default()),
        };
        let collaborators = Collaborators {
            drive: rig.drive.clone(),
            actuators: vec![rig.traam.clone(), rig.wheel.clone()],
            report: rig.report.clone(),
        };
        let supervisor =
            FiringSupervisor::new(&TrackerBlueprint::default(), collaborators, dispenser);
        (supervisor, rig)
    }

    fn on_target() -> TelemetryFrame {
        TelemetryFrame::with_height(100.0, 0.0, 40.0)
    }

    /// Feed two on-target frames and let the controller tick
    async fn align(supervisor: &mut FiringSupervisor<MockDispenser>) {
        supervisor.start_tracking().unwrap();
        // Alignment is only known after the controller ticks
        assert_eq!(supervisor.on_frame(&on_target()).await, FrameOutcome::Tracking);
        assert_eq!(supervisor.on_frame(&on_target()).await, FrameOutcome::Tracking);
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(supervisor.can_shoot());
    }

    #[tokio::test(start_paused = true)]
    async fn test_frames_ignored_when_idle() {
        let (mut supervisor, rig) = rig(MockDispenser::default());
        assert_eq!(supervisor.on_frame(&on_target()).await, FrameOutcome::Ignored);
        assert!(!supervisor.is_firing());
        assert_eq!(supervisor.state(), SupervisorState::Idle);
        assert!(rig.drive.commands.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_tracking_is_single_session() {
        let (mut supervisor, _rig) = rig(MockDispenser::default());
        supervisor.start_tracking().unwrap();
        supervisor.start_tracking().unwrap();
        assert!(supervisor.is_firing());
        assert_eq!(supervisor.state(), SupervisorState::Tracking);
        assert_eq!(supervisor.shots_fired(), Some(0));
        supervisor.stop_tracking().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_four_shots_then_report_once() {
        let (mut supervisor, rig) = rig(MockDispenser::default());
        align(&mut supervisor).await;

        for shot in 1..=4 {
            assert_eq!(
                supervisor.on_frame(&on_target()).await,
                FrameOutcome::Fired(shot)
            );
            tokio::time::sleep(Duration::from_millis(1500)).await;
        }

        assert_eq!(
            supervisor.on_frame(&on_target()).await,
            FrameOutcome::Completed(4)
        );
        assert_eq!(supervisor.state(), SupervisorState::Idle);
        assert!(!supervisor.is_firing());

        assert_eq!(supervisor.on_frame(&on_target()).await, FrameOutcome::Ignored);
        assert_eq!(*rig.report.reports.lock().unwrap(), vec![4]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_min_interval_limits_shots() {
        let (mut supervisor, _rig) = rig(MockDispenser::default());
        align(&mut supervisor).await;

        assert_eq!(supervisor.on_frame(&on_target()).await, FrameOutcome::Fired(1));
        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(supervisor.on_frame(&on_target()).await, FrameOutcome::Tracking);
        assert_eq!(supervisor.shots_fired(), Some(1));

        supervisor.stop_tracking().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_measured_from_issue() {
        let (mut supervisor, _rig) = rig(MockDispenser {
            duration: Duration::from_millis(400),
            ..Default::default()
        });
        align(&mut supervisor).await;

        assert_eq!(supervisor.on_frame(&on_target()).await, FrameOutcome::Fired(1));
        // 400 ms spent dispensing + 1100 ms = 1500 ms since the shot was issued
        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert_eq!(supervisor.on_frame(&on_target()).await, FrameOutcome::Fired(2));

        supervisor.stop_tracking().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_dispense_is_rate_limited() {
        let (mut supervisor, _rig) = rig(MockDispenser {
            fail: true,
            ..Default::default()
        });
        align(&mut supervisor).await;

        assert_eq!(supervisor.on_frame(&on_target()).await, FrameOutcome::Tracking);
        assert_eq!(supervisor.dispenser.calls.load(Ordering::Relaxed), 1);

        tokio::time::sleep(Duration::from_millis(100)).await;
        supervisor.on_frame(&on_target()).await;
        assert_eq!(supervisor.dispenser.calls.load(Ordering::Relaxed), 1);

        tokio::time::sleep(Duration::from_millis(1500)).await;
        supervisor.on_frame(&on_target()).await;
        assert_eq!(supervisor.dispenser.calls.load(Ordering::Relaxed), 2);
        assert_eq!(supervisor.shots_fired(), Some(0));

        supervisor.stop_tracking().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_telemetry_blocks_firing() {
        let (mut supervisor, _rig) = rig(MockDispenser::default());
        align(&mut supervisor).await;
        assert_eq!(supervisor.on_frame(&on_target()).await, FrameOutcome::Fired(1));

        // Silence past the stale timeout
        tokio::time::sleep(Duration::from_secs(6)).await;
        assert!(!supervisor.can_shoot());

        let off_target = TelemetryFrame::new(300.0, 20.0);
        assert_eq!(supervisor.on_frame(&off_target).await, FrameOutcome::Tracking);
        assert_eq!(supervisor.shots_fired(), Some(1));

        supervisor.stop_tracking().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_misaligned_never_fires() {
        let (mut supervisor, _rig) = rig(MockDispenser::default());
        supervisor.start_tracking().unwrap();
        let far_left = TelemetryFrame::new(150.0, -12.0);

        for _ in 0..10 {
            assert_eq!(supervisor.on_frame(&far_left).await, FrameOutcome::Tracking);
            tokio::time::sleep(Duration::from_millis(200)).await;
        }
        assert_eq!(supervisor.dispenser.calls.load(Ordering::Relaxed), 0);
        supervisor.stop_tracking().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_height_reaches_bound_actuators() {
        let (mut supervisor, rig) = rig(MockDispenser::default());
        supervisor.start_tracking().unwrap();
        supervisor.on_frame(&TelemetryFrame::new(150.0, -12.0)).await;
        supervisor
            .on_frame(&TelemetryFrame::with_height(150.0, -12.0, 42.0))
            .await;
        assert_eq!(supervisor.vector().snapshot(), vec![150.0, -12.0, 42.0]);

        tokio::time::sleep(Duration::from_millis(150)).await;
        let traam = rig.traam.values.lock().unwrap().clone();
        let wheel = rig.wheel.values.lock().unwrap().clone();
        assert_eq!(traam.last().map(|(_, v)| *v), Some(42.0));
        assert_eq!(wheel.last().map(|(_, v)| *v), Some(42.0));

        supervisor.stop_tracking().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_tracking_zeroes_and_quiesces() {
        let (mut supervisor, rig) = rig(MockDispenser::default());
        supervisor.start_tracking().unwrap();
        supervisor.on_frame(&TelemetryFrame::new(150.0, 0.0)).await;
        tokio::time::sleep(Duration::from_millis(120)).await;

        supervisor.stop_tracking().await;
        let stopped_at = Instant::now();
        assert_eq!(supervisor.state(), SupervisorState::Idle);
        assert!(!supervisor.is_firing());
        assert_eq!(supervisor.vector().snapshot(), vec![0.0; 3]);

        let last = rig.drive.commands.lock().unwrap().last().map(|(_, c)| *c);
        assert_eq!(last, Some(DriveCommand::STOP));

        tokio::time::sleep(Duration::from_millis(500)).await;
        let late_drive = rig
            .drive
            .commands
            .lock()
            .unwrap()
            .iter()
            .filter(|(at, _)| *at > stopped_at)
            .count();
        let late_traam = rig
            .traam
            .values
            .lock()
            .unwrap()
            .iter()
            .filter(|(at, _)| *at > stopped_at)
            .count();
        assert_eq!(late_drive, 0);
        assert_eq!(late_traam, 0);

        // Stopping twice is harmless
        supervisor.stop_tracking().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_ticks_survive_teardown() {
        let (mut supervisor, rig) = rig(MockDispenser::default());
        supervisor.start_tracking().unwrap();
        supervisor.on_frame(&TelemetryFrame::new(150.0, 0.0)).await;

        tokio::time::sleep(Duration::from_millis(5300)).await;
        let live = supervisor.stale_ticks();
        assert!(live > 0);
        let last = rig.drive.commands.lock().unwrap().last().map(|(_, c)| *c);
        assert_eq!(last, Some(DriveCommand::STOP));

        supervisor.stop_tracking().await;
        assert!(supervisor.stale_ticks() >= live);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_actuator_keeps_idle() {
        let mut blueprint = TrackerBlueprint::default();
        blueprint.dispatcher.channels = vec![ChannelBinding::new(2, "missing")];
        let collaborators = Collaborators {
            drive: Arc::new(RecordingDrive::default()),
            actuators: Vec::new(),
            report: Arc::new(CountingReport::default()),
        };
        let mut supervisor =
            FiringSupervisor::new(&blueprint, collaborators, MockDispenser::default());

        let err = supervisor.start_tracking().unwrap_err();
        assert!(matches!(err, SupervisorError::UnknownActuator { .. }));
        assert!(!supervisor.is_firing());
        assert_eq!(supervisor.state(), SupervisorState::Idle);
    }
}
