//! # Integration Tests
//!
//! Cross-crate and end-to-end tests.
//!
//! Covers:
//! - Configuration text to running supervisor
//! - Vision peer over loopback TCP -> link -> supervisor -> sinks
//! - Link failure handling

#[cfg(test)]
mod contract_tests {
    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{ConfigVersion, TrackerBlueprint};

    #[test]
    fn test_empty_config_matches_defaults() {
        let loaded = ConfigLoader::load_from_str("", ConfigFormat::Toml).unwrap();
        let defaults = TrackerBlueprint::default();
        assert_eq!(loaded.version, ConfigVersion::V1);
        assert_eq!(loaded.firing.max_shots, defaults.firing.max_shots);
        assert_eq!(loaded.link.zero_threshold, 10);
        assert_eq!(loaded.pursuit.stale_timeout_ms, 5000);
        assert_eq!(loaded.dispatcher.channels, defaults.dispatcher.channels);
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{
        ActuatorSink, ConnectionState, ContractError, DriveCommand, DriveSink, ReportSink,
        TrackerBlueprint,
    };
    use dispatcher::{LogActuator, LogDrive};
    use supervisor::{
        Collaborators, FeedArmDispenser, FiringSupervisor, FrameOutcome, SupervisorError,
    };
    use telemetry_link::{parse_frame, LinkEvent, LinkListener, TelemetryLink};
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpListener;

    const DELIMITER: [u8; 10] = [0; 10];

    /// Fast firing configuration so the scenarios finish in well under a second
    const FAST_CONFIG: &str = r#"
[link]
host = "127.0.0.1"

[pursuit]
period_ms = 20

[dispatcher]
period_ms = 20

[firing]
max_shots = 4
min_interval_ms = 100

[dispense]
park_ms = 10
settle_ms = 10
release_ms = 10
"#;

    #[derive(Default)]
    struct CountingReport {
        reports: Mutex<Vec<u32>>,
    }

    impl ReportSink for CountingReport {
        fn report_fired(&self, count: u32) {
            self.reports.lock().unwrap().push(count);
        }
    }

    #[derive(Default)]
    struct RecordingDrive {
        commands: Mutex<Vec<DriveCommand>>,
    }

    impl DriveSink for RecordingDrive {
        fn name(&self) -> &str {
            "tank"
        }

        fn apply(&self, command: DriveCommand) -> Result<(), ContractError> {
            self.commands.lock().unwrap().push(command);
            Ok(())
        }
    }

    /// Feed arm that counts release strokes
    struct FeedArm {
        releases: AtomicU32,
    }

    impl ActuatorSink for FeedArm {
        fn name(&self) -> &str {
            "feed_arm"
        }

        fn apply(&self, value: f64) -> Result<(), ContractError> {
            if value < 0.0 {
                self.releases.fetch_add(1, Ordering::Relaxed);
            }
            Ok(())
        }
    }

    /// Vision peer: accepts one client and writes each frame followed by a
    /// zero run, `gap` apart
    async fn spawn_peer(frames: Vec<Vec<u8>>, gap: Duration) -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            for frame in frames {
                if socket.write_all(&frame).await.is_err() {
                    return;
                }
                if socket.write_all(&DELIMITER).await.is_err() {
                    return;
                }
                tokio::time::sleep(gap).await;
            }
        });
        port
    }

    fn fast_blueprint(port: u16) -> TrackerBlueprint {
        let mut blueprint = ConfigLoader::load_from_str(FAST_CONFIG, ConfigFormat::Toml).unwrap();
        blueprint.link.port = port;
        blueprint
    }

    /// Drain link events into the supervisor until a session completes or
    /// the link goes away
    async fn pump<D: contracts::DispenseAction>(
        supervisor: &mut FiringSupervisor<D>,
        events: &mut LinkListener,
    ) -> Vec<FrameOutcome> {
        let mut outcomes = Vec::new();
        while let Some(event) = events.recv().await {
            let LinkEvent::Frame(text) = event else {
                break;
            };
            let Ok(frame) = parse_frame(&text) else {
                continue;
            };
            let outcome = supervisor.on_frame(&frame).await;
            outcomes.push(outcome);
            if matches!(outcome, FrameOutcome::Completed(_)) {
                break;
            }
        }
        outcomes
    }

    /// End-to-end: vision peer -> TelemetryLink -> FiringSupervisor
    ///
    /// An on-target stream fires the whole budget, then the session closes
    /// with exactly one report.
    #[tokio::test]
    async fn test_e2e_on_target_stream_fires_budget() {
        let frames = vec![b"100,0,40".to_vec(); 120];
        let port = spawn_peer(frames, Duration::from_millis(10)).await;
        let blueprint = fast_blueprint(port);

        let drive = Arc::new(RecordingDrive::default());
        let traam = Arc::new(LogActuator::new("traam"));
        let wheel = Arc::new(LogActuator::new("shooter_wheel"));
        let report = Arc::new(CountingReport::default());
        let arm = Arc::new(FeedArm {
            releases: AtomicU32::new(0),
        });

        let dispenser = FeedArmDispenser::new(arm.clone(), blueprint.dispense.clone());
        let collaborators = Collaborators {
            drive: drive.clone(),
            actuators: vec![traam.clone(), wheel.clone()],
            report: report.clone(),
        };
        let mut supervisor = FiringSupervisor::new(&blueprint, collaborators, dispenser);

        let mut link = TelemetryLink::new(blueprint.link.clone());
        let mut events = link.attach_listener();
        link.connect().await.unwrap();
        supervisor.start_tracking().unwrap();

        let outcomes = tokio::time::timeout(
            Duration::from_secs(10),
            pump(&mut supervisor, &mut events),
        )
        .await
        .expect("session did not complete");

        let fired: Vec<u32> = outcomes
            .iter()
            .filter_map(|o| match o {
                FrameOutcome::Fired(n) => Some(*n),
                _ => None,
            })
            .collect();
        assert_eq!(fired, vec![1, 2, 3, 4]);
        assert_eq!(outcomes.last(), Some(&FrameOutcome::Completed(4)));
        assert_eq!(*report.reports.lock().unwrap(), vec![4]);
        assert_eq!(arm.releases.load(Ordering::Relaxed), 4);

        assert!(!supervisor.is_firing());
        assert!(traam.applied() > 0);
        assert_eq!(
            drive.commands.lock().unwrap().last().copied(),
            Some(DriveCommand::STOP)
        );

        link.disconnect().await;
        let metrics = link.metrics();
        assert!(metrics.frames_delivered >= 5);
        assert_eq!(link.state(), ConnectionState::Disconnected);
    }

    /// Height from the stream reaches the bound actuators through the
    /// output dispatcher while the target is still out of range
    #[tokio::test]
    async fn test_e2e_height_reaches_actuators() {
        let frames = vec![b"150 -12 42".to_vec(); 20];
        let port = spawn_peer(frames, Duration::from_millis(10)).await;
        let blueprint = fast_blueprint(port);

        let drive = Arc::new(LogDrive::new("tank"));
        let traam = Arc::new(LogActuator::new("traam"));
        let wheel = Arc::new(LogActuator::new("shooter_wheel"));
        let arm = Arc::new(LogActuator::new("feed_arm"));
        let dispenser = FeedArmDispenser::new(arm.clone(), blueprint.dispense.clone());
        let collaborators = Collaborators {
            drive: drive.clone(),
            actuators: vec![traam.clone(), wheel.clone()],
            report: Arc::new(CountingReport::default()),
        };
        let mut supervisor = FiringSupervisor::new(&blueprint, collaborators, dispenser);

        let mut link = TelemetryLink::new(blueprint.link.clone());
        let mut events = link.attach_listener();
        link.connect().await.unwrap();
        supervisor.start_tracking().unwrap();

        let outcomes = tokio::time::timeout(
            Duration::from_secs(5),
            pump(&mut supervisor, &mut events),
        )
        .await
        .expect("peer did not close");
        assert!(!outcomes.is_empty());
        assert!(outcomes.iter().all(|o| *o == FrameOutcome::Tracking));

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(traam.last_value(), Some(42.0));
        assert_eq!(wheel.last_value(), Some(42.0));
        assert_eq!(arm.applied(), 0);

        // Far and to the left: drive backward with a turn
        let command = drive.last_command().unwrap();
        assert!(command.left != command.right);

        supervisor.stop_tracking().await;
        assert_eq!(drive.last_command(), Some(DriveCommand::STOP));
        link.disconnect().await;
    }

    /// Junk between frames and malformed payloads never reach the supervisor
    #[tokio::test]
    async fn test_e2e_noisy_stream() {
        let frames = vec![
            b"\0\0\0  100,0  \0".to_vec(),
            b"not a frame".to_vec(),
            b"   \n".to_vec(),
            b"120;4".to_vec(),
            b"1,2,3,4".to_vec(),
        ];
        let port = spawn_peer(frames, Duration::from_millis(20)).await;
        let mut link = TelemetryLink::new(fast_blueprint(port).link);
        let mut events = link.attach_listener();
        link.connect().await.unwrap();

        let mut parsed = Vec::new();
        let mut rejected = 0;
        let collect = async {
            while let Some(LinkEvent::Frame(text)) = events.recv().await {
                match parse_frame(&text) {
                    Ok(frame) => parsed.push(frame),
                    Err(_) => rejected += 1,
                }
            }
        };
        tokio::time::timeout(Duration::from_secs(5), collect)
            .await
            .expect("peer did not close");

        assert_eq!(parsed.len(), 2);
        assert_eq!((parsed[0].width, parsed[0].angle), (100.0, 0.0));
        assert_eq!((parsed[1].width, parsed[1].angle), (120.0, 4.0));
        assert_eq!(rejected, 2);
        assert_eq!(link.metrics().malformed_frames, 1);
        link.disconnect().await;
    }

    /// Peer EOF surfaces as a Disconnected event and a state change
    #[tokio::test]
    async fn test_e2e_peer_close_disconnects() {
        let port = spawn_peer(vec![b"100,0".to_vec()], Duration::ZERO).await;
        let mut link = TelemetryLink::new(fast_blueprint(port).link);
        let mut events = link.attach_listener();
        let mut state = link.subscribe_state();
        link.connect().await.unwrap();

        let first = events.recv().await;
        assert_eq!(first, Some(LinkEvent::Frame("100,0".to_string())));
        let second = tokio::time::timeout(Duration::from_secs(5), events.recv())
            .await
            .unwrap();
        assert!(matches!(second, Some(LinkEvent::Disconnected { .. })));

        state
            .wait_for(|s| *s == ConnectionState::Disconnected)
            .await
            .unwrap();
        assert!(!link.is_connected());

        // Writing after the peer left is a quiet no-op
        link.write("ping").await.unwrap();
        link.disconnect().await;
    }

    /// A binding to an actuator nobody supplied keeps the supervisor idle
    #[tokio::test]
    async fn test_config_binding_without_actuator() {
        let config = r#"
[dispatcher]
channels = [{ index = 2, actuator = "elevator" }]
"#;
        let blueprint = ConfigLoader::load_from_str(config, ConfigFormat::Toml).unwrap();
        let arm = Arc::new(LogActuator::new("feed_arm"));
        let collaborators = Collaborators {
            drive: Arc::new(LogDrive::new("tank")),
            actuators: vec![Arc::new(LogActuator::new("traam"))],
            report: Arc::new(CountingReport::default()),
        };
        let mut supervisor = FiringSupervisor::new(
            &blueprint,
            collaborators,
            FeedArmDispenser::new(arm, blueprint.dispense.clone()),
        );

        let err = supervisor.start_tracking().unwrap_err();
        assert!(matches!(
            err,
            SupervisorError::UnknownActuator { ref name, index: 2 } if name == "elevator"
        ));
        assert!(!supervisor.is_firing());
    }
}
