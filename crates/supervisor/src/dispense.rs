//! FeedArmDispenser - timed park / settle / release sequence

use std::sync::Arc;
use std::time::Duration;

use contracts::{ActuatorSink, ContractError, DispenseAction, DispenseConfig};
use tokio::time::sleep;
use tracing::{debug, instrument, warn};

/// Default dispense action
///
/// Drives the feed arm forward to park, pauses, then backward to release
/// one payload. An optional shooter boost follows the release.
pub struct FeedArmDispenser {
    feed_arm: Arc<dyn ActuatorSink>,
    shooter: Option<Arc<dyn ActuatorSink>>,
    config: DispenseConfig,
}

impl FeedArmDispenser {
    pub fn new(feed_arm: Arc<dyn ActuatorSink>, config: DispenseConfig) -> Self {
        Self {
            feed_arm,
            shooter: None,
            config,
        }
    }

    /// Shooter wheel used for the post-release boost
    pub fn with_shooter(mut self, shooter: Arc<dyn ActuatorSink>) -> Self {
        self.shooter = Some(shooter);
        self
    }

    async fn run_sequence(&self) -> Result<(), ContractError> {
        let cfg = &self.config;

        debug!(speed = cfg.park_speed, "Parking feed arm");
        self.feed_arm.apply(cfg.park_speed)?;
        sleep(Duration::from_millis(cfg.park_ms)).await;
        self.feed_arm.apply(0.0)?;

        sleep(Duration::from_millis(cfg.settle_ms)).await;

        debug!(speed = cfg.release_speed, "Releasing payload");
        self.feed_arm.apply(cfg.release_speed)?;
        sleep(Duration::from_millis(cfg.release_ms)).await;
        self.feed_arm.apply(0.0)?;

        if let (Some(boost), Some(shooter)) = (&cfg.boost, &self.shooter) {
            debug!(delta = boost.delta, "Boosting shooter wheel");
            shooter.apply(boost.base_speed + boost.delta)?;
            sleep(Duration::from_millis(boost.duration_ms)).await;
            shooter.apply(boost.base_speed)?;
        }
        Ok(())
    }
}

impl DispenseAction for FeedArmDispenser {
    #[instrument(name = "feed_arm_dispense", skip(self), fields(feed_arm = %self.feed_arm.name()))]
    async fn dispense(&self) -> Result<(), ContractError> {
        if let Err(e) = self.run_sequence().await {
            // Leave the arm stopped
            if let Err(stop_err) = self.feed_arm.apply(0.0) {
                warn!(error = %stop_err, "Failed to stop feed arm after dispense error");
            }
            return Err(ContractError::dispense(e.to_string()));
        }
        Ok(())
    }
}
