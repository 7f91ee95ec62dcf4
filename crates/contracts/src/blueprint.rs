//! TrackerBlueprint - Config Loader output
//!
//! Describes the complete tracker configuration: telemetry link, pursuit
//! tuning, actuator refresh routing, firing limits and dispense timing.
//! Every field defaults to the tuned values the mechanism shipped with.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::Validate;

use crate::HEIGHT_CHANNEL;

/// Config version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete tracker configuration blueprint
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct TrackerBlueprint {
    /// Config version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Vision telemetry connection
    #[serde(default)]
    #[validate(nested)]
    pub link: LinkConfig,

    /// Pursuit controller tuning
    #[serde(default)]
    #[validate(nested)]
    pub pursuit: PursuitConfig,

    /// Periodic actuator refresh
    #[serde(default)]
    #[validate(nested)]
    pub dispatcher: DispatcherConfig,

    /// Shot limits
    #[serde(default)]
    #[validate(nested)]
    pub firing: FiringConfig,

    /// Feed arm timing
    #[serde(default)]
    #[validate(nested)]
    pub dispense: DispenseConfig,
}

/// Telemetry link configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LinkConfig {
    /// Vision peer host
    #[serde(default = "default_link_host")]
    #[validate(length(min = 1))]
    pub host: String,

    /// Vision peer port
    #[serde(default = "default_link_port")]
    #[validate(range(min = 1))]
    pub port: u16,

    /// Connect timeout in milliseconds (0 = OS default)
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// A silent line is fed to the frame reader as one zero byte per poll (0 = disabled)
    #[serde(default = "default_idle_poll_ms")]
    pub idle_poll_ms: u64,

    /// Frame reader circular buffer capacity (bytes)
    #[serde(default = "default_buffer_capacity")]
    #[validate(range(min = 16))]
    pub buffer_capacity: usize,

    /// Consecutive zero bytes that close a frame
    #[serde(default = "default_zero_threshold")]
    #[validate(range(min = 1))]
    pub zero_threshold: usize,
}

fn default_link_host() -> String {
    "localhost".to_string()
}

fn default_link_port() -> u16 {
    6060
}

fn default_connect_timeout_ms() -> u64 {
    3000
}

fn default_idle_poll_ms() -> u64 {
    5
}

fn default_buffer_capacity() -> usize {
    1024
}

fn default_zero_threshold() -> usize {
    10
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            host: default_link_host(),
            port: default_link_port(),
            connect_timeout_ms: default_connect_timeout_ms(),
            idle_poll_ms: default_idle_poll_ms(),
            buffer_capacity: default_buffer_capacity(),
            zero_threshold: default_zero_threshold(),
        }
    }
}

impl LinkConfig {
    /// `host:port` string for socket connection
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        (self.connect_timeout_ms > 0).then(|| Duration::from_millis(self.connect_timeout_ms))
    }

    pub fn idle_poll(&self) -> Option<Duration> {
        (self.idle_poll_ms > 0).then(|| Duration::from_millis(self.idle_poll_ms))
    }
}

/// Pursuit controller tuning
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PursuitConfig {
    /// Control loop period in milliseconds
    #[serde(default = "default_pursuit_period_ms")]
    #[validate(range(min = 1))]
    pub period_ms: u64,

    /// Without an update for this long the drive is held at zero
    #[serde(default = "default_stale_timeout_ms")]
    #[validate(range(min = 1))]
    pub stale_timeout_ms: u64,

    /// Target width at which the mechanism is in range
    #[serde(default = "default_goal_distance")]
    pub goal_distance: f64,

    /// Width dead-zone around `goal_distance`
    #[serde(default = "default_goal_threshold")]
    #[validate(range(min = 0.0))]
    pub goal_threshold: f64,

    /// Base drive speed for distance correction
    #[serde(default = "default_drive_speed")]
    #[validate(range(min = 0.0, max = 1.0))]
    pub drive_speed: f64,

    /// Width error that maps to full `drive_speed`
    #[serde(default = "default_distance_divisor")]
    #[validate(range(min = 1.0))]
    pub distance_divisor: f64,

    /// Steering gain applied to the averaged angle
    #[serde(default = "default_angle_drive_ratio")]
    pub angle_drive_ratio: f64,

    /// Angle dead-zone, also the alignment bound for shooting
    #[serde(default = "default_zone")]
    #[validate(range(min = 0.0))]
    pub zone: f64,

    /// Side changes smaller than this are averaged with the previous output
    #[serde(default = "default_speed_threshold")]
    #[validate(range(min = 0.0))]
    pub speed_threshold: f64,
}

fn default_pursuit_period_ms() -> u64 {
    50
}

fn default_stale_timeout_ms() -> u64 {
    5000
}

fn default_goal_distance() -> f64 {
    100.0
}

fn default_goal_threshold() -> f64 {
    5.0
}

fn default_drive_speed() -> f64 {
    0.33
}

fn default_distance_divisor() -> f64 {
    50.0
}

fn default_angle_drive_ratio() -> f64 {
    0.33
}

fn default_zone() -> f64 {
    0.2
}

fn default_speed_threshold() -> f64 {
    0.15
}

impl Default for PursuitConfig {
    fn default() -> Self {
        Self {
            period_ms: default_pursuit_period_ms(),
            stale_timeout_ms: default_stale_timeout_ms(),
            goal_distance: default_goal_distance(),
            goal_threshold: default_goal_threshold(),
            drive_speed: default_drive_speed(),
            distance_divisor: default_distance_divisor(),
            angle_drive_ratio: default_angle_drive_ratio(),
            zone: default_zone(),
            speed_threshold: default_speed_threshold(),
        }
    }
}

impl PursuitConfig {
    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }

    pub fn stale_timeout(&self) -> Duration {
        Duration::from_millis(self.stale_timeout_ms)
    }
}

/// Periodic actuator refresh configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DispatcherConfig {
    /// Refresh period per channel in milliseconds
    #[serde(default = "default_dispatch_period_ms")]
    #[validate(range(min = 1))]
    pub period_ms: u64,

    /// Output vector slot -> actuator routing
    #[serde(default = "default_channel_bindings")]
    pub channels: Vec<ChannelBinding>,
}

/// Binds one output vector slot to one named actuator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelBinding {
    /// Output vector slot
    pub index: usize,

    /// Actuator name
    pub actuator: String,
}

impl ChannelBinding {
    pub fn new(index: usize, actuator: impl Into<String>) -> Self {
        Self {
            index,
            actuator: actuator.into(),
        }
    }
}

fn default_dispatch_period_ms() -> u64 {
    100
}

fn default_channel_bindings() -> Vec<ChannelBinding> {
    // Both the lift angle and the wheel power follow the target height
    vec![
        ChannelBinding::new(HEIGHT_CHANNEL, "traam"),
        ChannelBinding::new(HEIGHT_CHANNEL, "shooter_wheel"),
    ]
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            period_ms: default_dispatch_period_ms(),
            channels: default_channel_bindings(),
        }
    }
}

impl DispatcherConfig {
    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }
}

/// Shot limits per tracking session
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct FiringConfig {
    /// Shots per session
    #[serde(default = "default_max_shots")]
    #[validate(range(min = 1))]
    pub max_shots: u32,

    /// Minimum time between shots in milliseconds
    #[serde(default = "default_min_interval_ms")]
    pub min_interval_ms: u64,
}

fn default_max_shots() -> u32 {
    4
}

fn default_min_interval_ms() -> u64 {
    1500
}

impl Default for FiringConfig {
    fn default() -> Self {
        Self {
            max_shots: default_max_shots(),
            min_interval_ms: default_min_interval_ms(),
        }
    }
}

impl FiringConfig {
    pub fn min_interval(&self) -> Duration {
        Duration::from_millis(self.min_interval_ms)
    }
}

/// Feed arm park / release timing
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DispenseConfig {
    /// Feed arm output while parking
    #[serde(default = "default_park_speed")]
    pub park_speed: f64,

    /// Time spent driving the arm to park
    #[serde(default = "default_park_ms")]
    pub park_ms: u64,

    /// Pause between park and release
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,

    /// Feed arm output while releasing
    #[serde(default = "default_release_speed")]
    pub release_speed: f64,

    /// Time spent releasing
    #[serde(default = "default_release_ms")]
    pub release_ms: u64,

    /// Optional shooter wheel boost after each release
    #[serde(default)]
    #[validate(nested)]
    pub boost: Option<BoostConfig>,
}

/// Temporary shooter wheel acceleration after a release
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BoostConfig {
    /// Wheel output restored after the boost
    #[validate(range(min = 0.0, max = 1.0))]
    pub base_speed: f64,

    /// Added to `base_speed` during the boost
    #[serde(default = "default_boost_delta")]
    pub delta: f64,

    /// Boost duration in milliseconds
    #[serde(default = "default_boost_ms")]
    pub duration_ms: u64,
}

fn default_park_speed() -> f64 {
    0.3
}

fn default_park_ms() -> u64 {
    250
}

fn default_settle_ms() -> u64 {
    300
}

fn default_release_speed() -> f64 {
    -0.3
}

fn default_release_ms() -> u64 {
    140
}

fn default_boost_delta() -> f64 {
    0.1
}

fn default_boost_ms() -> u64 {
    1000
}

impl Default for DispenseConfig {
    fn default() -> Self {
        Self {
            park_speed: default_park_speed(),
            park_ms: default_park_ms(),
            settle_ms: default_settle_ms(),
            release_speed: default_release_speed(),
            release_ms: default_release_ms(),
            boost: None,
        }
    }
}
