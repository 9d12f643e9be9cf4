pub mod actuation;
pub mod doctor;
pub mod heartbeat;
pub mod session;
pub mod state;
pub mod watchdog;

use anyhow::{Context, Result};
use serde::Deserialize;
use std::time::Duration;

pub use actuation::{Actuation, ActuationError};
pub use heartbeat::Heartbeat;
pub use session::{SessionEvent, SessionHub};
pub use watchdog::{Watchdog, WatchdogState};

pub const DEFAULT_TICK: Duration = Duration::from_millis(500);

/// `[driver]` section of the robot config.
#[derive(Debug, Clone, Deserialize)]
pub struct DriverConfig {
    /// Seconds without a liveness signal before the robot is stopped.
    pub max_heartbeat_interval_s: f64,

    /// Heartbeat loop period. Default 500ms.
    pub tick_ms: Option<u64>,
}

impl DriverConfig {
    pub fn heartbeat_config(&self) -> Result<HeartbeatConfig> {
        let cfg = HeartbeatConfig::new(self.max_heartbeat_interval_s)?;
        match self.tick_ms {
            Some(ms) => {
                anyhow::ensure!(ms > 0, "driver.tick_ms must be > 0");
                Ok(cfg.with_tick(Duration::from_millis(ms)))
            }
            None => Ok(cfg),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeartbeatConfig {
    pub max_heartbeat_interval: Duration,
    pub tick: Duration,
}

impl HeartbeatConfig {
    pub fn new(max_heartbeat_interval_s: f64) -> Result<Self> {
        anyhow::ensure!(
            max_heartbeat_interval_s.is_finite() && max_heartbeat_interval_s > 0.0,
            "max heartbeat interval must be a positive number of seconds, got {}",
            max_heartbeat_interval_s
        );
        let max_heartbeat_interval = Duration::try_from_secs_f64(max_heartbeat_interval_s)
            .context("max heartbeat interval out of range")?;
        Ok(Self { max_heartbeat_interval, tick: DEFAULT_TICK })
    }

    pub fn with_tick(self, tick: Duration) -> Self {
        Self { tick, ..self }
    }
}
