use anyhow::Result;
use std::time::Duration;

use crate::DriverConfig;

pub fn check_driver(cfg: &DriverConfig) -> Result<()> {
    let hb = cfg.heartbeat_config()?;
    anyhow::ensure!(
        hb.max_heartbeat_interval > hb.tick,
        "driver.max_heartbeat_interval_s must be longer than one tick ({:?})",
        hb.tick
    );
    anyhow::ensure!(
        hb.max_heartbeat_interval <= Duration::from_secs(60),
        "driver.max_heartbeat_interval_s above 60s leaves the robot unattended too long"
    );
    anyhow::ensure!(hb.tick <= Duration::from_secs(5), "driver.tick_ms should be <= 5000");
    Ok(())
}
