use anyhow::Result;
use std::path::Path;
use tracing::warn;

use crate::TelemetryConfig;

pub fn check_telemetry(cfg: &TelemetryConfig) -> Result<()> {
    let iface = cfg.interface();
    anyhow::ensure!(!iface.is_empty(), "telemetry.wireless_interface is empty");
    anyhow::ensure!(!iface.contains(char::is_whitespace), "telemetry.wireless_interface has whitespace: {:?}", iface);
    anyhow::ensure!(!cfg.mixer().is_empty(), "telemetry.mixer_control is empty");

    if let Some(ms) = cfg.link_query_timeout_ms {
        anyhow::ensure!((50..=10_000).contains(&ms), "telemetry.link_query_timeout_ms should be 50..10000");
    }

    // Bench machines often have no battery; samples will be marked invalid.
    if !Path::new(cfg.battery()).is_dir() {
        warn!("telemetry.battery_dir not found: {}", cfg.battery());
    }
    Ok(())
}
