use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::sources::{BatteryInfo, PowerSource};

/// Battery state from a Linux power_supply directory
/// (`/sys/class/power_supply/BAT0` and friends).
#[derive(Debug, Clone)]
pub struct SysfsBattery {
    dir: PathBuf,
}

impl SysfsBattery {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl PowerSource for SysfsBattery {
    fn battery_info(&self) -> Result<BatteryInfo> {
        let capacity = read_attr(&self.dir, "capacity")?;
        let percent: f32 = capacity.parse()
            .with_context(|| format!("parse battery capacity {:?}", capacity))?;
        anyhow::ensure!(percent.is_finite(), "battery capacity not a number: {:?}", capacity);

        let status = read_attr(&self.dir, "status")?;
        Ok(BatteryInfo {
            percent: percent.clamp(0.0, 100.0),
            charging: is_charging(&status),
        })
    }
}

// "Full" means still on external power
fn is_charging(status: &str) -> bool {
    matches!(status, "Charging" | "Full")
}

fn read_attr(dir: &Path, name: &str) -> Result<String> {
    let path = dir.join(name);
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("read battery attribute {}", path.display()))?;
    Ok(content.trim().to_string())
}
