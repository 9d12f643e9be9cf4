use anyhow::Result;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::battery::SysfsBattery;
use crate::cpu::SysinfoCpu;
use crate::volume::Amixer;
use crate::wireless::Iwconfig;
use crate::TelemetryConfig;

/// Free-text wireless link status (iwconfig style).
#[async_trait]
pub trait LinkQuery: Send + Sync {
    async fn link_status(&self) -> Result<String>;
}

/// Audio output volume, integer percent.
#[async_trait]
pub trait VolumeSource: Send + Sync {
    async fn volume(&self) -> Result<i32>;
}

/// CPU utilisation since the previous probe, in percent.
pub trait CpuProbe: Send + Sync {
    fn cpu_percent(&self) -> Result<f32>;
}

/// Read-only view of the lighting subsystem.
pub trait LightsStatus: Send + Sync {
    fn lights_on(&self) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BatteryInfo {
    pub percent: f32,
    pub charging: bool,
}

pub trait PowerSource: Send + Sync {
    fn battery_info(&self) -> Result<BatteryInfo>;
}

/// Lights state owned by whoever drives the lights; the sampler only reads it.
#[derive(Debug, Default)]
pub struct LightsFlag(AtomicBool);

impl LightsFlag {
    pub fn new(on: bool) -> Self {
        Self(AtomicBool::new(on))
    }

    pub fn set(&self, on: bool) {
        self.0.store(on, Ordering::Relaxed);
    }
}

impl LightsStatus for LightsFlag {
    fn lights_on(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Clone)]
pub struct TelemetrySources {
    pub link: Arc<dyn LinkQuery>,
    pub volume: Arc<dyn VolumeSource>,
    pub cpu: Arc<dyn CpuProbe>,
    pub lights: Arc<dyn LightsStatus>,
    pub power: Arc<dyn PowerSource>,
}

impl TelemetrySources {
    /// OS-backed sources for a Linux robot.
    pub fn linux(cfg: &TelemetryConfig, lights: Arc<dyn LightsStatus>) -> Self {
        Self {
            link: Arc::new(Iwconfig::new(cfg.interface())),
            volume: Arc::new(Amixer::new(cfg.mixer())),
            cpu: Arc::new(SysinfoCpu::new()),
            lights,
            power: Arc::new(SysfsBattery::new(cfg.battery())),
        }
    }
}
