pub mod battery;
pub mod cpu;
pub mod doctor;
mod process;
pub mod sampler;
pub mod sources;
pub mod volume;
pub mod wireless;

use serde::Deserialize;

pub use sampler::Sampler;
pub use sources::{BatteryInfo, CpuProbe, LightsFlag, LightsStatus, LinkQuery, PowerSource, TelemetrySources, VolumeSource};

pub const DEFAULT_WIRELESS_INTERFACE: &str = "wlan0";
pub const DEFAULT_MIXER_CONTROL: &str = "Master";
pub const DEFAULT_BATTERY_DIR: &str = "/sys/class/power_supply/BAT0";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TelemetryConfig {
    /// Interface handed to `iwconfig`. Default wlan0.
    pub wireless_interface: Option<String>,

    /// ALSA simple mixer control read by `amixer get`. Default Master.
    pub mixer_control: Option<String>,

    /// power_supply directory holding `capacity` and `status`.
    pub battery_dir: Option<String>,

    /// Upper bound for the wireless query. Unbounded when absent.
    pub link_query_timeout_ms: Option<u64>,
}

impl TelemetryConfig {
    pub fn interface(&self) -> &str {
        self.wireless_interface.as_deref().unwrap_or(DEFAULT_WIRELESS_INTERFACE)
    }

    pub fn mixer(&self) -> &str {
        self.mixer_control.as_deref().unwrap_or(DEFAULT_MIXER_CONTROL)
    }

    pub fn battery(&self) -> &str {
        self.battery_dir.as_deref().unwrap_or(DEFAULT_BATTERY_DIR)
    }

    pub fn link_timeout(&self) -> Option<std::time::Duration> {
        self.link_query_timeout_ms.map(std::time::Duration::from_millis)
    }
}
