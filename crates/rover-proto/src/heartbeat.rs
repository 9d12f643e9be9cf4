use serde::{Deserialize, Serialize};

/// Placeholder for text fields nobody could read.
pub const UNKNOWN: &str = "-";

/// Most recent telemetry record handed to liveness callers.
///
/// Field names on the wire match what the control UI already consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeartbeatSnapshot {
    #[serde(rename = "SSID")]
    pub ssid: String,
    #[serde(rename = "Quality")]
    pub link_quality: String,
    #[serde(rename = "Signal")]
    pub signal_level: String,
    #[serde(rename = "Volume")]
    pub volume: i32,
    #[serde(rename = "CPU")]
    pub cpu_load: f32,
    #[serde(rename = "Lights")]
    pub lights_on: bool,
    #[serde(rename = "BatteryPercent")]
    pub battery_percent: f32,
    #[serde(rename = "BatteryCharging")]
    pub battery_charging: bool,
    /// No data collected since the last reset, or the last sample failed.
    #[serde(rename = "InvalidState")]
    pub invalid: bool,
    #[serde(rename = "TsUnixMs")]
    pub ts_unix_ms: i64,
}

impl Default for HeartbeatSnapshot {
    fn default() -> Self {
        Self {
            ssid: UNKNOWN.into(),
            link_quality: UNKNOWN.into(),
            signal_level: UNKNOWN.into(),
            volume: 0,
            cpu_load: 0.0,
            lights_on: false,
            battery_percent: 0.0,
            battery_charging: false,
            invalid: true,
            ts_unix_ms: 0,
        }
    }
}

impl HeartbeatSnapshot {
    /// Same data, flagged as not freshly collected.
    pub fn invalidated(&self) -> Self {
        Self { invalid: true, ..self.clone() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_all_unknown_and_invalid() {
        let s = HeartbeatSnapshot::default();
        assert_eq!(s.ssid, "-");
        assert_eq!(s.link_quality, "-");
        assert_eq!(s.signal_level, "-");
        assert_eq!(s.volume, 0);
        assert!(!s.lights_on);
        assert_eq!(s.battery_percent, 0.0);
        assert!(!s.battery_charging);
        assert!(s.invalid);
    }

    #[test]
    fn serializes_with_ui_field_names() {
        let v = serde_json::to_value(HeartbeatSnapshot::default()).unwrap();
        let obj = v.as_object().unwrap();
        for key in [
            "SSID", "Quality", "Signal", "Volume", "CPU", "Lights",
            "BatteryPercent", "BatteryCharging", "InvalidState", "TsUnixMs",
        ] {
            assert!(obj.contains_key(key), "missing {}", key);
        }
        assert_eq!(obj["InvalidState"], true);
    }

    #[test]
    fn invalidated_keeps_data() {
        let s = HeartbeatSnapshot {
            ssid: "MyNet".into(),
            volume: 40,
            invalid: false,
            ..HeartbeatSnapshot::default()
        };
        let i = s.invalidated();
        assert!(i.invalid);
        assert_eq!(i.ssid, "MyNet");
        assert_eq!(i.volume, 40);
    }
}
