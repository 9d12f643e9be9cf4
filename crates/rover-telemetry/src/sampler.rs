use anyhow::{Context, Result};
use rover_proto::HeartbeatSnapshot;
use std::time::Duration;
use tracing::warn;

use crate::sources::TelemetrySources;
use crate::wireless::parse_link_status;
use crate::TelemetryConfig;

/// Collects one telemetry snapshot per call.
pub struct Sampler {
    sources: TelemetrySources,
    link_timeout: Option<Duration>,
}

impl Sampler {
    pub fn new(sources: TelemetrySources, link_timeout: Option<Duration>) -> Self {
        Self { sources, link_timeout }
    }

    pub fn from_config(cfg: &TelemetryConfig, sources: TelemetrySources) -> Self {
        Self::new(sources, cfg.link_timeout())
    }

    /// Never fails. If any source errors, the failure is logged and `previous`
    /// comes back flagged invalid, so repeated failures keep returning the same
    /// data instead of a half-filled record.
    pub async fn sample(&self, previous: &HeartbeatSnapshot) -> HeartbeatSnapshot {
        match self.collect().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("telemetry: sample failed, keeping previous data: {:#}", e);
                previous.invalidated()
            }
        }
    }

    /// One full pass over every source; the first failure aborts the pass.
    pub async fn collect(&self) -> Result<HeartbeatSnapshot> {
        let link = parse_link_status(&self.query_link().await?);
        let volume = self.sources.volume.volume().await.context("read volume")?;
        let cpu_load = self.sources.cpu.cpu_percent().context("read cpu load")?;
        let lights_on = self.sources.lights.lights_on();
        let battery = self.sources.power.battery_info().context("read battery")?;

        Ok(HeartbeatSnapshot {
            ssid: link.ssid,
            link_quality: link.quality,
            signal_level: link.signal,
            volume,
            cpu_load,
            lights_on,
            battery_percent: battery.percent,
            battery_charging: battery.charging,
            invalid: false,
            ts_unix_ms: (time::OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64,
        })
    }

    async fn query_link(&self) -> Result<String> {
        let query = self.sources.link.link_status();
        match self.link_timeout {
            Some(limit) => tokio::time::timeout(limit, query)
                .await
                .with_context(|| format!("link query timed out after {:?}", limit))?,
            None => query.await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::{BatteryInfo, CpuProbe, LightsFlag, LinkQuery, PowerSource, VolumeSource};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    struct FakeLink {
        text: &'static str,
        fail: AtomicBool,
    }

    #[async_trait]
    impl LinkQuery for FakeLink {
        async fn link_status(&self) -> Result<String> {
            anyhow::ensure!(!self.fail.load(Ordering::Relaxed), "iwconfig: no such device");
            Ok(self.text.to_string())
        }
    }

    struct StuckLink;

    #[async_trait]
    impl LinkQuery for StuckLink {
        async fn link_status(&self) -> Result<String> {
            std::future::pending().await
        }
    }

    struct FakeVolume(i32);

    #[async_trait]
    impl VolumeSource for FakeVolume {
        async fn volume(&self) -> Result<i32> {
            Ok(self.0)
        }
    }

    struct FakeCpu(f32);

    impl CpuProbe for FakeCpu {
        fn cpu_percent(&self) -> Result<f32> {
            Ok(self.0)
        }
    }

    struct FakePower(Option<BatteryInfo>);

    impl PowerSource for FakePower {
        fn battery_info(&self) -> Result<BatteryInfo> {
            self.0.context("battery not present")
        }
    }

    fn sources(link: Arc<dyn LinkQuery>, power: Option<BatteryInfo>) -> TelemetrySources {
        TelemetrySources {
            link,
            volume: Arc::new(FakeVolume(55)),
            cpu: Arc::new(FakeCpu(12.5)),
            lights: Arc::new(LightsFlag::new(true)),
            power: Arc::new(FakePower(power)),
        }
    }

    fn link(text: &'static str) -> Arc<FakeLink> {
        Arc::new(FakeLink { text, fail: AtomicBool::new(false) })
    }

    const FULL: BatteryInfo = BatteryInfo { percent: 80.0, charging: true };

    #[tokio::test]
    async fn success_fills_every_field() {
        let sampler = Sampler::new(
            sources(link("ESSID:\"MyNet\" Link Quality=70/70 Signal level=-40 dBm"), Some(FULL)),
            None,
        );
        let s = sampler.sample(&HeartbeatSnapshot::default()).await;
        assert!(!s.invalid);
        assert_eq!(s.ssid, "MyNet");
        assert_eq!(s.link_quality, "70/70");
        assert_eq!(s.signal_level, "-40 dBm");
        assert_eq!(s.volume, 55);
        assert_eq!(s.cpu_load, 12.5);
        assert!(s.lights_on);
        assert_eq!(s.battery_percent, 80.0);
        assert!(s.battery_charging);
        assert!(s.ts_unix_ms > 0);
    }

    #[tokio::test]
    async fn empty_link_text_is_still_a_valid_sample() {
        let sampler = Sampler::new(sources(link(""), Some(FULL)), None);
        let s = sampler.sample(&HeartbeatSnapshot::default()).await;
        assert!(!s.invalid);
        assert_eq!((s.ssid.as_str(), s.link_quality.as_str(), s.signal_level.as_str()), ("-", "-", "-"));
    }

    #[tokio::test]
    async fn failure_returns_previous_marked_invalid() {
        let l = link("ESSID:\"MyNet\"");
        let sampler = Sampler::new(sources(l.clone(), Some(FULL)), None);
        let good = sampler.sample(&HeartbeatSnapshot::default()).await;
        assert!(!good.invalid);

        l.fail.store(true, Ordering::Relaxed);
        let first = sampler.sample(&good).await;
        assert!(first.invalid);
        assert_eq!(first.ssid, "MyNet");
        assert_eq!(first.ts_unix_ms, good.ts_unix_ms);

        let second = sampler.sample(&first).await;
        assert_eq!(second, first);
    }

    #[tokio::test]
    async fn battery_failure_discards_the_whole_pass() {
        let sampler = Sampler::new(sources(link("ESSID:\"Other\""), None), None);
        let prev = HeartbeatSnapshot { ssid: "Old".into(), invalid: false, ..HeartbeatSnapshot::default() };
        let s = sampler.sample(&prev).await;
        assert!(s.invalid);
        assert_eq!(s.ssid, "Old");
        assert!(sampler.collect().await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn stuck_link_query_times_out() {
        let sampler = Sampler::new(sources(Arc::new(StuckLink), Some(FULL)), Some(Duration::from_millis(200)));
        let s = sampler.sample(&HeartbeatSnapshot::default()).await;
        assert_eq!(s, HeartbeatSnapshot::default());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn hung_iwconfig_times_out_every_tick() {
        // `sleep 30` stands in for an iwconfig that never answers
        let link = Arc::new(crate::wireless::Iwconfig::with_program("sleep", "30"));
        let sampler = Sampler::new(sources(link, Some(FULL)), Some(Duration::from_millis(100)));

        let started = std::time::Instant::now();
        let mut prev = HeartbeatSnapshot::default();
        for _ in 0..5 {
            prev = sampler.sample(&prev).await;
            assert!(prev.invalid);
        }
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
