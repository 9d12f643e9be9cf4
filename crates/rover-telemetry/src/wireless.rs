use anyhow::Result;
use async_trait::async_trait;
use rover_proto::heartbeat::UNKNOWN;
use tracing::debug;

use crate::process::run_tool;
use crate::sources::LinkQuery;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkStatus {
    pub ssid: String,
    pub quality: String,
    pub signal: String,
}

/// Pulls SSID, link quality and signal level out of `iwconfig` output.
/// Anything not found comes back as `-`.
pub fn parse_link_status(text: &str) -> LinkStatus {
    // ESSID:"MyNet"
    let ssid = after(text, "ESSID:\"")
        .and_then(|rest| rest.split_once('"'))
        .map(|(v, _)| v)
        .filter(|v| !v.is_empty() && !v.contains('\n'));

    // Link Quality=70/70  Signal level=-40 dBm
    let quality = after(text, "Link Quality=")
        .map(|rest| rest.split([' ', '\n']).next().unwrap_or(""))
        .filter(|v| !v.is_empty());

    // value runs up to and including the unit, same line only
    let signal = after(text, "Signal level=").and_then(|rest| {
        let line = rest.split('\n').next().unwrap_or("");
        line.find(" dBm").map(|end| &line[..end + " dBm".len()])
    });

    LinkStatus {
        ssid: ssid.unwrap_or(UNKNOWN).to_string(),
        quality: quality.unwrap_or(UNKNOWN).to_string(),
        signal: signal.unwrap_or(UNKNOWN).to_string(),
    }
}

fn after<'a>(text: &'a str, marker: &str) -> Option<&'a str> {
    text.find(marker).map(|i| &text[i + marker.len()..])
}

/// `iwconfig <interface>` via tokio::process.
#[derive(Debug, Clone)]
pub struct Iwconfig {
    program: String,
    interface: String,
}

impl Iwconfig {
    pub fn new(interface: impl Into<String>) -> Self {
        Self::with_program("iwconfig", interface)
    }

    /// Same query through another binary (wrapper script, absolute path).
    pub fn with_program(program: impl Into<String>, interface: impl Into<String>) -> Self {
        Self { program: program.into(), interface: interface.into() }
    }
}

#[async_trait]
impl LinkQuery for Iwconfig {
    async fn link_status(&self) -> Result<String> {
        let out = run_tool(&self.program, &[self.interface.as_str()]).await?;

        // Not associated / not wireless: iwconfig exits non-zero and we just
        // end up with unknown fields.
        if !out.status.success() {
            debug!("telemetry: {} {} exited with {}", self.program, self.interface, out.status);
        }
        Ok(String::from_utf8_lossy(&out.stdout).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const IWCONFIG: &str = "wlan0     IEEE 802.11  ESSID:\"MyNet\"  \n\
          Mode:Managed  Frequency:5.18 GHz  Access Point: 11:22:33:44:55:66   \n\
          Bit Rate=433.3 Mb/s   Tx-Power=31 dBm   \n\
          Retry short limit:7   RTS thr:off   Fragment thr:off\n\
          Power Management:on\n\
          Link Quality=70/70  Signal level=-40 dBm  \n\
          Rx invalid nwid:0  Rx invalid crypt:0  Rx invalid frag:0\n";

    #[test]
    fn parses_full_iwconfig_output() {
        let s = parse_link_status(IWCONFIG);
        assert_eq!(s.ssid, "MyNet");
        assert_eq!(s.quality, "70/70");
        assert_eq!(s.signal, "-40 dBm");
    }

    #[test]
    fn parses_compact_line() {
        let s = parse_link_status("ESSID:\"MyNet\" ... Link Quality=70/70 ... Signal level=-40 dBm");
        assert_eq!(s.ssid, "MyNet");
        assert_eq!(s.quality, "70/70");
        assert_eq!(s.signal, "-40 dBm");
    }

    #[test]
    fn empty_text_is_all_unknown() {
        let s = parse_link_status("");
        assert_eq!(s, LinkStatus { ssid: "-".into(), quality: "-".into(), signal: "-".into() });
    }

    #[test]
    fn not_associated_keeps_unknowns() {
        let s = parse_link_status("wlan0     IEEE 802.11  ESSID:off/any  \n Mode:Managed  Access Point: Not-Associated\n");
        assert_eq!(s.ssid, "-");
        assert_eq!(s.quality, "-");
        assert_eq!(s.signal, "-");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failing_iwconfig_yields_unknown_fields() {
        let text = Iwconfig::with_program("false", "wlan0").link_status().await.unwrap();
        let s = parse_link_status(&text);
        assert_eq!((s.ssid.as_str(), s.quality.as_str(), s.signal.as_str()), ("-", "-", "-"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn stdout_is_returned_verbatim() {
        let q = Iwconfig::with_program("echo", "ESSID:\"Lab\" Link Quality=40/70 Signal level=-61 dBm");
        let s = parse_link_status(&q.link_status().await.unwrap());
        assert_eq!(s.ssid, "Lab");
        assert_eq!(s.quality, "40/70");
        assert_eq!(s.signal, "-61 dBm");
    }

    #[tokio::test]
    async fn missing_iwconfig_is_an_error() {
        let q = Iwconfig::with_program("/nonexistent/sbin/iwconfig", "wlan0");
        assert!(q.link_status().await.is_err());
    }

    #[test]
    fn signal_without_unit_is_unknown() {
        let s = parse_link_status("Link Quality=31/70  Signal level=-79\nESSID:\"x y\"");
        assert_eq!(s.quality, "31/70");
        assert_eq!(s.signal, "-");
        assert_eq!(s.ssid, "x y");
    }
}
