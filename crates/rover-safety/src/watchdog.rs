use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WatchdogState {
    /// Motors free to move.
    #[default]
    Armed,
    /// Motors at neutral, look servo at its stop position.
    SafetyStopped,
}

/// Liveness state machine. Only the Armed -> SafetyStopped edge asks for a
/// side effect; re-arming is silent.
#[derive(Debug, Default)]
pub struct Watchdog {
    state: WatchdogState,
}

impl Watchdog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> WatchdogState {
        self.state
    }

    /// Returns the new state and whether the stop side effect must fire.
    /// A `now` earlier than `last_signal` counts as no time elapsed.
    pub fn evaluate(&mut self, now: Instant, last_signal: Instant, timeout: Duration) -> (WatchdogState, bool) {
        let stale = now.saturating_duration_since(last_signal) > timeout;

        let transitioned = match (self.state, stale) {
            (WatchdogState::Armed, true) => {
                self.state = WatchdogState::SafetyStopped;
                true
            }
            (WatchdogState::SafetyStopped, false) => {
                self.state = WatchdogState::Armed;
                false
            }
            _ => false,
        };

        (self.state, transitioned)
    }

    pub fn reset(&mut self) {
        self.state = WatchdogState::Armed;
    }
}
