use rover_proto::HeartbeatSnapshot;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

use crate::watchdog::{Watchdog, WatchdogState};

/// State shared between the heartbeat loop and liveness callers.
///
/// Each field has its own lock and no lock is held across an `.await`, so a
/// reader always gets a whole snapshot and never waits on a slow tick.
#[derive(Debug)]
pub struct SharedState {
    last_signal: Mutex<Instant>,
    snapshot: Mutex<HeartbeatSnapshot>,
    watchdog: Mutex<Watchdog>,
}

impl Default for SharedState {
    fn default() -> Self {
        Self {
            last_signal: Mutex::new(Instant::now()),
            snapshot: Mutex::new(HeartbeatSnapshot::default()),
            watchdog: Mutex::new(Watchdog::new()),
        }
    }
}

impl SharedState {
    /// Signal timestamp is seeded to now, so a fresh state is Armed.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_signal(&self) {
        *lock(&self.last_signal) = Instant::now();
    }

    pub fn last_signal(&self) -> Instant {
        *lock(&self.last_signal)
    }

    pub fn signal_age(&self) -> Duration {
        self.last_signal().elapsed()
    }

    pub fn snapshot(&self) -> HeartbeatSnapshot {
        lock(&self.snapshot).clone()
    }

    pub fn publish(&self, snapshot: HeartbeatSnapshot) {
        *lock(&self.snapshot) = snapshot;
    }

    pub fn state(&self) -> WatchdogState {
        lock(&self.watchdog).state()
    }

    pub fn evaluate(&self, now: Instant, timeout: Duration) -> (WatchdogState, bool) {
        let last = self.last_signal();
        lock(&self.watchdog).evaluate(now, last, timeout)
    }

    /// Back to the construction-time shape.
    pub fn reset(&self) {
        self.publish(HeartbeatSnapshot::default());
        lock(&self.watchdog).reset();
        self.mark_signal();
    }
}

// A panicking writer cannot leave a half-written snapshot: writes are whole
// value swaps.
fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}
