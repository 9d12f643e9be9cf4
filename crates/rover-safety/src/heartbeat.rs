use anyhow::{Context, Result};
use rover_proto::HeartbeatSnapshot;
use rover_telemetry::Sampler;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::actuation::{Actuation, NEUTRAL_BEARING};
use crate::session::{SessionEvent, SessionHub};
use crate::state::SharedState;
use crate::watchdog::WatchdogState;
use crate::HeartbeatConfig;

/// One session's worth of ticking: watchdog check, then a telemetry sample.
pub struct HeartbeatLoop {
    cfg: HeartbeatConfig,
    actuation: Arc<dyn Actuation>,
    sampler: Arc<Sampler>,
    shared: Arc<SharedState>,
}

impl HeartbeatLoop {
    /// Runs until `cancel` fires (Ok) or an actuator/internal fault (Err).
    /// Every await inside a tick races the token, so a cancelled loop issues
    /// no further commands and publishes nothing.
    pub async fn run(self, cancel: CancellationToken) -> Result<()> {
        info!(
            "heartbeat: starting (max interval {:?}, tick {:?})",
            self.cfg.max_heartbeat_interval, self.cfg.tick
        );

        let mut ticker = tokio::time::interval(self.cfg.tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("heartbeat: stopped");
                    return Ok(());
                }
                res = self.tick(&mut ticker) => res?,
            }
        }
    }

    async fn tick(&self, ticker: &mut Interval) -> Result<()> {
        ticker.tick().await;

        let (_, transitioned) = self.shared.evaluate(Instant::now(), self.cfg.max_heartbeat_interval);
        if transitioned {
            self.safety_stop().await?;
        }

        let previous = self.shared.snapshot();
        let next = self.sampler.sample(&previous).await;
        self.shared.publish(next);
        Ok(())
    }

    // State is already SafetyStopped when this runs; a slow servo only delays
    // the next tick, it cannot cause a second stop.
    async fn safety_stop(&self) -> Result<()> {
        warn!(
            "heartbeat: no signal for {:?} (max {:?}), stopping motors",
            self.shared.signal_age(),
            self.cfg.max_heartbeat_interval
        );
        self.actuation
            .set_bearing(NEUTRAL_BEARING, false)
            .context("set bearing to neutral")?;
        self.actuation.look_stop().await.context("move look servo to stop")?;
        Ok(())
    }
}

struct LoopTask {
    cancel: CancellationToken,
    join: JoinHandle<()>,
}

/// Session-scoped heartbeat watchdog plus the liveness API.
pub struct Heartbeat {
    cfg: HeartbeatConfig,
    actuation: Arc<dyn Actuation>,
    sampler: Arc<Sampler>,
    shared: Arc<SharedState>,
    task: Mutex<Option<LoopTask>>,
}

impl Heartbeat {
    pub fn new(cfg: HeartbeatConfig, actuation: Arc<dyn Actuation>, sampler: Sampler) -> Self {
        Self {
            cfg,
            actuation,
            sampler: Arc::new(sampler),
            shared: Arc::new(SharedState::new()),
            task: Mutex::new(None),
        }
    }

    /// Spawns the loop for a new session. Must be called inside a tokio runtime.
    ///
    /// A second start without an end replaces the stored handle; the earlier
    /// loop keeps running detached.
    pub fn on_session_started(&self) {
        let cancel = CancellationToken::new();
        let lp = HeartbeatLoop {
            cfg: self.cfg,
            actuation: Arc::clone(&self.actuation),
            sampler: Arc::clone(&self.sampler),
            shared: Arc::clone(&self.shared),
        };

        let token = cancel.clone();
        let join = tokio::spawn(async move {
            if let Err(e) = lp.run(token).await {
                error!("heartbeat: loop terminated: {:#}", e);
            }
        });

        if let Some(prev) = lock(&self.task).replace(LoopTask { cancel, join }) {
            if !prev.join.is_finished() {
                warn!("heartbeat: session started while a loop is still running; previous loop left detached");
            }
        }
    }

    /// Cancels the loop, waits for it to exit, then resets snapshot, watchdog
    /// and signal timestamp.
    pub async fn on_session_ended(&self) {
        let task = lock(&self.task).take();
        if let Some(task) = task {
            task.cancel.cancel();
            if let Err(e) = task.join.await {
                error!("heartbeat: loop task failed: {}", e);
            }
        }
        self.shared.reset();
        info!("heartbeat: session ended, telemetry reset");
    }

    /// Records a liveness signal and returns the latest snapshot without
    /// waiting for a new sample.
    pub fn report_signal_received(&self) -> HeartbeatSnapshot {
        self.shared.mark_signal();
        self.shared.snapshot()
    }

    pub fn snapshot(&self) -> HeartbeatSnapshot {
        self.shared.snapshot()
    }

    pub fn state(&self) -> WatchdogState {
        self.shared.state()
    }

    pub fn is_running(&self) -> bool {
        lock(&self.task).as_ref().is_some_and(|t| !t.join.is_finished())
    }

    /// Drives the session callbacks from `hub` until the hub is dropped.
    pub fn watch_sessions(self: &Arc<Self>, hub: &SessionHub) -> JoinHandle<()> {
        let mut rx = hub.subscribe();
        let hb = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(SessionEvent::Started) => hb.on_session_started(),
                    Ok(SessionEvent::Ended) => hb.on_session_ended().await,
                    // A dropped Ended would leave the loop running; fall back
                    // to the safe side and replay whatever follows.
                    Err(RecvError::Lagged(n)) => {
                        warn!("heartbeat: missed {} session events, ending session", n);
                        hb.on_session_ended().await;
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}
