use tokio::sync::broadcast;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    Started,
    Ended,
}

/// Fans session lifecycle events out to any number of subscribers.
#[derive(Debug, Clone)]
pub struct SessionHub {
    tx: broadcast::Sender<SessionEvent>,
}

impl Default for SessionHub {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionHub {
    pub fn new() -> Self {
        Self::with_capacity(16)
    }

    /// Events a slow subscriber may fall behind by before it starts missing them.
    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.tx.subscribe()
    }

    /// Returns how many subscribers were notified.
    pub fn started(&self) -> usize {
        self.publish(SessionEvent::Started)
    }

    pub fn ended(&self) -> usize {
        self.publish(SessionEvent::Ended)
    }

    fn publish(&self, ev: SessionEvent) -> usize {
        match self.tx.send(ev) {
            Ok(n) => n,
            Err(_) => {
                debug!("session: {:?} with no subscribers", ev);
                0
            }
        }
    }
}
