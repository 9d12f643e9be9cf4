use async_trait::async_trait;

/// Bearing that leaves the drive motors at rest.
pub const NEUTRAL_BEARING: &str = "0";

#[derive(Debug, thiserror::Error)]
pub enum ActuationError {
    #[error("actuator rejected command: {0}")]
    Rejected(String),
    #[error("actuator unavailable: {0}")]
    Unavailable(String),
}

/// Motor and servo commands the watchdog is allowed to issue.
#[async_trait]
pub trait Actuation: Send + Sync {
    /// Queues a new bearing and returns without waiting for the motors.
    fn set_bearing(&self, bearing: &str, immediate: bool) -> Result<(), ActuationError>;

    /// Moves the look servo to its stop position; resolves once the servo
    /// controller acknowledges.
    async fn look_stop(&self) -> Result<(), ActuationError>;
}
