use thiserror::Error;

/// Errors returned by [`Monitor`](super::Monitor).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MonitorError {
    /// The monitor is stopping or stopped and accepts no subscribers.
    #[error("monitor is closed")]
    Closed,
}
