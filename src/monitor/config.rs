//! Monitor timing and queue configuration.

use std::time::Duration;

use serde::Deserialize;

/// Configuration for a [`Monitor`](super::Monitor).
///
/// # Default Values
/// - `heartbeat_interval`: 10 seconds
/// - `min_heartbeat_interval`: 500 milliseconds
/// - `subscriber_capacity`: 16 updates
///
/// # Invariants
/// - `min_heartbeat_interval` is at least 1 millisecond and does not exceed `heartbeat_interval`
/// - `subscriber_capacity` is at least 1
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MonitorConfig {
    /// Delay between regular checks.
    #[serde(rename = "heartbeat_interval_ms", with = "crate::config::duration_ms")]
    pub heartbeat_interval: Duration,
    /// Minimum spacing between any two checks, including requested ones.
    #[serde(rename = "min_heartbeat_interval_ms", with = "crate::config::duration_ms")]
    pub min_heartbeat_interval: Duration,
    /// Updates buffered per subscriber before new ones are dropped.
    pub subscriber_capacity: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval: Duration::from_secs(10),
            min_heartbeat_interval: Duration::from_millis(500),
            subscriber_capacity: 16,
        }
    }
}

impl MonitorConfig {
    /// Clamp values to sane bounds.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    ///
    /// use wireline::monitor::MonitorConfig;
    ///
    /// let cfg = MonitorConfig {
    ///     heartbeat_interval: Duration::from_millis(100),
    ///     min_heartbeat_interval: Duration::ZERO,
    ///     subscriber_capacity: 0,
    /// };
    ///
    /// let normalized = cfg.normalized();
    /// assert_eq!(normalized.min_heartbeat_interval, Duration::from_millis(1));
    /// assert_eq!(normalized.subscriber_capacity, 1);
    /// ```
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.heartbeat_interval = self.heartbeat_interval.max(Duration::from_millis(1));
        self.min_heartbeat_interval = self
            .min_heartbeat_interval
            .clamp(Duration::from_millis(1), self.heartbeat_interval);
        self.subscriber_capacity = self.subscriber_capacity.max(1);
        self
    }
}
