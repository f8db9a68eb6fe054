//! Metric helpers for `wireline`.
//!
//! This module defines metric names and small helper functions wrapping the
//! [`metrics`](https://docs.rs/metrics) crate. Without the `metrics` feature
//! the helpers compile to nothing.

#[cfg(feature = "metrics")]
use metrics::{counter, gauge};

use crate::compression::CompressorId;

/// Name of the gauge tracking connections issued by capped providers and not
/// yet released.
pub const CONNECTIONS_CHECKED_OUT: &str = "wireline_connections_checked_out";
/// Name of the counter tracking acquisitions abandoned because the caller's
/// context finished first.
pub const ACQUIRE_TIMEOUTS: &str = "wireline_acquire_timeouts_total";
/// Name of the counter tracking connection factory failures.
pub const FACTORY_ERRORS: &str = "wireline_factory_errors_total";
/// Name of the counter tracking uncompressed bytes through the compression
/// engine.
pub const COMPRESSION_BYTES: &str = "wireline_compression_bytes_total";
/// Name of the counter tracking topology updates dropped for full subscriber
/// queues.
pub const MONITOR_UPDATES_DROPPED: &str = "wireline_monitor_updates_dropped_total";

/// Direction of a compression call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Outgoing payload compressed.
    Compress,
    /// Incoming payload decompressed.
    Decompress,
}

impl Direction {
    #[cfg_attr(not(feature = "metrics"), allow(dead_code))]
    fn as_str(self) -> &'static str {
        match self {
            Direction::Compress => "compress",
            Direction::Decompress => "decompress",
        }
    }
}

/// Increment the checked-out connections gauge.
pub fn inc_checked_out() {
    #[cfg(feature = "metrics")]
    gauge!(CONNECTIONS_CHECKED_OUT).increment(1.0);
}

/// Decrement the checked-out connections gauge.
pub fn dec_checked_out() {
    #[cfg(feature = "metrics")]
    gauge!(CONNECTIONS_CHECKED_OUT).decrement(1.0);
}

/// Record an acquisition abandoned by its context.
pub fn inc_acquire_timeouts() {
    #[cfg(feature = "metrics")]
    counter!(ACQUIRE_TIMEOUTS).increment(1);
}

/// Record a connection factory failure.
pub fn inc_factory_errors() {
    #[cfg(feature = "metrics")]
    counter!(FACTORY_ERRORS).increment(1);
}

/// Record `bytes` uncompressed bytes handled by `compressor`.
#[cfg_attr(not(feature = "metrics"), allow(unused_variables))]
pub fn inc_compression_bytes(direction: Direction, compressor: CompressorId, bytes: usize) {
    #[cfg(feature = "metrics")]
    counter!(
        COMPRESSION_BYTES,
        "direction" => direction.as_str(),
        "compressor" => compressor.name()
    )
    .increment(u64::try_from(bytes).unwrap_or(u64::MAX));
}

/// Record a topology update dropped for a full subscriber queue.
pub fn inc_updates_dropped() {
    #[cfg(feature = "metrics")]
    counter!(MONITOR_UPDATES_DROPPED).increment(1);
}

/// Install a Prometheus recorder as the global metrics recorder.
///
/// Returns a handle whose [`render`](metrics_exporter_prometheus::PrometheusHandle::render)
/// output contains every `wireline_*` metric.
///
/// # Errors
///
/// Returns an error if a global recorder is already installed.
#[cfg(feature = "metrics")]
pub fn install_prometheus_recorder() -> Result<
    metrics_exporter_prometheus::PrometheusHandle,
    metrics_exporter_prometheus::BuildError,
> {
    metrics_exporter_prometheus::PrometheusBuilder::new().install_recorder()
}
