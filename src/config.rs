//! Transport configuration.
//!
//! [`TransportConfig`] bundles the settings of the three transport
//! components and is deserializable with serde, so it can be embedded in a
//! larger client configuration. Call [`TransportConfig::validate`] before
//! building anything from it.

use std::num::NonZeroUsize;

use serde::Deserialize;
use thiserror::Error;

use crate::{
    compression::{
        CompressionError,
        CompressionOptions,
        CompressorId,
        DEFAULT_ZLIB_LEVEL,
        DEFAULT_ZSTD_LEVEL,
    },
    monitor::MonitorConfig,
};

/// Default number of connections a provider admits.
pub const DEFAULT_MAX_CONNECTIONS: usize = 100;

/// Errors raised by [`TransportConfig::validate`],
/// [`TransportConfig::max_connections`] and [`parse_compressors`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// `max_connections` was zero.
    #[error("max_connections must be greater than zero")]
    ZeroConnections,

    /// `monitor.subscriber_capacity` was zero.
    #[error("monitor subscriber capacity must be greater than zero")]
    ZeroSubscriberCapacity,

    /// `monitor.min_heartbeat_interval` exceeds `monitor.heartbeat_interval`.
    #[error("min heartbeat interval must not exceed the heartbeat interval")]
    HeartbeatOrder,

    /// The same compressor was listed twice.
    #[error("compressor {0} listed more than once")]
    DuplicateCompressor(CompressorId),

    /// A compression setting is invalid.
    #[error(transparent)]
    Compression(#[from] CompressionError),
}

/// Settings for compression, the connection provider and the monitor.
///
/// # Default Values
/// - `compressors`: empty (no compression is negotiated)
/// - `zlib_level`: [`DEFAULT_ZLIB_LEVEL`]
/// - `zstd_level`: [`DEFAULT_ZSTD_LEVEL`]
/// - `max_connections`: [`DEFAULT_MAX_CONNECTIONS`]
/// - `monitor`: [`MonitorConfig::default`]
///
/// # Examples
///
/// ```
/// use wireline::{compression::CompressorId, config::TransportConfig};
///
/// let cfg: TransportConfig = serde_json::from_str(
///     r#"{ "compressors": ["zstd", "snappy"], "zstd_level": 3, "max_connections": 8 }"#,
/// )
/// .expect("valid json");
/// cfg.validate().expect("valid config");
///
/// assert_eq!(cfg.select_compressor(&[CompressorId::Snappy]), CompressorId::Snappy);
/// assert_eq!(cfg.max_connections().expect("non-zero").get(), 8);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TransportConfig {
    /// Compressors to offer, most preferred first.
    pub compressors: Vec<CompressorId>,
    /// zlib level, `-1` for the library default.
    pub zlib_level: i32,
    /// zstd level.
    pub zstd_level: i32,
    /// Provider capacity.
    pub max_connections: usize,
    /// Monitor settings.
    pub monitor: MonitorConfig,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            compressors: Vec::new(),
            zlib_level: DEFAULT_ZLIB_LEVEL,
            zstd_level: DEFAULT_ZSTD_LEVEL,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            monitor: MonitorConfig::default(),
        }
    }
}

impl TransportConfig {
    /// Check every setting.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.max_connections()?;
        if self.monitor.subscriber_capacity == 0 {
            return Err(ConfigError::ZeroSubscriberCapacity);
        }
        if self.monitor.min_heartbeat_interval > self.monitor.heartbeat_interval {
            return Err(ConfigError::HeartbeatOrder);
        }
        for (i, id) in self.compressors.iter().enumerate() {
            if self.compressors[..i].contains(id) {
                return Err(ConfigError::DuplicateCompressor(*id));
            }
        }
        self.compression_options(CompressorId::Noop).validate()?;
        Ok(())
    }

    /// Options for `compressor` carrying the configured levels.
    #[must_use]
    pub fn compression_options(&self, compressor: CompressorId) -> CompressionOptions {
        CompressionOptions::new(compressor)
            .with_zlib_level(self.zlib_level)
            .with_zstd_level(self.zstd_level)
    }

    /// Provider capacity.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ZeroConnections`] when `max_connections` is zero.
    pub fn max_connections(&self) -> Result<NonZeroUsize, ConfigError> {
        NonZeroUsize::new(self.max_connections).ok_or(ConfigError::ZeroConnections)
    }

    /// Pick the first configured compressor the server also supports.
    ///
    /// Returns [`CompressorId::Noop`] when nothing matches.
    #[must_use]
    pub fn select_compressor(&self, server: &[CompressorId]) -> CompressorId {
        self.compressors
            .iter()
            .copied()
            .find(|id| server.contains(id))
            .unwrap_or(CompressorId::Noop)
    }
}

/// Parse a comma separated list of compressor names.
///
/// Blank entries are skipped.
///
/// ```
/// use wireline::{compression::CompressorId, config::parse_compressors};
///
/// let ids = parse_compressors("zstd, snappy").expect("known names");
/// assert_eq!(ids, vec![CompressorId::Zstd, CompressorId::Snappy]);
/// assert!(parse_compressors("lz4").is_err());
/// ```
///
/// # Errors
///
/// Returns [`ConfigError::Compression`] for an unknown name and
/// [`ConfigError::DuplicateCompressor`] for a repeated one.
pub fn parse_compressors(list: &str) -> Result<Vec<CompressorId>, ConfigError> {
    let mut ids = Vec::new();
    for name in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let id: CompressorId = name.parse()?;
        if ids.contains(&id) {
            return Err(ConfigError::DuplicateCompressor(id));
        }
        ids.push(id);
    }
    Ok(ids)
}

/// Serde adapter for durations written as whole milliseconds.
pub(crate) mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use rstest::rstest;

    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = TransportConfig::default();
        cfg.validate().expect("defaults validate");
        let capacity = cfg.max_connections().expect("non-zero capacity");
        assert_eq!(capacity.get(), DEFAULT_MAX_CONNECTIONS);
        assert_eq!(cfg.select_compressor(&CompressorId::ALL), CompressorId::Noop);
    }

    #[test]
    fn zero_connections_is_not_replaced_by_default() {
        let cfg = TransportConfig {
            max_connections: 0,
            ..TransportConfig::default()
        };
        assert!(matches!(
            cfg.max_connections(),
            Err(ConfigError::ZeroConnections)
        ));
    }

    #[test]
    fn monitor_durations_read_as_milliseconds() {
        let cfg: TransportConfig = serde_json::from_str(
            r#"{ "monitor": { "heartbeat_interval_ms": 2000, "min_heartbeat_interval_ms": 50 } }"#,
        )
        .expect("valid json");
        assert_eq!(cfg.monitor.heartbeat_interval, Duration::from_secs(2));
        assert_eq!(cfg.monitor.min_heartbeat_interval, Duration::from_millis(50));
        assert_eq!(cfg.monitor.subscriber_capacity, 16);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let result: Result<TransportConfig, _> = serde_json::from_str(r#"{ "max_conns": 1 }"#);
        assert!(result.is_err());
    }

    #[rstest]
    #[case(TransportConfig { max_connections: 0, ..TransportConfig::default() })]
    #[case(TransportConfig { zlib_level: 10, ..TransportConfig::default() })]
    #[case(TransportConfig { zstd_level: 1000, ..TransportConfig::default() })]
    #[case(TransportConfig {
        compressors: vec![CompressorId::Zlib, CompressorId::Zlib],
        ..TransportConfig::default()
    })]
    #[case(TransportConfig {
        monitor: MonitorConfig { subscriber_capacity: 0, ..MonitorConfig::default() },
        ..TransportConfig::default()
    })]
    #[case(TransportConfig {
        monitor: MonitorConfig {
            heartbeat_interval: Duration::from_millis(10),
            min_heartbeat_interval: Duration::from_millis(20),
            ..MonitorConfig::default()
        },
        ..TransportConfig::default()
    })]
    fn invalid_settings_are_rejected(#[case] cfg: TransportConfig) {
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn selection_follows_client_preference() {
        let cfg = TransportConfig {
            compressors: vec![CompressorId::Zstd, CompressorId::Zlib],
            ..TransportConfig::default()
        };
        assert_eq!(
            cfg.select_compressor(&[CompressorId::Zlib, CompressorId::Zstd]),
            CompressorId::Zstd
        );
        assert_eq!(cfg.select_compressor(&[CompressorId::Zlib]), CompressorId::Zlib);
        assert_eq!(cfg.select_compressor(&[CompressorId::Snappy]), CompressorId::Noop);
    }

    #[test]
    fn options_carry_configured_levels() {
        let cfg = TransportConfig {
            zlib_level: 4,
            zstd_level: 9,
            ..TransportConfig::default()
        };
        let options = cfg.compression_options(CompressorId::Zstd);
        assert_eq!(options.level(), Some(9));
        assert_eq!(cfg.compression_options(CompressorId::Zlib).level(), Some(4));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        assert!(matches!(
            parse_compressors("zlib,ZLIB"),
            Err(ConfigError::DuplicateCompressor(CompressorId::Zlib))
        ));
        assert_eq!(parse_compressors(" , ").expect("empty"), Vec::new());
    }
}
