//! Server descriptions published by the monitor.

use std::{fmt, time::Duration};

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

/// Weight of the newest round-trip sample in the moving average.
const RTT_ALPHA: f64 = 0.2;

/// Canonical `host:port` server address.
///
/// Hosts are lowercased and a missing port defaults to
/// [`Address::DEFAULT_PORT`]. Unix socket paths are kept as given.
///
/// ```
/// use wireline::monitor::Address;
///
/// assert_eq!(Address::new("LocalHost").as_str(), "localhost:27017");
/// assert_eq!(Address::new("[::1]:27018").port(), Some(27018));
/// assert_eq!(Address::new("/tmp/mongodb-27017.sock").port(), None);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Address(String);

impl Address {
    /// Port assumed when none is given.
    pub const DEFAULT_PORT: u16 = 27017;

    /// Canonicalize `addr`.
    #[must_use]
    pub fn new(addr: impl AsRef<str>) -> Self {
        let raw = addr.as_ref().trim();
        if raw.ends_with(".sock") {
            return Self(raw.to_owned());
        }
        let lowered = raw.to_ascii_lowercase();
        if split_port(&lowered).is_some() {
            Self(lowered)
        } else {
            Self(format!("{lowered}:{}", Self::DEFAULT_PORT))
        }
    }

    /// The canonical string form.
    #[must_use]
    pub fn as_str(&self) -> &str { &self.0 }

    /// Host part, or the whole path for Unix sockets.
    #[must_use]
    pub fn host(&self) -> &str { split_port(&self.0).map_or(self.0.as_str(), |(host, _)| host) }

    /// Port, or `None` for Unix sockets.
    #[must_use]
    pub fn port(&self) -> Option<u16> { split_port(&self.0).map(|(_, port)| port) }
}

fn split_port(addr: &str) -> Option<(&str, u16)> {
    let (host, port) = addr.rsplit_once(':')?;
    let port = port.parse().ok()?;
    // Bare IPv6 literals contain colons of their own and need brackets.
    if host.contains(':') && !(host.starts_with('[') && host.ends_with(']')) {
        return None;
    }
    Some((host, port))
}

impl From<&str> for Address {
    fn from(value: &str) -> Self { Self::new(value) }
}

impl From<String> for Address {
    fn from(value: String) -> Self { Self::new(value) }
}

impl From<Address> for String {
    fn from(value: Address) -> Self { value.0 }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

/// Role a server reported in its last check.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServerKind {
    /// Not yet checked, or the last check failed.
    #[default]
    Unknown,
    /// Standalone server.
    Standalone,
    /// Sharded cluster router.
    Mongos,
    /// Replica set primary.
    RsPrimary,
    /// Replica set secondary.
    RsSecondary,
    /// Replica set arbiter.
    RsArbiter,
    /// Replica set member in another state.
    RsMember,
    /// Replica set member without configuration.
    RsGhost,
}

impl ServerKind {
    /// Returns `true` if the server can accept writes.
    #[must_use]
    pub fn is_writable(self) -> bool {
        matches!(self, Self::Standalone | Self::Mongos | Self::RsPrimary)
    }

    /// Returns `true` if the server can serve reads.
    #[must_use]
    pub fn is_data_bearing(self) -> bool { self.is_writable() || self == Self::RsSecondary }
}

impl fmt::Display for ServerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unknown => "Unknown",
            Self::Standalone => "Standalone",
            Self::Mongos => "Mongos",
            Self::RsPrimary => "RSPrimary",
            Self::RsSecondary => "RSSecondary",
            Self::RsArbiter => "RSArbiter",
            Self::RsMember => "RSMember",
            Self::RsGhost => "RSGhost",
        };
        f.write_str(name)
    }
}

/// Snapshot of one server's observed state.
#[derive(Clone, Debug, PartialEq)]
pub struct ServerDescription {
    /// Server this description belongs to.
    pub address: Address,
    /// Role reported by the last check.
    pub kind: ServerKind,
    /// Moving average of round-trip times, if any check succeeded.
    pub average_rtt: Option<Duration>,
    /// Error from the last check, if it failed.
    pub last_error: Option<String>,
    /// When the observation was made.
    pub observed_at: Instant,
}

impl ServerDescription {
    /// A description for a server that has not answered.
    #[must_use]
    pub fn unknown(address: Address) -> Self {
        Self {
            address,
            kind: ServerKind::Unknown,
            average_rtt: None,
            last_error: None,
            observed_at: Instant::now(),
        }
    }

    /// A description for a successful check.
    #[must_use]
    pub fn new(address: Address, kind: ServerKind, rtt: Option<Duration>) -> Self {
        Self {
            kind,
            average_rtt: rtt,
            ..Self::unknown(address)
        }
    }

    /// Attach the error of a failed check.
    #[must_use]
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.last_error = Some(error.into());
        self
    }

    /// Fold the previous average into this description's round-trip time.
    pub(crate) fn smooth_rtt(&mut self, previous: Option<Duration>) {
        if let (Some(previous), Some(sample)) = (previous, self.average_rtt) {
            self.average_rtt =
                Some(sample.mul_f64(RTT_ALPHA) + previous.mul_f64(1.0 - RTT_ALPHA));
        }
    }
}
