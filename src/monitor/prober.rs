//! The probing capability the monitor drives.

use std::{io, time::Duration};

use async_trait::async_trait;
use thiserror::Error;

use super::{Address, ServerKind};

/// Outcome of one successful check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProbeResult {
    /// Role the server reported.
    pub kind: ServerKind,
    /// Round-trip time measured by the prober. When `None` the monitor uses
    /// the wall-clock duration of the probe call.
    pub rtt: Option<Duration>,
}

impl ProbeResult {
    /// A result reporting `kind` with no prober-side timing.
    #[must_use]
    pub fn new(kind: ServerKind) -> Self { Self { kind, rtt: None } }
}

/// Errors a prober may report. The monitor turns them into an
/// [`Unknown`](ServerKind::Unknown) description carrying the message.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// Transport failure.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The server did not answer in time.
    #[error("server check timed out after {0:?}")]
    Timeout(Duration),

    /// The server answered with something unusable.
    #[error("invalid server response: {0}")]
    InvalidResponse(String),
}

/// Low-level observer of one server.
#[async_trait]
pub trait Prober: Send + Sync + 'static {
    /// Check the server at `address` once.
    ///
    /// # Errors
    ///
    /// Returns a [`ProbeError`] when the server cannot be checked.
    async fn probe(&self, address: &Address) -> Result<ProbeResult, ProbeError>;
}
