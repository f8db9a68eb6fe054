//! Errors raised by connection factories and the capped provider.

use std::io;

use thiserror::Error;

use crate::context::ContextError;

/// Failure reported by a [`Connection`](super::Connection) or
/// [`ConnectionFactory`](super::ConnectionFactory).
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// Transport failure.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Connecting was abandoned because the context finished.
    #[error("connect aborted: {0}")]
    Aborted(#[from] ContextError),

    /// The connection was already closed.
    #[error("connection closed")]
    Closed,

    /// Any other factory-specific failure.
    #[error(transparent)]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

impl ConnectionError {
    /// Wrap an arbitrary error.
    pub fn other(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Other(err.into())
    }
}

/// Errors returned by [`CappedProvider`](super::CappedProvider).
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Capacity must be between one and the semaphore's permit limit.
    #[error("invalid provider capacity {0}; must be between 1 and {max}", max = tokio::sync::Semaphore::MAX_PERMITS)]
    InvalidCapacity(usize),

    /// The caller's context finished before a slot became available.
    #[error("timed out waiting for a connection slot: {0}")]
    CapacityTimeout(ContextError),

    /// The factory failed; its slot was released.
    #[error("connection factory failed: {0}")]
    Factory(#[source] ConnectionError),

    /// The provider was closed.
    #[error("provider closed")]
    Closed,
}

impl ProviderError {
    /// Returns `true` when the error came from the caller's context.
    #[must_use]
    pub fn is_timeout(&self) -> bool { matches!(self, Self::CapacityTimeout(_)) }
}
