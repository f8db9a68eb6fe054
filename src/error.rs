//! Canonical error and result types for the crate.
//!
//! Each component reports its own error type. [`WirelineError`] folds them
//! together for callers that handle every transport failure in one place,
//! and [`ErrorKind`] classifies them.

use thiserror::Error;

use crate::{
    compression::CompressionError,
    config::ConfigError,
    monitor::MonitorError,
    provider::ProviderError,
};

/// Broad classification of a [`WirelineError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Invalid settings, unknown identifiers or levels.
    Configuration,
    /// A codec failed to transform a payload.
    Codec,
    /// A declared size was negative, too large or did not match.
    Framing,
    /// The caller's context ended while waiting for a connection slot.
    CapacityTimeout,
    /// The connection factory failed.
    Factory,
    /// The component was closed.
    Closed,
}

/// Top-level error type exposed by `wireline`.
#[derive(Debug, Error)]
pub enum WirelineError {
    /// Compression or decompression failed.
    #[error(transparent)]
    Compression(#[from] CompressionError),

    /// Connection acquisition failed.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// The monitor refused the request.
    #[error(transparent)]
    Monitor(#[from] MonitorError),

    /// The configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl WirelineError {
    /// Classify this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Compression(e) if e.is_framing() => ErrorKind::Framing,
            Self::Compression(e) if e.is_configuration() => ErrorKind::Configuration,
            Self::Compression(_) => ErrorKind::Codec,
            Self::Provider(ProviderError::InvalidCapacity(_)) | Self::Config(_) => {
                ErrorKind::Configuration
            }
            Self::Provider(ProviderError::CapacityTimeout(_)) => ErrorKind::CapacityTimeout,
            Self::Provider(ProviderError::Factory(_)) => ErrorKind::Factory,
            Self::Provider(ProviderError::Closed) | Self::Monitor(MonitorError::Closed) => {
                ErrorKind::Closed
            }
        }
    }
}

/// Canonical result alias used by `wireline` public APIs.
pub type Result<T> = std::result::Result<T, WirelineError>;
