//! Error types for the compression layer.
//!
//! Failures fall into three categories:
//!
//! - configuration: an unknown compressor identifier, a compressor with no registered codec, or a
//!   compression level outside the codec's range;
//! - codec: the underlying library rejected the input (corrupt stream, internal fault);
//! - framing: the decoded length disagrees with the size declared by the peer, or the declaration
//!   itself is unusable.
//!
//! Framing errors are never repaired: a short or long payload means the peer
//! and this client disagree about the message, and masking that would hide
//! truncation bugs.

use std::io;

use thiserror::Error;

use super::CompressorId;

/// Problems with the declared uncompressed size or the compressed frame
/// carrying it.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FramingError {
    /// The declared size was negative.
    #[error("declared uncompressed size {declared} is negative")]
    NegativeSize {
        /// Size carried in the frame header.
        declared: i32,
    },

    /// The declared size exceeds the largest message the wire protocol allows.
    #[error("declared uncompressed size {declared} exceeds maximum {max}")]
    OversizedDeclaration {
        /// Size carried in the frame header.
        declared: usize,
        /// Largest accepted declaration.
        max: usize,
    },

    /// The stream decoded to fewer bytes than declared, or its own header
    /// states a different length.
    #[error("decoded length mismatch: declared {declared}, actual {actual}")]
    LengthMismatch {
        /// Size carried in the frame header.
        declared: usize,
        /// Length the stream actually decodes to.
        actual: usize,
    },

    /// The stream kept producing bytes past the declared size.
    #[error("decoded payload overruns declared size {declared}")]
    Overrun {
        /// Size carried in the frame header.
        declared: usize,
    },

    /// Not enough bytes for a compressed frame header.
    #[error("incomplete compressed frame header: have {have}, need {need}")]
    IncompleteHeader {
        /// Bytes available.
        have: usize,
        /// Bytes required for the header.
        need: usize,
    },

    /// The payload is too large to be described by a frame header.
    #[error("payload of {size} bytes cannot be declared in a frame header")]
    PayloadTooLarge {
        /// Payload length in bytes.
        size: usize,
    },
}

/// Top-level compression error.
///
/// # Examples
///
/// ```
/// use wireline::compression::{CompressionError, CompressorId, FramingError};
///
/// let err = CompressionError::from(FramingError::Overrun { declared: 100 });
/// assert_eq!(err.error_type(), "framing");
///
/// let err = CompressionError::InvalidLevel {
///     compressor: CompressorId::Zlib,
///     level: 42,
///     min: -1,
///     max: 9,
/// };
/// assert!(err.is_configuration());
/// ```
#[derive(Debug, Error)]
pub enum CompressionError {
    /// The compressor byte does not name a known algorithm.
    #[error("unknown compressor id: {0}")]
    UnknownCompressor(u8),

    /// The compressor name does not name a known algorithm.
    #[error("unknown compressor name: {0:?}")]
    UnknownCompressorName(String),

    /// The registry has no codec for a known compressor.
    #[error("no codec registered for {0}")]
    Unregistered(CompressorId),

    /// The configured level is outside the codec's supported range.
    #[error("{compressor} level {level} outside supported range {min}..={max}")]
    InvalidLevel {
        /// Compressor the level was configured for.
        compressor: CompressorId,
        /// Rejected level.
        level: i32,
        /// Lowest supported level.
        min: i32,
        /// Highest supported level.
        max: i32,
    },

    /// The codec library failed.
    #[error("{compressor} codec failed: {source}")]
    Codec {
        /// Compressor whose codec failed.
        compressor: CompressorId,
        /// Underlying library error.
        #[source]
        source: io::Error,
    },

    /// Declared size or frame structure problem.
    #[error("framing error: {0}")]
    Framing(#[from] FramingError),
}

impl CompressionError {
    pub(crate) fn codec(compressor: CompressorId, source: impl Into<io::Error>) -> Self {
        Self::Codec {
            compressor,
            source: source.into(),
        }
    }

    /// Returns `true` for configuration errors (unknown compressor,
    /// unregistered codec, invalid level).
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::UnknownCompressor(_)
                | Self::UnknownCompressorName(_)
                | Self::Unregistered(_)
                | Self::InvalidLevel { .. }
        )
    }

    /// Returns `true` when the decoded length disagreed with the declaration.
    #[must_use]
    pub fn is_framing(&self) -> bool { matches!(self, Self::Framing(_)) }

    /// Returns the error category for logging and metrics.
    ///
    /// One of `"configuration"`, `"codec"` or `"framing"`.
    #[must_use]
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Codec { .. } => "codec",
            Self::Framing(_) => "framing",
            _ => "configuration",
        }
    }
}

impl From<CompressionError> for io::Error {
    fn from(err: CompressionError) -> Self {
        match err {
            CompressionError::Codec { source, .. } => source,
            other => io::Error::new(io::ErrorKind::InvalidData, other),
        }
    }
}
