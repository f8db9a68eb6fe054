//! Payload compression for the wire protocol.
//!
//! Outgoing message bodies are compressed with one of the algorithms a server
//! advertised, and incoming `OP_COMPRESSED` bodies are unwrapped again. The
//! uncompressed size travelling with a compressed body is supplied by the peer
//! and is treated as an untrusted upper bound: decoding never allocates more
//! than the declared size (itself capped at [`MAX_DECLARED_SIZE`]) and any
//! disagreement between declared and decoded length is a
//! [`FramingError`].
//!
//! ```
//! use wireline::compression::{
//!     CompressionOptions,
//!     CompressorId,
//!     compress_payload,
//!     decompress_payload,
//! };
//!
//! let payload = b"Lorem ipsum dolor sit amet, consectetur adipiscing elit";
//! let options = CompressionOptions::new(CompressorId::Zstd)
//!     .with_uncompressed_size(payload.len() as i32);
//! let compressed = compress_payload(payload, &options)?;
//! assert_eq!(decompress_payload(&compressed, &options)?, payload);
//! # Ok::<(), wireline::compression::CompressionError>(())
//! ```

mod codecs;
mod engine;
mod error;
mod frame;
mod registry;

use std::{fmt, str::FromStr};

pub use codecs::{NoopCodec, SnappyCodec, ZlibCodec, ZstdCodec};
pub use engine::{CompressionEngine, default_engine};
pub use error::{CompressionError, FramingError};
pub use frame::{COMPRESSED_HEADER_LEN, CompressedFrame, OP_COMPRESSED};
pub use registry::{Codec, CodecRegistry};
use serde::{Deserialize, Serialize};
use static_assertions::const_assert;

/// Sentinel selecting the zlib library's default level.
pub const DEFAULT_ZLIB_LEVEL: i32 = -1;
/// Lowest accepted zlib level (the default sentinel).
pub const MIN_ZLIB_LEVEL: i32 = -1;
/// Highest accepted zlib level.
pub const MAX_ZLIB_LEVEL: i32 = 9;
/// Default zstd level when none is configured.
pub const DEFAULT_ZSTD_LEVEL: i32 = 6;
/// Largest uncompressed size a peer may declare (the maximum wire message
/// size).
pub const MAX_DECLARED_SIZE: usize = 48_000_000;

const_assert!(DEFAULT_ZLIB_LEVEL >= MIN_ZLIB_LEVEL && DEFAULT_ZLIB_LEVEL <= MAX_ZLIB_LEVEL);
const_assert!(DEFAULT_ZSTD_LEVEL >= 1 && DEFAULT_ZSTD_LEVEL <= 22);

/// Compression algorithm identifier, numbered as on the wire.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressorId {
    /// Identity pass-through.
    Noop = 0,
    /// Raw (block) snappy.
    Snappy = 1,
    /// zlib stream.
    Zlib = 2,
    /// Zstandard frame.
    Zstd = 3,
}

impl CompressorId {
    /// Every supported compressor, in wire order.
    pub const ALL: [CompressorId; 4] = [Self::Noop, Self::Snappy, Self::Zlib, Self::Zstd];

    /// The wire value of this identifier.
    #[must_use]
    pub fn as_u8(self) -> u8 { self as u8 }

    /// The lowercase name used in configuration and handshakes.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Noop => "noop",
            Self::Snappy => "snappy",
            Self::Zlib => "zlib",
            Self::Zstd => "zstd",
        }
    }
}

impl TryFrom<u8> for CompressorId {
    type Error = CompressionError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|id| id.as_u8() == value)
            .ok_or(CompressionError::UnknownCompressor(value))
    }
}

impl FromStr for CompressorId {
    type Err = CompressionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|id| id.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| CompressionError::UnknownCompressorName(wanted.to_owned()))
    }
}

impl fmt::Display for CompressorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.name()) }
}

/// Per-call compression settings.
///
/// `uncompressed_size` is only consulted when decompressing, where it is the
/// size declared by the peer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CompressionOptions {
    /// Algorithm to apply.
    pub compressor: CompressorId,
    /// zlib level; [`DEFAULT_ZLIB_LEVEL`] selects the library default.
    pub zlib_level: i32,
    /// zstd level; defaults to [`DEFAULT_ZSTD_LEVEL`].
    pub zstd_level: i32,
    /// Declared original length of a compressed payload.
    pub uncompressed_size: i32,
}

impl Default for CompressionOptions {
    fn default() -> Self { Self::new(CompressorId::Noop) }
}

impl CompressionOptions {
    /// Options for `compressor` with default levels and no declared size.
    #[must_use]
    pub fn new(compressor: CompressorId) -> Self {
        Self {
            compressor,
            zlib_level: DEFAULT_ZLIB_LEVEL,
            zstd_level: DEFAULT_ZSTD_LEVEL,
            uncompressed_size: 0,
        }
    }

    /// Set the zlib level.
    #[must_use]
    pub fn with_zlib_level(mut self, level: i32) -> Self {
        self.zlib_level = level;
        self
    }

    /// Set the zstd level.
    #[must_use]
    pub fn with_zstd_level(mut self, level: i32) -> Self {
        self.zstd_level = level;
        self
    }

    /// Set the declared uncompressed size.
    #[must_use]
    pub fn with_uncompressed_size(mut self, size: i32) -> Self {
        self.uncompressed_size = size;
        self
    }

    /// Check both configured levels against the built-in codecs' ranges.
    ///
    /// # Errors
    ///
    /// Returns [`CompressionError::InvalidLevel`] for the first level out of
    /// range.
    pub fn validate(&self) -> Result<(), CompressionError> {
        codecs::zlib_level(Some(self.zlib_level))?;
        codecs::zstd_level(Some(self.zstd_level))?;
        Ok(())
    }

    /// The level passed to the selected codec, if it takes one.
    #[must_use]
    pub fn level(&self) -> Option<i32> {
        match self.compressor {
            CompressorId::Zlib => Some(self.zlib_level),
            CompressorId::Zstd => Some(self.zstd_level),
            CompressorId::Noop | CompressorId::Snappy => None,
        }
    }
}

/// Compress `payload` with the default engine.
///
/// # Errors
///
/// Returns [`CompressionError::InvalidLevel`] for an out-of-range level and
/// [`CompressionError::Codec`] if the codec fails.
pub fn compress_payload(
    payload: &[u8],
    options: &CompressionOptions,
) -> Result<Vec<u8>, CompressionError> {
    default_engine().compress(payload, options)
}

/// Decompress `compressed` with the default engine, verifying the declared
/// size in `options`.
///
/// # Errors
///
/// Returns [`CompressionError::Framing`] when the decoded length differs from
/// `options.uncompressed_size` or the declaration is unusable, and
/// [`CompressionError::Codec`] for corrupt input.
pub fn decompress_payload(
    compressed: &[u8],
    options: &CompressionOptions,
) -> Result<Vec<u8>, CompressionError> {
    default_engine().decompress(compressed, options)
}

#[cfg(test)]
mod tests;
