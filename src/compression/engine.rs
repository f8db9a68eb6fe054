//! Codec selection and declared-size verification.

use std::{
    cmp::Ordering,
    sync::{Arc, OnceLock},
};

use tracing::trace;

use super::{
    CodecRegistry,
    CompressionError,
    CompressionOptions,
    FramingError,
    MAX_DECLARED_SIZE,
};
use crate::metrics::{self, Direction};

/// Stateless compression front end over a [`CodecRegistry`].
///
/// Cloning is cheap and clones share the registry. Every method takes `&self`
/// and touches no mutable state, so one engine serves any number of threads.
///
/// # Examples
///
/// ```
/// use wireline::compression::{CompressionEngine, CompressionOptions, CompressorId};
///
/// let engine = CompressionEngine::new();
/// let options = CompressionOptions::new(CompressorId::Snappy).with_uncompressed_size(200);
/// let compressed = engine.compress(&[0u8; 200], &options)?;
///
/// let short = options.with_uncompressed_size(100);
/// assert!(engine.decompress(&compressed, &short).is_err());
/// # Ok::<(), wireline::compression::CompressionError>(())
/// ```
#[derive(Clone, Debug, Default)]
pub struct CompressionEngine {
    registry: Arc<CodecRegistry>,
}

impl CompressionEngine {
    /// An engine over the built-in codecs.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// An engine over a caller-supplied registry.
    #[must_use]
    pub fn with_registry(registry: CodecRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    /// The registry backing this engine.
    #[must_use]
    pub fn registry(&self) -> &CodecRegistry { &self.registry }

    /// Compress `payload` with the compressor selected in `options`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the compressor has no codec or its
    /// level is out of range, and [`CompressionError::Codec`] if the codec
    /// fails.
    pub fn compress(
        &self,
        payload: &[u8],
        options: &CompressionOptions,
    ) -> Result<Vec<u8>, CompressionError> {
        let compressor = options.compressor;
        let codec = self.registry.require(compressor)?;
        let compressed = codec.compress(payload, options.level())?;
        trace!(
            %compressor,
            input = payload.len(),
            output = compressed.len(),
            "payload compressed"
        );
        metrics::inc_compression_bytes(Direction::Compress, compressor, payload.len());
        Ok(compressed)
    }

    /// Decompress `compressed`, requiring it to expand to exactly
    /// `options.uncompressed_size` bytes.
    ///
    /// The declared size bounds every allocation made while decoding, so a
    /// peer cannot make the engine reserve more than [`MAX_DECLARED_SIZE`]
    /// bytes, nor more than the stream really holds plus one byte.
    ///
    /// # Errors
    ///
    /// Returns [`CompressionError::Framing`] for negative or oversized
    /// declarations and for any mismatch between declared and decoded
    /// length, [`CompressionError::Codec`] for corrupt input, and a
    /// configuration error when the compressor has no codec.
    pub fn decompress(
        &self,
        compressed: &[u8],
        options: &CompressionOptions,
    ) -> Result<Vec<u8>, CompressionError> {
        let compressor = options.compressor;
        let declared = declared_size(options.uncompressed_size)?;
        let codec = self.registry.require(compressor)?;
        let decoded = codec.decompress(compressed, declared)?;
        match decoded.len().cmp(&declared) {
            Ordering::Equal => {}
            Ordering::Greater => return Err(FramingError::Overrun { declared }.into()),
            Ordering::Less => {
                return Err(FramingError::LengthMismatch {
                    declared,
                    actual: decoded.len(),
                }
                .into());
            }
        }
        trace!(
            %compressor,
            input = compressed.len(),
            output = decoded.len(),
            "payload decompressed"
        );
        metrics::inc_compression_bytes(Direction::Decompress, compressor, decoded.len());
        Ok(decoded)
    }
}

/// Validate a peer-declared size before it is used as an allocation bound.
fn declared_size(declared: i32) -> Result<usize, FramingError> {
    let size = usize::try_from(declared).map_err(|_| FramingError::NegativeSize { declared })?;
    if size > MAX_DECLARED_SIZE {
        return Err(FramingError::OversizedDeclaration {
            declared: size,
            max: MAX_DECLARED_SIZE,
        });
    }
    Ok(size)
}

/// Process-wide engine over the built-in codecs.
pub fn default_engine() -> &'static CompressionEngine {
    static ENGINE: OnceLock<CompressionEngine> = OnceLock::new();
    ENGINE.get_or_init(CompressionEngine::new)
}
