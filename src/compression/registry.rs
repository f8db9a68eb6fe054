//! Codec capability and the registry mapping identifiers to codecs.

use std::{collections::HashMap, fmt, sync::Arc};

use super::{
    CompressionError,
    CompressorId,
    codecs::{NoopCodec, SnappyCodec, ZlibCodec, ZstdCodec},
};

/// A compression algorithm.
///
/// Implementations must be stateless between calls: the engine shares one
/// instance across every thread.
pub trait Codec: Send + Sync {
    /// Identifier this codec handles.
    fn id(&self) -> CompressorId;

    /// Compress `src`, applying `level` when the algorithm has levels.
    ///
    /// # Errors
    ///
    /// Returns [`CompressionError::InvalidLevel`] for an unsupported level or
    /// [`CompressionError::Codec`] when the library fails.
    fn compress(&self, src: &[u8], level: Option<i32>) -> Result<Vec<u8>, CompressionError>;

    /// Decompress `src`, which the peer claims expands to `declared` bytes.
    ///
    /// Implementations must not allocate or return more than `declared + 1`
    /// bytes; the extra byte lets the caller detect an overrun without
    /// decoding the rest of the stream.
    ///
    /// # Errors
    ///
    /// Returns [`CompressionError::Codec`] for corrupt input, or
    /// [`CompressionError::Framing`] when the stream itself states a length
    /// other than `declared`.
    fn decompress(&self, src: &[u8], declared: usize) -> Result<Vec<u8>, CompressionError>;
}

/// Lookup table from [`CompressorId`] to [`Codec`].
///
/// The default registry contains the four built-in codecs. Tests and
/// embedders may start from [`CodecRegistry::empty`] and register
/// substitutes.
#[derive(Clone)]
pub struct CodecRegistry {
    codecs: HashMap<CompressorId, Arc<dyn Codec>>,
}

impl Default for CodecRegistry {
    fn default() -> Self {
        Self::empty()
            .with(NoopCodec)
            .with(SnappyCodec)
            .with(ZlibCodec)
            .with(ZstdCodec)
    }
}

impl CodecRegistry {
    /// A registry with no codecs.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            codecs: HashMap::new(),
        }
    }

    /// Register `codec`, replacing any codec with the same identifier.
    pub fn register(&mut self, codec: impl Codec + 'static) {
        self.codecs.insert(codec.id(), Arc::new(codec));
    }

    /// Builder form of [`CodecRegistry::register`].
    #[must_use]
    pub fn with(mut self, codec: impl Codec + 'static) -> Self {
        self.register(codec);
        self
    }

    /// The codec registered for `id`.
    #[must_use]
    pub fn get(&self, id: CompressorId) -> Option<&Arc<dyn Codec>> { self.codecs.get(&id) }

    /// The codec registered for `id`, or a configuration error.
    ///
    /// # Errors
    ///
    /// Returns [`CompressionError::Unregistered`] when no codec handles `id`.
    pub fn require(&self, id: CompressorId) -> Result<&Arc<dyn Codec>, CompressionError> {
        self.get(id).ok_or(CompressionError::Unregistered(id))
    }

    /// Identifiers with a registered codec, in wire order.
    #[must_use]
    pub fn supported(&self) -> Vec<CompressorId> {
        CompressorId::ALL
            .into_iter()
            .filter(|id| self.codecs.contains_key(id))
            .collect()
    }
}

impl fmt::Debug for CodecRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodecRegistry")
            .field("supported", &self.supported())
            .finish()
    }
}
