//! `OP_COMPRESSED` message body.
//!
//! Layout, little-endian:
//!
//! ```text
//! original_opcode: i32 | uncompressed_size: i32 | compressor_id: u8 | compressed bytes
//! ```
//!
//! The standard 16-byte message header precedes this body on the wire and is
//! handled by the caller.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use super::{
    CompressionEngine,
    CompressionError,
    CompressionOptions,
    CompressorId,
    FramingError,
};

/// Opcode of a compressed wire message.
pub const OP_COMPRESSED: i32 = 2012;
/// Length of the fixed part of an `OP_COMPRESSED` body.
pub const COMPRESSED_HEADER_LEN: usize = 9;

/// A compressed message body together with its declared size.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompressedFrame {
    /// Opcode of the wrapped message.
    pub original_opcode: i32,
    /// Size the payload claims to expand to. Untrusted when decoded.
    pub uncompressed_size: i32,
    /// Algorithm used for `payload`.
    pub compressor: CompressorId,
    /// Compressed bytes.
    pub payload: Bytes,
}

impl CompressedFrame {
    /// Compress `message` into a frame.
    ///
    /// The declared size is taken from `message.len()`; any size already set
    /// in `options` is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`FramingError::PayloadTooLarge`] if the length does not fit
    /// the header, and any error from [`CompressionEngine::compress`].
    pub fn compress(
        engine: &CompressionEngine,
        original_opcode: i32,
        message: &[u8],
        options: CompressionOptions,
    ) -> Result<Self, CompressionError> {
        let size = i32::try_from(message.len()).map_err(|_| FramingError::PayloadTooLarge {
            size: message.len(),
        })?;
        let options = options.with_uncompressed_size(size);
        let compressed = engine.compress(message, &options)?;
        Ok(Self {
            original_opcode,
            uncompressed_size: size,
            compressor: options.compressor,
            payload: Bytes::from(compressed),
        })
    }

    /// Options describing this frame for [`CompressionEngine::decompress`].
    #[must_use]
    pub fn options(&self) -> CompressionOptions {
        CompressionOptions::new(self.compressor).with_uncompressed_size(self.uncompressed_size)
    }

    /// Decompress the payload, verifying it against the declared size.
    ///
    /// # Errors
    ///
    /// See [`CompressionEngine::decompress`].
    pub fn decompress(&self, engine: &CompressionEngine) -> Result<Vec<u8>, CompressionError> {
        engine.decompress(&self.payload, &self.options())
    }

    /// Number of bytes [`CompressedFrame::encode`] writes.
    #[must_use]
    pub fn encoded_len(&self) -> usize { COMPRESSED_HEADER_LEN + self.payload.len() }

    /// Append the body to `dst`.
    pub fn encode(&self, dst: &mut BytesMut) {
        dst.reserve(self.encoded_len());
        dst.put_i32_le(self.original_opcode);
        dst.put_i32_le(self.uncompressed_size);
        dst.put_u8(self.compressor.as_u8());
        dst.put_slice(&self.payload);
    }

    /// Parse a body. The payload shares `src`'s allocation.
    ///
    /// Only the structure is checked here; the declared size is validated by
    /// [`CompressedFrame::decompress`].
    ///
    /// # Errors
    ///
    /// Returns [`FramingError::IncompleteHeader`] for a short body and
    /// [`CompressionError::UnknownCompressor`] for an unknown compressor byte.
    pub fn decode(mut src: Bytes) -> Result<Self, CompressionError> {
        if src.len() < COMPRESSED_HEADER_LEN {
            return Err(FramingError::IncompleteHeader {
                have: src.len(),
                need: COMPRESSED_HEADER_LEN,
            }
            .into());
        }
        let original_opcode = src.get_i32_le();
        let uncompressed_size = src.get_i32_le();
        let compressor = CompressorId::try_from(src.get_u8())?;
        Ok(Self {
            original_opcode,
            uncompressed_size,
            compressor,
            payload: src,
        })
    }
}
