//! Built-in codecs: no-op, snappy, zlib and zstd.
//!
//! Stream-oriented decoders read through [`read_bounded`], which caps output
//! at one byte past the declared size. Snappy carries its decoded length in a
//! varint header, so it is checked against the declaration before any buffer
//! is allocated.

use std::io::{self, Read, Write};

use flate2::{Compression, read::ZlibDecoder, write::ZlibEncoder};

use super::{
    CompressionError,
    CompressorId,
    FramingError,
    MAX_ZLIB_LEVEL,
    MIN_ZLIB_LEVEL,
    registry::Codec,
};

// Initial buffer size for stream decoders; the buffer grows as data arrives.
const INITIAL_DECODE_CAPACITY: usize = 64 * 1024;

/// Read at most `declared + 1` bytes from `reader`.
fn read_bounded<R: Read>(reader: R, declared: usize) -> io::Result<Vec<u8>> {
    let limit = u64::try_from(declared).map_or(u64::MAX, |d| d.saturating_add(1));
    let mut out = Vec::with_capacity(declared.min(INITIAL_DECODE_CAPACITY));
    reader.take(limit).read_to_end(&mut out)?;
    Ok(out)
}

pub(super) fn zlib_level(level: Option<i32>) -> Result<Compression, CompressionError> {
    match level {
        None | Some(-1) => Ok(Compression::default()),
        Some(l @ 0..=MAX_ZLIB_LEVEL) => Ok(Compression::new(l.unsigned_abs())),
        Some(other) => Err(CompressionError::InvalidLevel {
            compressor: CompressorId::Zlib,
            level: other,
            min: MIN_ZLIB_LEVEL,
            max: MAX_ZLIB_LEVEL,
        }),
    }
}

pub(super) fn zstd_level(level: Option<i32>) -> Result<i32, CompressionError> {
    let level = level.unwrap_or(super::DEFAULT_ZSTD_LEVEL);
    let range = zstd::compression_level_range();
    if range.contains(&level) {
        Ok(level)
    } else {
        Err(CompressionError::InvalidLevel {
            compressor: CompressorId::Zstd,
            level,
            min: *range.start(),
            max: *range.end(),
        })
    }
}

/// Identity codec.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopCodec;

impl Codec for NoopCodec {
    fn id(&self) -> CompressorId { CompressorId::Noop }

    fn compress(&self, src: &[u8], _level: Option<i32>) -> Result<Vec<u8>, CompressionError> {
        Ok(src.to_vec())
    }

    fn decompress(&self, src: &[u8], _declared: usize) -> Result<Vec<u8>, CompressionError> {
        Ok(src.to_vec())
    }
}

/// Raw snappy codec. Snappy has no levels.
#[derive(Clone, Copy, Debug, Default)]
pub struct SnappyCodec;

impl SnappyCodec {
    fn error(err: snap::Error) -> CompressionError {
        CompressionError::codec(
            CompressorId::Snappy,
            io::Error::new(io::ErrorKind::InvalidData, err),
        )
    }
}

impl Codec for SnappyCodec {
    fn id(&self) -> CompressorId { CompressorId::Snappy }

    fn compress(&self, src: &[u8], _level: Option<i32>) -> Result<Vec<u8>, CompressionError> {
        snap::raw::Encoder::new()
            .compress_vec(src)
            .map_err(Self::error)
    }

    fn decompress(&self, src: &[u8], declared: usize) -> Result<Vec<u8>, CompressionError> {
        let actual = snap::raw::decompress_len(src).map_err(Self::error)?;
        if actual != declared {
            return Err(FramingError::LengthMismatch { declared, actual }.into());
        }
        snap::raw::Decoder::new()
            .decompress_vec(src)
            .map_err(Self::error)
    }
}

/// zlib codec. Levels `0..=9`, `-1` for the library default.
#[derive(Clone, Copy, Debug, Default)]
pub struct ZlibCodec;

impl Codec for ZlibCodec {
    fn id(&self) -> CompressorId { CompressorId::Zlib }

    fn compress(&self, src: &[u8], level: Option<i32>) -> Result<Vec<u8>, CompressionError> {
        let level = zlib_level(level)?;
        let mut encoder = ZlibEncoder::new(Vec::with_capacity(src.len() / 2 + 16), level);
        encoder
            .write_all(src)
            .map_err(|e| CompressionError::codec(CompressorId::Zlib, e))?;
        encoder
            .finish()
            .map_err(|e| CompressionError::codec(CompressorId::Zlib, e))
    }

    fn decompress(&self, src: &[u8], declared: usize) -> Result<Vec<u8>, CompressionError> {
        read_bounded(ZlibDecoder::new(src), declared)
            .map_err(|e| CompressionError::codec(CompressorId::Zlib, e))
    }
}

/// Zstandard codec. Accepts any level the linked library supports.
#[derive(Clone, Copy, Debug, Default)]
pub struct ZstdCodec;

impl Codec for ZstdCodec {
    fn id(&self) -> CompressorId { CompressorId::Zstd }

    fn compress(&self, src: &[u8], level: Option<i32>) -> Result<Vec<u8>, CompressionError> {
        let level = zstd_level(level)?;
        zstd::bulk::compress(src, level).map_err(|e| CompressionError::codec(CompressorId::Zstd, e))
    }

    fn decompress(&self, src: &[u8], declared: usize) -> Result<Vec<u8>, CompressionError> {
        let decoder = zstd::stream::read::Decoder::with_buffer(src)
            .map_err(|e| CompressionError::codec(CompressorId::Zstd, e))?;
        read_bounded(decoder, declared).map_err(|e| CompressionError::codec(CompressorId::Zstd, e))
    }
}
