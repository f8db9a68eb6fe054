//! Unit tests for codec selection, identifiers and frame parsing.

use bytes::{BufMut, Bytes, BytesMut};
use rstest::rstest;

use super::*;

/// Codec that ignores the declared size and always yields `len` bytes.
struct FixedLengthCodec {
    len: usize,
}

impl Codec for FixedLengthCodec {
    fn id(&self) -> CompressorId { CompressorId::Zstd }

    fn compress(&self, src: &[u8], _level: Option<i32>) -> Result<Vec<u8>, CompressionError> {
        Ok(src.to_vec())
    }

    fn decompress(&self, _src: &[u8], _declared: usize) -> Result<Vec<u8>, CompressionError> {
        Ok(vec![0; self.len])
    }
}

#[rstest]
#[case(0, CompressorId::Noop)]
#[case(1, CompressorId::Snappy)]
#[case(2, CompressorId::Zlib)]
#[case(3, CompressorId::Zstd)]
fn compressor_ids_follow_wire_values(#[case] raw: u8, #[case] expected: CompressorId) {
    assert_eq!(CompressorId::try_from(raw).expect("known id"), expected);
    assert_eq!(expected.as_u8(), raw);
}

#[test]
fn unknown_compressor_byte_is_rejected() {
    let err = CompressorId::try_from(9).expect_err("unknown id");
    assert!(matches!(err, CompressionError::UnknownCompressor(9)));
    assert!(err.is_configuration());
}

#[rstest]
#[case("snappy", CompressorId::Snappy)]
#[case(" ZLIB ", CompressorId::Zlib)]
#[case("zstd", CompressorId::Zstd)]
#[case("noop", CompressorId::Noop)]
fn compressor_names_parse(#[case] name: &str, #[case] expected: CompressorId) {
    assert_eq!(name.parse::<CompressorId>().expect("known name"), expected);
}

#[test]
fn unknown_compressor_name_is_rejected() {
    let err = "lz4".parse::<CompressorId>().expect_err("unknown name");
    assert!(matches!(err, CompressionError::UnknownCompressorName(ref n) if n == "lz4"));
}

#[test]
fn level_is_only_passed_to_levelled_codecs() {
    let base = CompressionOptions::default()
        .with_zlib_level(3)
        .with_zstd_level(9);
    assert_eq!(
        CompressionOptions {
            compressor: CompressorId::Zlib,
            ..base
        }
        .level(),
        Some(3)
    );
    assert_eq!(
        CompressionOptions {
            compressor: CompressorId::Zstd,
            ..base
        }
        .level(),
        Some(9)
    );
    assert_eq!(base.level(), None);
}

#[test]
fn options_validate_levels() {
    assert!(CompressionOptions::default().validate().is_ok());
    let err = CompressionOptions::default()
        .with_zlib_level(11)
        .validate()
        .expect_err("zlib level 11 is invalid");
    assert!(matches!(
        err,
        CompressionError::InvalidLevel {
            compressor: CompressorId::Zlib,
            level: 11,
            ..
        }
    ));
}

#[test]
fn empty_registry_reports_unregistered_compressor() {
    let engine = CompressionEngine::with_registry(CodecRegistry::empty());
    let err = engine
        .compress(b"abc", &CompressionOptions::new(CompressorId::Snappy))
        .expect_err("no codecs registered");
    assert!(matches!(
        err,
        CompressionError::Unregistered(CompressorId::Snappy)
    ));
}

#[test]
fn default_registry_supports_every_compressor() {
    assert_eq!(CodecRegistry::default().supported(), CompressorId::ALL.to_vec());
}

#[rstest]
#[case::overrun(11, true)]
#[case::short(9, false)]
fn engine_checks_codec_output_against_declaration(#[case] len: usize, #[case] overrun: bool) {
    let engine =
        CompressionEngine::with_registry(CodecRegistry::empty().with(FixedLengthCodec { len }));
    let options = CompressionOptions::new(CompressorId::Zstd).with_uncompressed_size(10);
    let err = engine
        .decompress(b"ignored", &options)
        .expect_err("length mismatch must fail");
    if overrun {
        assert!(matches!(
            err,
            CompressionError::Framing(FramingError::Overrun { declared: 10 })
        ));
    } else {
        assert!(matches!(
            err,
            CompressionError::Framing(FramingError::LengthMismatch {
                declared: 10,
                actual: 9
            })
        ));
    }
}

#[test]
fn negative_declaration_is_rejected_before_decoding() {
    let options = CompressionOptions::new(CompressorId::Zlib).with_uncompressed_size(-1);
    let err = decompress_payload(b"", &options).expect_err("negative size");
    assert!(matches!(
        err,
        CompressionError::Framing(FramingError::NegativeSize { declared: -1 })
    ));
}

#[test]
fn oversized_declaration_is_rejected_before_decoding() {
    let options = CompressionOptions::new(CompressorId::Zstd).with_uncompressed_size(i32::MAX);
    let err = decompress_payload(b"", &options).expect_err("oversized declaration");
    assert!(matches!(
        err,
        CompressionError::Framing(FramingError::OversizedDeclaration { .. })
    ));
}

#[test]
fn frame_decode_rejects_short_header() {
    let err = CompressedFrame::decode(Bytes::from_static(&[1, 2, 3])).expect_err("short");
    assert!(matches!(
        err,
        CompressionError::Framing(FramingError::IncompleteHeader { have: 3, need: 9 })
    ));
}

#[test]
fn frame_decode_rejects_unknown_compressor() {
    let mut buf = BytesMut::new();
    buf.put_i32_le(2013);
    buf.put_i32_le(4);
    buf.put_u8(42);
    buf.put_slice(b"data");
    let err = CompressedFrame::decode(buf.freeze()).expect_err("unknown compressor");
    assert!(matches!(err, CompressionError::UnknownCompressor(42)));
}

#[test]
fn frame_encodes_header_fields_little_endian() {
    let frame = CompressedFrame {
        original_opcode: 2013,
        uncompressed_size: 5,
        compressor: CompressorId::Noop,
        payload: Bytes::from_static(b"hello"),
    };
    let mut buf = BytesMut::new();
    frame.encode(&mut buf);
    assert_eq!(buf.len(), frame.encoded_len());
    assert_eq!(&buf[..4], &2013i32.to_le_bytes());
    assert_eq!(&buf[4..8], &5i32.to_le_bytes());
    assert_eq!(buf[8], 0);
    assert_eq!(&buf[9..], b"hello");
}
