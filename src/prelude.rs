//! Optional convenience imports for common `wireline` workflows.
//!
//! Prefer importing specialised APIs directly from their owning modules.
//!
//! # Examples
//!
//! ```rust,no_run
//! use wireline::prelude::*;
//!
//! fn roundtrip(payload: &[u8]) -> Result<Vec<u8>> {
//!     let options = CompressionOptions::new(CompressorId::Zstd);
//!     let compressed = compress_payload(payload, &options)?;
//!     let declared = i32::try_from(payload.len()).unwrap_or(i32::MAX);
//!     Ok(decompress_payload(
//!         &compressed,
//!         &options.with_uncompressed_size(declared),
//!     )?)
//! }
//! ```

pub use crate::{
    compression::{CompressionOptions, CompressorId, compress_payload, decompress_payload},
    context::Context,
    error::{Result, WirelineError},
    monitor::{Monitor, MonitorConfig, Prober, ServerDescription, ServerKind},
    provider::{CappedProvider, Connection, ConnectionError, ConnectionFactory},
};
