#![doc(html_root_url = "https://docs.rs/wireline/latest")]
//! Public API for the `wireline` library.
//!
//! This crate provides the transport-resilience layer of a database
//! wire-protocol client: payload compression with untrusted size checks, a
//! capacity-bounded connection provider with cancellable acquisition, and a
//! topology monitor that broadcasts server state with a deterministic
//! shutdown.

pub mod compression;
pub mod config;
pub mod context;
pub mod error;
pub mod metrics;
pub mod monitor;
pub mod prelude;
pub mod provider;

pub use compression::{
    CompressedFrame,
    CompressionEngine,
    CompressionError,
    CompressionOptions,
    CompressorId,
    FramingError,
    compress_payload,
    decompress_payload,
};
pub use config::{ConfigError, TransportConfig};
pub use context::{Context, ContextError};
pub use error::{ErrorKind, Result, WirelineError};
pub use monitor::{Monitor, MonitorConfig, MonitorError, ServerDescription, Subscription};
pub use provider::{CappedConnection, CappedProvider, ConnectionFactory, ProviderError};
