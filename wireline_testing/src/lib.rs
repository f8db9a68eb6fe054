//! Test doubles and helpers for exercising `wireline` components.
//!
//! The fakes here stand in for the external collaborators of the crate: a
//! [`MockFactory`] producing [`MockConnection`]s for the capped provider and
//! a [`FakeProber`] whose answers a test can change while a monitor runs.
//!
//! ```rust
//! use wireline::{context::Context, monitor::ServerKind};
//! use wireline_testing::{capped_provider, fake_monitor, recv_expect};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let (provider, factory) = capped_provider(2);
//! let _conn = provider.acquire(&Context::background()).await.unwrap();
//! assert_eq!(factory.opened(), 1);
//!
//! let (monitor, _prober) = fake_monitor(ServerKind::Standalone, "localhost:27017");
//! let (mut updates, _unsubscribe) = monitor.subscribe().unwrap();
//! assert_eq!(recv_expect!(updates).kind, ServerKind::Standalone);
//! monitor.stop().await;
//! # }
//! ```

use std::time::Duration;

pub mod connection;
pub mod logging;
pub mod macros;
pub mod metrics;
pub mod prober;

pub use connection::{MockConnection, MockFactory, capped_provider};
pub use logging::{LoggerHandle, logger};
pub use metrics::{assert_counter_eq, counter_value, debugging_recorder_setup, gauge_value};
pub use prober::{FakeProber, fake_monitor, fast_monitor_config};

/// Upper bound on any single wait in a test.
pub const TEST_BOUND: Duration = Duration::from_secs(2);

/// Shared result type for integration tests.
pub type TestResult<T = ()> = Result<T, Box<dyn std::error::Error + Send + Sync>>;
