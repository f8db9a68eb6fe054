//! Connection fakes for the capped provider.

use std::{
    num::NonZeroUsize,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use wireline::{
    context::Context,
    provider::{CappedProvider, Connection, ConnectionError, ConnectionFactory},
};

#[derive(Debug, Default)]
struct Stats {
    attempts: AtomicUsize,
    opened: AtomicUsize,
    closed: AtomicUsize,
}

/// Connection handed out by [`MockFactory`].
///
/// Every call to [`Connection::close`] is counted, so a test can detect a
/// wrapper closing the same connection twice.
#[derive(Debug)]
pub struct MockConnection {
    id: usize,
    closed: bool,
    stats: Arc<Stats>,
}

impl MockConnection {
    /// Sequence number assigned by the factory, starting at zero.
    #[must_use]
    pub fn id(&self) -> usize { self.id }
}

#[async_trait]
impl Connection for MockConnection {
    async fn close(&mut self) -> Result<(), ConnectionError> {
        self.stats.closed.fetch_add(1, Ordering::SeqCst);
        self.closed = true;
        Ok(())
    }

    fn is_alive(&self) -> bool { !self.closed }
}

/// Factory with switchable failures and an optional connect delay.
#[derive(Debug, Default)]
pub struct MockFactory {
    stats: Arc<Stats>,
    failing: AtomicBool,
    delay: Option<Duration>,
}

impl MockFactory {
    /// A factory that connects immediately.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// A factory whose connects take `delay`, giving up early when the
    /// caller's context ends.
    #[must_use]
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    /// Make subsequent connects fail or succeed.
    pub fn set_failing(&self, failing: bool) { self.failing.store(failing, Ordering::SeqCst); }

    /// Connect calls made, successful or not.
    #[must_use]
    pub fn attempts(&self) -> usize { self.stats.attempts.load(Ordering::SeqCst) }

    /// Connections produced.
    #[must_use]
    pub fn opened(&self) -> usize { self.stats.opened.load(Ordering::SeqCst) }

    /// `close` calls received by produced connections.
    #[must_use]
    pub fn closed(&self) -> usize { self.stats.closed.load(Ordering::SeqCst) }
}

#[async_trait]
impl ConnectionFactory for MockFactory {
    type Connection = MockConnection;

    async fn connect(&self, ctx: &Context) -> Result<MockConnection, ConnectionError> {
        self.stats.attempts.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::select! {
                biased;

                err = ctx.done() => return Err(err.into()),
                () = tokio::time::sleep(delay) => {}
            }
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(ConnectionError::other("mock factory refused to connect"));
        }
        let id = self.stats.opened.fetch_add(1, Ordering::SeqCst);
        Ok(MockConnection {
            id,
            closed: false,
            stats: Arc::clone(&self.stats),
        })
    }
}

/// A provider of `capacity` slots over a fresh [`MockFactory`].
///
/// # Panics
///
/// Panics if `capacity` is zero.
#[must_use]
pub fn capped_provider(capacity: usize) -> (CappedProvider<MockFactory>, Arc<MockFactory>) {
    let factory = Arc::new(MockFactory::new());
    let capacity = NonZeroUsize::new(capacity).expect("capacity must be non-zero");
    (CappedProvider::new(capacity, Arc::clone(&factory)), factory)
}
