//! Bounded connection provider.
//!
//! [`CappedProvider`] wraps a [`ConnectionFactory`] with a fixed number of
//! slots. Each issued [`CappedConnection`] holds one slot until it is closed
//! or dropped; callers beyond capacity wait, and may give up through the
//! [`Context`] they pass in.
//!
//! Waiters are admitted in arrival order (tokio's semaphore is FIFO), so a
//! waiter cannot be starved while slots keep being returned.

mod connection;
mod error;

use std::{num::NonZeroUsize, sync::Arc};

use async_trait::async_trait;
pub use connection::CappedConnection;
pub use error::{ConnectionError, ProviderError};
use log::debug;
use tokio::sync::Semaphore;
use tracing::warn;

use crate::{context::Context, metrics};

/// A live connection as seen by the provider.
#[async_trait]
pub trait Connection: Send {
    /// Close the connection.
    ///
    /// # Errors
    ///
    /// Returns the transport's error if closing failed. The connection is
    /// considered closed either way.
    async fn close(&mut self) -> Result<(), ConnectionError>;

    /// Whether the connection is still usable.
    fn is_alive(&self) -> bool { true }
}

#[async_trait]
impl<C: Connection + ?Sized> Connection for Box<C> {
    async fn close(&mut self) -> Result<(), ConnectionError> { (**self).close().await }

    fn is_alive(&self) -> bool { (**self).is_alive() }
}

/// Produces raw connections.
///
/// The factory is shared with the provider through an [`Arc`], so the caller
/// may keep its own handle.
#[async_trait]
pub trait ConnectionFactory: Send + Sync + 'static {
    /// Connection type produced.
    type Connection: Connection + 'static;

    /// Open a connection. Implementations should give up once `ctx` is done.
    ///
    /// # Errors
    ///
    /// Returns a [`ConnectionError`] if the connection cannot be established.
    async fn connect(&self, ctx: &Context) -> Result<Self::Connection, ConnectionError>;
}

/// Admission gate limiting the number of live connections.
///
/// Clones share the same slots and factory.
///
/// # Examples
///
/// ```
/// use std::{num::NonZeroUsize, sync::Arc};
///
/// use async_trait::async_trait;
/// use wireline::{
///     context::Context,
///     provider::{CappedProvider, Connection, ConnectionError, ConnectionFactory},
/// };
///
/// struct Loopback;
///
/// #[async_trait]
/// impl Connection for Loopback {
///     async fn close(&mut self) -> Result<(), ConnectionError> { Ok(()) }
/// }
///
/// struct LoopbackFactory;
///
/// #[async_trait]
/// impl ConnectionFactory for LoopbackFactory {
///     type Connection = Loopback;
///
///     async fn connect(&self, _ctx: &Context) -> Result<Loopback, ConnectionError> { Ok(Loopback) }
/// }
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let provider = CappedProvider::new(NonZeroUsize::MIN, Arc::new(LoopbackFactory));
/// let mut conn = provider.acquire(&Context::background()).await?;
/// assert_eq!(provider.available(), 0);
/// conn.close().await?;
/// assert_eq!(provider.available(), 1);
/// # Ok(())
/// # }
/// ```
pub struct CappedProvider<F> {
    factory: Arc<F>,
    slots: Arc<Semaphore>,
    capacity: usize,
}

impl<F> Clone for CappedProvider<F> {
    fn clone(&self) -> Self {
        Self {
            factory: Arc::clone(&self.factory),
            slots: Arc::clone(&self.slots),
            capacity: self.capacity,
        }
    }
}

impl<F: ConnectionFactory> CappedProvider<F> {
    /// Create a provider allowing `capacity` live connections.
    ///
    /// Capacities above [`Semaphore::MAX_PERMITS`] are clamped to it.
    #[must_use]
    pub fn new(capacity: NonZeroUsize, factory: Arc<F>) -> Self {
        let capacity = capacity.get().min(Semaphore::MAX_PERMITS);
        Self {
            factory,
            slots: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// Create a provider, rejecting unusable capacities.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::InvalidCapacity`] if `capacity` is zero or
    /// exceeds [`Semaphore::MAX_PERMITS`].
    pub fn try_new(capacity: usize, factory: Arc<F>) -> Result<Self, ProviderError> {
        match NonZeroUsize::new(capacity) {
            Some(c) if capacity <= Semaphore::MAX_PERMITS => Ok(Self::new(c, factory)),
            _ => Err(ProviderError::InvalidCapacity(capacity)),
        }
    }

    /// Wait for a free slot and open a connection in it.
    ///
    /// The wait ends early, without consuming a slot, as soon as `ctx` is
    /// canceled or its deadline passes; a context that is already done fails
    /// immediately. If the factory fails, the slot is released before the
    /// error is returned.
    ///
    /// # Errors
    ///
    /// - [`ProviderError::CapacityTimeout`] when `ctx` finishes first.
    /// - [`ProviderError::Factory`] when the factory fails.
    /// - [`ProviderError::Closed`] after [`CappedProvider::close`].
    #[expect(
        clippy::integer_division_remainder_used,
        reason = "tokio::select! expands to modulus internally"
    )]
    pub async fn acquire(&self, ctx: &Context) -> Result<CappedConnection<F::Connection>, ProviderError> {
        if let Some(err) = ctx.err() {
            metrics::inc_acquire_timeouts();
            return Err(ProviderError::CapacityTimeout(err));
        }

        let permit = tokio::select! {
            biased;
            err = ctx.done() => {
                warn!(
                    capacity = self.capacity,
                    reason = %err,
                    "gave up waiting for a connection slot"
                );
                metrics::inc_acquire_timeouts();
                return Err(ProviderError::CapacityTimeout(err));
            }
            permit = Arc::clone(&self.slots).acquire_owned() => {
                permit.map_err(|_| ProviderError::Closed)?
            }
        };

        match self.factory.connect(ctx).await {
            Ok(conn) => {
                debug!(
                    "connection slot reserved ({} of {} free)",
                    self.available(),
                    self.capacity
                );
                Ok(CappedConnection::new(conn, permit))
            }
            Err(err) => {
                drop(permit);
                metrics::inc_factory_errors();
                debug!("connection factory failed, slot released: {err}");
                Err(ProviderError::Factory(err))
            }
        }
    }

    /// Stop admitting connections.
    ///
    /// Pending and future [`acquire`](Self::acquire) calls fail with
    /// [`ProviderError::Closed`]. Connections already issued stay valid.
    pub fn close(&self) { self.slots.close(); }

    /// Returns `true` after [`close`](Self::close).
    #[must_use]
    pub fn is_closed(&self) -> bool { self.slots.is_closed() }

    /// Number of slots fixed at construction.
    #[must_use]
    pub fn capacity(&self) -> usize { self.capacity }

    /// Number of free slots.
    #[must_use]
    pub fn available(&self) -> usize { self.slots.available_permits() }

    /// Number of connections currently holding a slot.
    #[must_use]
    pub fn in_use(&self) -> usize { self.capacity.saturating_sub(self.available()) }

    /// The factory behind this provider.
    #[must_use]
    pub fn factory(&self) -> &Arc<F> { &self.factory }
}

impl<F> std::fmt::Debug for CappedProvider<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CappedProvider")
            .field("capacity", &self.capacity)
            .field("available", &self.slots.available_permits())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests;
