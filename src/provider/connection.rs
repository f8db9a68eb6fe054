//! Connection handed out by [`CappedProvider`](super::CappedProvider).

use std::ops::{Deref, DerefMut};

use async_trait::async_trait;
use log::debug;
use tokio::sync::OwnedSemaphorePermit;

use super::{Connection, ConnectionError};
use crate::metrics;

/// A connection holding one of its provider's slots.
///
/// The slot is returned when the connection is closed, or when it is dropped
/// without being closed. Closing twice is harmless: the second call neither
/// closes the inner connection again nor releases a second slot.
pub struct CappedConnection<C> {
    inner: C,
    permit: Option<OwnedSemaphorePermit>,
}

impl<C> CappedConnection<C> {
    pub(super) fn new(inner: C, permit: OwnedSemaphorePermit) -> Self {
        metrics::inc_checked_out();
        Self {
            inner,
            permit: Some(permit),
        }
    }

    /// Returns `true` once the slot has been released.
    #[must_use]
    pub fn is_closed(&self) -> bool { self.permit.is_none() }

    /// Release the slot if still held. Returns whether a slot was released.
    fn release(&mut self) -> bool {
        match self.permit.take() {
            Some(permit) => {
                drop(permit);
                metrics::dec_checked_out();
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl<C: Connection> Connection for CappedConnection<C> {
    async fn close(&mut self) -> Result<(), ConnectionError> {
        if self.is_closed() {
            return Ok(());
        }
        let result = self.inner.close().await;
        if self.release() {
            debug!("connection closed, slot released");
        }
        result
    }

    fn is_alive(&self) -> bool { !self.is_closed() && self.inner.is_alive() }
}

impl<C> Deref for CappedConnection<C> {
    type Target = C;

    fn deref(&self) -> &Self::Target { &self.inner }
}

impl<C> DerefMut for CappedConnection<C> {
    fn deref_mut(&mut self) -> &mut Self::Target { &mut self.inner }
}

impl<C> Drop for CappedConnection<C> {
    fn drop(&mut self) {
        if self.release() {
            debug!("connection dropped without close, slot released");
        }
    }
}

impl<C: std::fmt::Debug> std::fmt::Debug for CappedConnection<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CappedConnection")
            .field("inner", &self.inner)
            .field("closed", &self.is_closed())
            .finish()
    }
}
