//! Cancellation context for blocking operations.
//!
//! A [`Context`] pairs a [`CancellationToken`] with an optional deadline. It is
//! passed to [`CappedProvider::acquire`](crate::provider::CappedProvider::acquire)
//! and forwarded to the connection factory, so callers decide how long they
//! are prepared to wait.

use std::time::Duration;

use thiserror::Error;
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;

/// Reason a [`Context`] finished.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum ContextError {
    /// The cancellation token was triggered.
    #[error("context canceled")]
    Canceled,
    /// The deadline passed before the operation completed.
    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

/// Cloneable cancellation signal with an optional deadline.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use wireline::context::{Context, ContextError};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let (ctx, token) = Context::with_cancel();
/// assert!(ctx.err().is_none());
/// token.cancel();
/// assert_eq!(ctx.done().await, ContextError::Canceled);
///
/// let ctx = Context::with_timeout(Duration::from_millis(1));
/// assert_eq!(ctx.done().await, ContextError::DeadlineExceeded);
/// # }
/// ```
#[derive(Clone, Debug, Default)]
pub struct Context {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Context {
    /// A context that is never canceled and has no deadline.
    #[must_use]
    pub fn background() -> Self { Self::default() }

    /// A context canceled through the returned token.
    #[must_use]
    pub fn with_cancel() -> (Self, CancellationToken) {
        let token = CancellationToken::new();
        (Self::from_token(token.clone()), token)
    }

    /// Wrap an existing token, for example a server-wide shutdown token.
    #[must_use]
    pub fn from_token(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    /// A context that expires `timeout` from now.
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self { Self::background().timeout(timeout) }

    /// A context that expires at `deadline`.
    #[must_use]
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: Some(deadline),
        }
    }

    /// Derive a child context.
    ///
    /// The child is canceled when the parent is, inherits its deadline, and
    /// can be canceled independently through the returned token.
    #[must_use]
    pub fn child(&self) -> (Self, CancellationToken) {
        let token = self.token.child_token();
        let child = Self {
            token: token.clone(),
            deadline: self.deadline,
        };
        (child, token)
    }

    /// Tighten the deadline to at most `timeout` from now.
    ///
    /// An existing earlier deadline is kept.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        if let Some(candidate) = Instant::now().checked_add(timeout) {
            self.deadline = Some(match self.deadline {
                Some(current) => current.min(candidate),
                None => candidate,
            });
        }
        self
    }

    /// The deadline, if one is set.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> { self.deadline }

    /// Report why the context finished, or `None` while it is still live.
    #[must_use]
    pub fn err(&self) -> Option<ContextError> {
        if self.token.is_cancelled() {
            return Some(ContextError::Canceled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(ContextError::DeadlineExceeded),
            _ => None,
        }
    }

    /// Returns `true` once the context is canceled or expired.
    #[must_use]
    pub fn is_done(&self) -> bool { self.err().is_some() }

    /// Wait until the context is canceled or its deadline passes.
    ///
    /// Resolves immediately when the context is already done. Without a
    /// deadline and without cancellation this never resolves.
    #[expect(
        clippy::integer_division_remainder_used,
        reason = "tokio::select! expands to modulus internally"
    )]
    pub async fn done(&self) -> ContextError {
        match self.deadline {
            Some(deadline) => tokio::select! {
                biased;
                () = self.token.cancelled() => ContextError::Canceled,
                () = sleep_until(deadline) => ContextError::DeadlineExceeded,
            },
            None => {
                self.token.cancelled().await;
                ContextError::Canceled
            }
        }
    }
}
