//! Bounded latest-wins queue between the monitor and one subscriber.
//!
//! When the queue is full the oldest update is evicted, so the last update a
//! subscriber holds is always the newest one published. Dropping the
//! [`Sender`] closes the queue; updates already queued are still delivered.

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    task::{Context, Poll, Waker},
};

use super::ServerDescription;

/// Outcome of [`Sender::push`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum Push {
    /// Queued with room to spare.
    Queued,
    /// Queued after evicting the oldest update.
    Evicted,
    /// The receiver is gone; nothing was queued.
    Disconnected,
}

#[derive(Debug)]
struct State {
    items: VecDeque<ServerDescription>,
    closed: bool,
    receiver_dropped: bool,
    waker: Option<Waker>,
}

#[derive(Debug)]
struct Queue {
    capacity: usize,
    state: Mutex<State>,
}

impl Queue {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Create a queue holding at most `capacity` updates, starting with `seed`.
pub(super) fn channel(capacity: usize, seed: Option<ServerDescription>) -> (Sender, Receiver) {
    let capacity = capacity.max(1);
    let mut items = VecDeque::with_capacity(capacity);
    items.extend(seed);
    let queue = Arc::new(Queue {
        capacity,
        state: Mutex::new(State {
            items,
            closed: false,
            receiver_dropped: false,
            waker: None,
        }),
    });
    (
        Sender {
            queue: Arc::clone(&queue),
        },
        Receiver { queue },
    )
}

/// Publishing half, owned by the subscriber registry.
#[derive(Debug)]
pub(super) struct Sender {
    queue: Arc<Queue>,
}

impl Sender {
    pub(super) fn push(&self, description: ServerDescription) -> Push {
        let mut state = self.queue.lock();
        if state.receiver_dropped {
            return Push::Disconnected;
        }
        let outcome = if state.items.len() >= self.queue.capacity {
            state.items.pop_front();
            Push::Evicted
        } else {
            Push::Queued
        };
        state.items.push_back(description);
        let waker = state.waker.take();
        drop(state);
        if let Some(waker) = waker {
            waker.wake();
        }
        outcome
    }
}

impl Drop for Sender {
    fn drop(&mut self) {
        let waker = {
            let mut state = self.queue.lock();
            state.closed = true;
            state.waker.take()
        };
        if let Some(waker) = waker {
            waker.wake();
        }
    }
}

/// Receiving half, owned by a [`Subscription`](super::Subscription).
#[derive(Debug)]
pub(super) struct Receiver {
    queue: Arc<Queue>,
}

impl Receiver {
    pub(super) fn poll_recv(&mut self, cx: &mut Context<'_>) -> Poll<Option<ServerDescription>> {
        let mut state = self.queue.lock();
        if let Some(description) = state.items.pop_front() {
            return Poll::Ready(Some(description));
        }
        if state.closed {
            return Poll::Ready(None);
        }
        match &mut state.waker {
            Some(waker) if waker.will_wake(cx.waker()) => {}
            slot => *slot = Some(cx.waker().clone()),
        }
        Poll::Pending
    }

    pub(super) fn try_recv(&mut self) -> Option<ServerDescription> {
        self.queue.lock().items.pop_front()
    }

    pub(super) fn is_terminated(&self) -> bool {
        let state = self.queue.lock();
        state.closed && state.items.is_empty()
    }
}

impl Drop for Receiver {
    fn drop(&mut self) {
        let mut state = self.queue.lock();
        state.receiver_dropped = true;
        state.items.clear();
    }
}
