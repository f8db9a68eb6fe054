//! Subscriber set and the handles given to subscribers.
//!
//! Every subscription owns a bounded latest-wins queue. The sending half
//! lives in the [`Registry`] map, and removing it from the map is the only way
//! a queue is closed: [`Unsubscribe`] removes one entry, stopping the monitor drains all
//! of them. Both happen under the registry lock, so an entry can be removed
//! (and its queue closed) at most once.

use std::{
    collections::HashMap,
    mem,
    pin::Pin,
    sync::{Mutex, MutexGuard, PoisonError, Weak},
    task::{Context as TaskContext, Poll},
    time::Duration,
};

use futures::Stream;
use tokio::time::Instant;
use tracing::{debug, warn};

use super::{
    Address,
    MonitorState,
    ServerDescription,
    queue::{self, Push},
};
use crate::metrics;

type SubscriberId = u64;

/// Minimum spacing between warnings about dropped updates.
const DROP_LOG_INTERVAL: Duration = Duration::from_secs(1);

/// Lifecycle state, snapshot and subscribers, guarded together.
pub(super) struct Registry {
    pub(super) state: MonitorState,
    pub(super) current: Option<ServerDescription>,
    next_id: SubscriberId,
    subscribers: HashMap<SubscriberId, queue::Sender>,
    dropped_since_log: usize,
    last_drop_log: Option<Instant>,
}

impl Registry {
    fn record_drop(&mut self, address: &Address) {
        metrics::inc_updates_dropped();
        self.dropped_since_log += 1;
        let now = Instant::now();
        if self
            .last_drop_log
            .is_none_or(|last| now.duration_since(last) >= DROP_LOG_INTERVAL)
        {
            warn!(
                address = %address,
                dropped = self.dropped_since_log,
                "subscriber queues full; stale updates dropped"
            );
            self.dropped_since_log = 0;
            self.last_drop_log = Some(now);
        }
    }
}

/// State shared between the monitor handle, its update loop and
/// [`Unsubscribe`] handles.
pub(super) struct Shared {
    pub(super) address: Address,
    pub(super) capacity: usize,
    registry: Mutex<Registry>,
}

impl Shared {
    pub(super) fn new(address: Address, capacity: usize) -> Self {
        Self {
            address,
            capacity,
            registry: Mutex::new(Registry {
                state: MonitorState::Running,
                current: None,
                next_id: 0,
                subscribers: HashMap::new(),
                dropped_since_log: 0,
                last_drop_log: None,
            }),
        }
    }

    /// Lock the registry. No code panics while holding it, so a poisoned
    /// lock still guards consistent data.
    pub(super) fn lock(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a subscriber if the monitor is running.
    ///
    /// The queue is seeded with the current description so the subscriber
    /// starts from the latest known state.
    pub(super) fn subscribe(&self) -> Option<(SubscriberId, queue::Receiver)> {
        let mut registry = self.lock();
        if registry.state != MonitorState::Running {
            return None;
        }
        let (tx, rx) = queue::channel(self.capacity, registry.current.clone());
        let id = registry.next_id;
        registry.next_id += 1;
        registry.subscribers.insert(id, tx);
        Some((id, rx))
    }

    /// Remove one subscriber, closing its queue. Returns `false` if it was
    /// already gone.
    pub(super) fn unsubscribe(&self, id: SubscriberId) -> bool {
        self.lock().subscribers.remove(&id).is_some()
    }

    /// Move to `Stopping` and close every queue.
    ///
    /// Returns the number of queues closed; zero if the monitor was already
    /// stopping.
    pub(super) fn begin_stop(&self) -> usize {
        let drained = {
            let mut registry = self.lock();
            if registry.state != MonitorState::Running {
                return 0;
            }
            registry.state = MonitorState::Stopping;
            mem::take(&mut registry.subscribers)
        };
        // The senders are out of the set; dropping them closes the queues.
        let closed = drained.len();
        drop(drained);
        closed
    }

    /// Move to `Stopped`. Returns `false` if another caller already did.
    pub(super) fn finish_stop(&self) -> bool {
        let mut registry = self.lock();
        let first = registry.state != MonitorState::Stopped;
        registry.state = MonitorState::Stopped;
        first
    }

    /// Record `description` as current and deliver it to every subscriber.
    ///
    /// Full queues evict their oldest update to make room, so every
    /// subscriber's newest queued update matches the current description.
    /// Queues whose receiver was dropped are pruned. Nothing is published once
    /// the monitor is stopping.
    pub(super) fn publish(&self, mut description: ServerDescription) {
        let mut registry = self.lock();
        if registry.state != MonitorState::Running {
            return;
        }
        description.smooth_rtt(
            registry
                .current
                .as_ref()
                .and_then(|previous| previous.average_rtt),
        );
        let mut evicted = 0;
        registry
            .subscribers
            .retain(|id, tx| match tx.push(description.clone()) {
                Push::Queued => true,
                Push::Evicted => {
                    evicted += 1;
                    true
                }
                Push::Disconnected => {
                    debug!(subscriber = id, "pruning dropped subscription");
                    false
                }
            });
        for _ in 0..evicted {
            registry.record_drop(&self.address);
        }
        registry.current = Some(description);
    }

    pub(super) fn subscriber_count(&self) -> usize { self.lock().subscribers.len() }
}

/// Stream of topology updates for one subscriber.
///
/// Yields descriptions in the order the monitor observed them and ends when
/// the subscriber unsubscribes or the monitor stops. Updates already queued
/// are still delivered before the end. A subscriber that falls behind loses
/// its oldest queued updates, never the newest.
#[derive(Debug)]
pub struct Subscription {
    rx: queue::Receiver,
}

impl Subscription {
    pub(super) fn new(rx: queue::Receiver) -> Self { Self { rx } }

    /// Wait for the next update. Returns `None` once the stream has ended.
    pub async fn recv(&mut self) -> Option<ServerDescription> {
        std::future::poll_fn(|cx| self.rx.poll_recv(cx)).await
    }

    /// Take a queued update without waiting.
    #[must_use]
    pub fn try_recv(&mut self) -> Option<ServerDescription> { self.rx.try_recv() }

    /// Returns `true` once the stream is closed and drained.
    #[must_use]
    pub fn is_terminated(&self) -> bool { self.rx.is_terminated() }
}

impl Stream for Subscription {
    type Item = ServerDescription;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

/// Capability ending one subscription.
///
/// Unsubscribing is idempotent and harmless after the monitor has stopped.
/// The handle does not keep the monitor alive.
#[derive(Clone, Debug)]
pub struct Unsubscribe {
    shared: Weak<Shared>,
    id: SubscriberId,
}

impl Unsubscribe {
    pub(super) fn new(shared: Weak<Shared>, id: SubscriberId) -> Self { Self { shared, id } }

    /// Close the subscription's stream.
    pub fn unsubscribe(&self) {
        if let Some(shared) = self.shared.upgrade()
            && shared.unsubscribe(self.id)
        {
            debug!(subscriber = self.id, "unsubscribed");
        }
    }
}

impl std::fmt::Debug for Shared {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shared")
            .field("address", &self.address)
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}
