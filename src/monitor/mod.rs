//! Topology monitor.
//!
//! A [`Monitor`] watches one server through a [`Prober`] and broadcasts each
//! observation to its subscribers. Every subscriber owns a bounded queue that
//! keeps the newest updates; [`Monitor::stop`] closes all of them and waits
//! for the update loop to exit, after which no new subscription is accepted.

mod config;
mod description;
mod error;
mod prober;
mod queue;
mod subscription;
mod update_loop;

use std::sync::Arc;

pub use config::MonitorConfig;
pub use description::{Address, ServerDescription, ServerKind};
pub use error::MonitorError;
use log::info;
pub use prober::{ProbeError, ProbeResult, Prober};
pub use subscription::{Subscription, Unsubscribe};
use subscription::Shared;
use tokio::sync::Notify;
use tokio_util::{sync::CancellationToken, task::TaskTracker};
use tracing::debug;
use update_loop::UpdateLoop;

/// Lifecycle of a [`Monitor`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MonitorState {
    /// Accepting subscribers and publishing updates.
    Running,
    /// Subscriber queues are closed; waiting for the update loop to exit.
    Stopping,
    /// The update loop has exited.
    Stopped,
}

/// Publishes server descriptions to many subscribers.
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use wireline::monitor::{
///     Address,
///     Monitor,
///     MonitorConfig,
///     ProbeError,
///     ProbeResult,
///     Prober,
///     ServerKind,
/// };
///
/// struct AlwaysStandalone;
///
/// #[async_trait]
/// impl Prober for AlwaysStandalone {
///     async fn probe(&self, _: &Address) -> Result<ProbeResult, ProbeError> {
///         Ok(ProbeResult::new(ServerKind::Standalone))
///     }
/// }
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let monitor = Monitor::start("localhost", AlwaysStandalone, MonitorConfig::default());
/// let (mut updates, _unsubscribe) = monitor.subscribe().expect("running");
/// let first = updates.recv().await.expect("first observation");
/// assert_eq!(first.kind, ServerKind::Standalone);
///
/// monitor.stop().await;
/// assert!(updates.recv().await.is_none());
/// assert!(monitor.subscribe().is_err());
/// # }
/// ```
#[derive(Debug)]
pub struct Monitor {
    shared: Arc<Shared>,
    shutdown: CancellationToken,
    tracker: TaskTracker,
    wake: Arc<Notify>,
    config: MonitorConfig,
}

impl Monitor {
    /// Start monitoring `address` with `prober`.
    ///
    /// The first check runs immediately. `config` is
    /// [normalized](MonitorConfig::normalized) before use.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    #[must_use]
    pub fn start<P: Prober>(address: impl Into<Address>, prober: P, config: MonitorConfig) -> Self {
        Self::start_shared(address, Arc::new(prober), config)
    }

    /// Like [`Monitor::start`] but shares an existing prober handle.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    #[must_use]
    pub fn start_shared<P: Prober>(
        address: impl Into<Address>,
        prober: Arc<P>,
        config: MonitorConfig,
    ) -> Self {
        let config = config.normalized();
        let address = address.into();
        let shared = Arc::new(Shared::new(address, config.subscriber_capacity));
        let shutdown = CancellationToken::new();
        let tracker = TaskTracker::new();
        let wake = Arc::new(Notify::new());

        tracker.spawn(
            UpdateLoop {
                shared: Arc::clone(&shared),
                prober,
                config,
                shutdown: shutdown.clone(),
                wake: Arc::clone(&wake),
            }
            .run(),
        );
        info!("monitor started for {}", shared.address);

        Self {
            shared,
            shutdown,
            tracker,
            wake,
            config,
        }
    }

    /// Register a new subscriber.
    ///
    /// The stream starts with the current description if one has been
    /// observed.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Closed`] once [`Monitor::stop`] has begun.
    pub fn subscribe(&self) -> Result<(Subscription, Unsubscribe), MonitorError> {
        let (id, rx) = self.shared.subscribe().ok_or(MonitorError::Closed)?;
        debug!(subscriber = id, address = %self.shared.address, "subscribed");
        Ok((
            Subscription::new(rx),
            Unsubscribe::new(Arc::downgrade(&self.shared), id),
        ))
    }

    /// Stop monitoring.
    ///
    /// Closes every subscription, then waits for the update loop to exit.
    /// Calling `stop` again, or concurrently, only waits for the same exit.
    pub async fn stop(&self) {
        let closed = self.shared.begin_stop();
        if closed > 0 {
            debug!(address = %self.shared.address, closed, "subscriptions closed");
        }
        self.shutdown.cancel();
        self.tracker.close();
        self.tracker.wait().await;
        if self.shared.finish_stop() {
            info!("monitor stopped for {}", self.shared.address);
        }
    }

    /// Ask for a check as soon as the rate limit allows.
    pub fn request_immediate_check(&self) { self.wake.notify_one(); }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> MonitorState { self.shared.lock().state }

    /// Latest published description, if any.
    #[must_use]
    pub fn current(&self) -> Option<ServerDescription> { self.shared.lock().current.clone() }

    /// Server being monitored.
    #[must_use]
    pub fn address(&self) -> &Address { &self.shared.address }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize { self.shared.subscriber_count() }

    /// Configuration in effect after normalization.
    #[must_use]
    pub fn config(&self) -> &MonitorConfig { &self.config }
}

impl Drop for Monitor {
    fn drop(&mut self) { self.shutdown.cancel(); }
}
