//! The single writer feeding the monitor's subscribers.

use std::sync::Arc;

use leaky_bucket::RateLimiter;
use tokio::{select, sync::Notify, time::Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::{MonitorConfig, Prober, ServerDescription, subscription::Shared};

pub(super) struct UpdateLoop<P> {
    pub shared: Arc<Shared>,
    pub prober: Arc<P>,
    pub config: MonitorConfig,
    pub shutdown: CancellationToken,
    pub wake: Arc<Notify>,
}

impl<P: Prober> UpdateLoop<P> {
    /// Probe until `shutdown` fires.
    ///
    /// Checks are spaced by at least `min_heartbeat_interval`, whether they
    /// come from the heartbeat or from a requested immediate check.
    #[expect(
        clippy::integer_division_remainder_used,
        reason = "tokio::select! expands to modulus internally"
    )]
    pub(super) async fn run(self) {
        let limiter = RateLimiter::builder()
            .initial(1)
            .refill(1)
            .interval(self.config.min_heartbeat_interval)
            .max(1)
            .build();

        loop {
            select! {
                biased;

                () = self.shutdown.cancelled() => break,
                () = limiter.acquire_one() => {}
            }

            let description = select! {
                biased;

                () = self.shutdown.cancelled() => break,
                description = self.check() => description,
            };
            self.shared.publish(description);

            select! {
                biased;

                () = self.shutdown.cancelled() => break,
                () = self.wake.notified() => debug!(address = %self.shared.address, "immediate check requested"),
                () = tokio::time::sleep(self.config.heartbeat_interval) => {}
            }
        }
        debug!(address = %self.shared.address, "update loop exited");
    }

    async fn check(&self) -> ServerDescription {
        let address = self.shared.address.clone();
        let started = Instant::now();
        match self.prober.probe(&address).await {
            Ok(result) => {
                let rtt = result.rtt.unwrap_or_else(|| started.elapsed());
                ServerDescription::new(address, result.kind, Some(rtt))
            }
            Err(e) => {
                warn!(address = %address, error = %e, "server check failed");
                ServerDescription::unknown(address).with_error(e.to_string())
            }
        }
    }
}
