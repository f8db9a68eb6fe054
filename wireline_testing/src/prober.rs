//! A scriptable prober and monitor constructors.

use std::{
    sync::{
        Arc,
        Mutex,
        PoisonError,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use wireline::monitor::{
    Address,
    Monitor,
    MonitorConfig,
    ProbeError,
    ProbeResult,
    Prober,
    ServerKind,
};

/// Round-trip time reported by every successful fake probe.
pub const FAKE_RTT: Duration = Duration::from_millis(1);

/// Prober answering with whatever the test last configured.
#[derive(Debug)]
pub struct FakeProber {
    outcome: Mutex<Result<ServerKind, String>>,
    probes: AtomicUsize,
}

impl FakeProber {
    /// A prober reporting `kind`.
    #[must_use]
    pub fn new(kind: ServerKind) -> Self {
        Self {
            outcome: Mutex::new(Ok(kind)),
            probes: AtomicUsize::new(0),
        }
    }

    /// Report `kind` from now on.
    pub fn set_kind(&self, kind: ServerKind) { self.set(Ok(kind)); }

    /// Fail every probe with `message` from now on.
    pub fn fail(&self, message: impl Into<String>) { self.set(Err(message.into())); }

    /// Number of probes served.
    #[must_use]
    pub fn probe_count(&self) -> usize { self.probes.load(Ordering::SeqCst) }

    fn set(&self, outcome: Result<ServerKind, String>) {
        *self.outcome.lock().unwrap_or_else(PoisonError::into_inner) = outcome;
    }
}

#[async_trait]
impl Prober for FakeProber {
    async fn probe(&self, _address: &Address) -> Result<ProbeResult, ProbeError> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        let outcome = self
            .outcome
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        match outcome {
            Ok(kind) => Ok(ProbeResult {
                kind,
                rtt: Some(FAKE_RTT),
            }),
            Err(message) => Err(ProbeError::InvalidResponse(message)),
        }
    }
}

/// Monitor settings for tests: no heartbeat within a test's lifetime, a
/// short minimum interval so requested checks run promptly.
#[must_use]
pub fn fast_monitor_config() -> MonitorConfig {
    MonitorConfig {
        heartbeat_interval: Duration::from_secs(60),
        min_heartbeat_interval: Duration::from_millis(5),
        subscriber_capacity: 8,
    }
}

/// Start a monitor over a [`FakeProber`] reporting `kind`.
///
/// # Panics
///
/// Panics if called outside a tokio runtime.
#[must_use]
pub fn fake_monitor(kind: ServerKind, address: &str) -> (Monitor, Arc<FakeProber>) {
    let prober = Arc::new(FakeProber::new(kind));
    let monitor = Monitor::start_shared(address, Arc::clone(&prober), fast_monitor_config());
    (monitor, prober)
}
