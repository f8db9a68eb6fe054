//! Test worlds for the behavioural suites.
//!
//! Each world owns the component under test plus whatever the scenario
//! needs to observe it: held connections and a pending waiter for the
//! provider, subscriptions for the monitor, a payload for compression.

use std::{sync::Arc, time::Duration};

use cucumber::World;
use tokio::{task::JoinHandle, time::timeout};
use tokio_util::sync::CancellationToken;
use wireline::{
    compression::{CompressionError, CompressionOptions, CompressorId},
    context::Context,
    monitor::{Monitor, ServerDescription, ServerKind, Subscription},
    provider::{CappedConnection, CappedProvider, Connection, ProviderError},
};
use wireline_testing::{FakeProber, MockConnection, MockFactory, TEST_BOUND, fake_monitor};

pub use wireline_testing::TestResult;

type Acquired = Result<CappedConnection<MockConnection>, ProviderError>;

#[derive(Debug, Default, World)]
pub struct ProviderWorld {
    provider: Option<CappedProvider<MockFactory>>,
    factory: Option<Arc<MockFactory>>,
    held: Vec<CappedConnection<MockConnection>>,
    waiter: Option<(JoinHandle<Acquired>, CancellationToken)>,
    outcome: Option<Acquired>,
}

impl ProviderWorld {
    fn provider(&self) -> &CappedProvider<MockFactory> {
        self.provider.as_ref().expect("provider not created")
    }

    pub fn create(&mut self, capacity: usize) {
        let (provider, factory) = wireline_testing::capped_provider(capacity);
        self.provider = Some(provider);
        self.factory = Some(factory);
    }

    pub fn fail_factory(&self) {
        self.factory
            .as_ref()
            .expect("provider not created")
            .set_failing(true);
    }

    pub async fn acquire_many(&mut self, count: usize) -> TestResult {
        for _ in 0..count {
            let conn = timeout(TEST_BOUND, self.provider().acquire(&Context::background())).await??;
            self.held.push(conn);
        }
        Ok(())
    }

    pub async fn acquire_once(&mut self) {
        self.outcome = Some(self.provider().acquire(&Context::background()).await);
    }

    pub async fn start_waiter(&mut self) {
        let provider = self.provider().clone();
        let (ctx, cancel) = Context::with_cancel();
        let handle = tokio::spawn(async move { provider.acquire(&ctx).await });
        tokio::task::yield_now().await;
        self.waiter = Some((handle, cancel));
    }

    pub async fn waiter_is_blocked(&self) -> TestResult {
        tokio::time::sleep(Duration::from_millis(20)).await;
        let (handle, _) = self.waiter.as_ref().ok_or("no waiter")?;
        if handle.is_finished() {
            return Err("waiter finished while capacity was exhausted".into());
        }
        Ok(())
    }

    pub fn cancel_waiter(&self) -> TestResult {
        let (_, cancel) = self.waiter.as_ref().ok_or("no waiter")?;
        cancel.cancel();
        Ok(())
    }

    pub async fn close_one(&mut self) -> TestResult {
        let mut conn = self.held.pop().ok_or("no held connection")?;
        conn.close().await?;
        Ok(())
    }

    pub async fn finish_waiter(&mut self) -> TestResult {
        let (handle, _) = self.waiter.take().ok_or("no waiter")?;
        self.outcome = Some(timeout(TEST_BOUND, handle).await??);
        Ok(())
    }

    pub fn take_outcome(&mut self) -> TestResult<Acquired> {
        Ok(self.outcome.take().ok_or("no acquisition outcome")?)
    }

    /// Keep the connection the waiter received so it stays checked out.
    pub fn keep_received(&mut self) -> TestResult {
        let conn = self.take_outcome()??;
        if !conn.is_alive() {
            return Err("received a closed connection".into());
        }
        self.held.push(conn);
        Ok(())
    }

    pub fn in_use(&self) -> usize { self.provider().in_use() }
}

#[derive(Debug, Default, World)]
pub struct MonitorWorld {
    monitor: Option<Monitor>,
    prober: Option<Arc<FakeProber>>,
    subscriptions: Vec<Subscription>,
    seen: Vec<Vec<ServerDescription>>,
}

impl MonitorWorld {
    fn monitor(&self) -> &Monitor { self.monitor.as_ref().expect("monitor not started") }

    pub fn start(&mut self, kind: ServerKind, address: &str) {
        let (monitor, prober) = fake_monitor(kind, address);
        self.monitor = Some(monitor);
        self.prober = Some(prober);
    }

    pub fn subscribe(&mut self, count: usize) -> TestResult {
        for _ in 0..count {
            let (sub, _unsubscribe) = self.monitor().subscribe()?;
            self.subscriptions.push(sub);
        }
        Ok(())
    }

    pub async fn stop(&self) -> TestResult {
        timeout(TEST_BOUND, self.monitor().stop()).await?;
        Ok(())
    }

    pub async fn all_closed(&mut self) -> TestResult {
        for sub in &mut self.subscriptions {
            timeout(TEST_BOUND, async { while sub.recv().await.is_some() {} }).await?;
        }
        Ok(())
    }

    pub fn subscribe_fails(&self) -> bool { self.monitor().subscribe().is_err() }

    pub fn is_stopped(&self) -> bool {
        self.monitor().state() == wireline::monitor::MonitorState::Stopped
    }

    pub async fn change_kind(&mut self, kind: ServerKind) -> TestResult {
        // Consume the first observation before changing what the server reports.
        let before = self.next_updates().await?;
        self.seen.push(before);
        self.prober.as_ref().ok_or("monitor not started")?.set_kind(kind);
        self.monitor().request_immediate_check();
        Ok(())
    }

    async fn next_updates(&mut self) -> TestResult<Vec<ServerDescription>> {
        let mut updates = Vec::with_capacity(self.subscriptions.len());
        for sub in &mut self.subscriptions {
            let update = timeout(TEST_BOUND, sub.recv()).await?.ok_or("stream ended")?;
            updates.push(update);
        }
        Ok(updates)
    }

    pub async fn kinds_seen(&mut self) -> TestResult<Vec<Vec<ServerKind>>> {
        let latest = self.next_updates().await?;
        self.seen.push(latest);
        let rounds = self.seen.len();
        Ok((0..self.subscriptions.len())
            .map(|i| (0..rounds).map(|r| self.seen[r][i].kind).collect())
            .collect())
    }
}

#[derive(Debug, Default, World)]
pub struct CompressionWorld {
    payload: Vec<u8>,
    compressor: Option<CompressorId>,
    compressed: Vec<u8>,
}

impl CompressionWorld {
    pub fn set_payload(&mut self, payload: Vec<u8>) { self.payload = payload; }

    pub fn compress(&mut self, compressor: CompressorId) -> TestResult {
        self.compressed = wireline::compress_payload(&self.payload, &Self::options(compressor, 0))?;
        self.compressor = Some(compressor);
        Ok(())
    }

    pub fn decompress_as(&self, declared: i32) -> Result<Vec<u8>, CompressionError> {
        let compressor = self.compressor.unwrap_or(CompressorId::Noop);
        wireline::decompress_payload(&self.compressed, &Self::options(compressor, declared))
    }

    pub fn payload(&self) -> &[u8] { &self.payload }

    fn options(compressor: CompressorId, declared: i32) -> CompressionOptions {
        CompressionOptions::new(compressor).with_uncompressed_size(declared)
    }
}
