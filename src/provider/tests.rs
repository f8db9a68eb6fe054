//! Unit tests for slot accounting in [`CappedProvider`].

use std::{
    num::NonZeroUsize,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use rstest::{fixture, rstest};
use tokio::time::timeout;

use super::*;

#[derive(Debug, Default)]
struct Counters {
    opened: AtomicUsize,
    closed: AtomicUsize,
}

#[derive(Debug)]
struct CountingConnection(Arc<Counters>);

#[async_trait]
impl Connection for CountingConnection {
    async fn close(&mut self) -> Result<(), ConnectionError> {
        self.0.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Default)]
struct CountingFactory {
    counters: Arc<Counters>,
    fail: AtomicBool,
}

#[async_trait]
impl ConnectionFactory for CountingFactory {
    type Connection = CountingConnection;

    async fn connect(&self, _ctx: &Context) -> Result<CountingConnection, ConnectionError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(ConnectionError::other("refused"));
        }
        self.counters.opened.fetch_add(1, Ordering::SeqCst);
        Ok(CountingConnection(Arc::clone(&self.counters)))
    }
}

#[fixture]
fn provider() -> CappedProvider<CountingFactory> {
    CappedProvider::new(
        NonZeroUsize::new(2).expect("non-zero"),
        Arc::new(CountingFactory::default()),
    )
}

#[rstest]
#[case(0)]
#[case(Semaphore::MAX_PERMITS + 1)]
fn try_new_rejects_unusable_capacity(#[case] capacity: usize) {
    let result = CappedProvider::try_new(capacity, Arc::new(CountingFactory::default()));
    assert!(matches!(result, Err(ProviderError::InvalidCapacity(c)) if c == capacity));
}

#[rstest]
#[tokio::test]
async fn double_close_releases_one_slot(provider: CappedProvider<CountingFactory>) {
    let mut conn = provider
        .acquire(&Context::background())
        .await
        .expect("slot free");
    let _other = provider
        .acquire(&Context::background())
        .await
        .expect("slot free");
    assert_eq!(provider.available(), 0);

    conn.close().await.expect("close");
    conn.close().await.expect("second close is a no-op");

    assert_eq!(provider.available(), 1);
    assert_eq!(provider.factory().counters.closed.load(Ordering::SeqCst), 1);
    assert!(conn.is_closed());
    assert!(!conn.is_alive());
}

#[rstest]
#[tokio::test]
async fn dropping_an_unclosed_connection_releases_its_slot(
    provider: CappedProvider<CountingFactory>,
) {
    let conn = provider
        .acquire(&Context::background())
        .await
        .expect("slot free");
    assert_eq!(provider.in_use(), 1);
    drop(conn);
    assert_eq!(provider.in_use(), 0);
}

#[rstest]
#[tokio::test]
async fn factory_failure_releases_slot(provider: CappedProvider<CountingFactory>) {
    provider.factory().fail.store(true, Ordering::SeqCst);
    for _ in 0..5 {
        let err = provider
            .acquire(&Context::background())
            .await
            .expect_err("factory refuses");
        assert!(matches!(err, ProviderError::Factory(ConnectionError::Other(_))));
    }
    assert_eq!(provider.available(), provider.capacity());
}

#[rstest]
#[tokio::test]
async fn done_context_fails_without_consuming_a_slot(provider: CappedProvider<CountingFactory>) {
    let (ctx, token) = Context::with_cancel();
    token.cancel();
    let err = provider.acquire(&ctx).await.expect_err("context canceled");
    assert!(matches!(
        err,
        ProviderError::CapacityTimeout(crate::context::ContextError::Canceled)
    ));
    assert_eq!(provider.available(), 2);
    assert_eq!(provider.factory().counters.opened.load(Ordering::SeqCst), 0);
}

#[rstest]
#[tokio::test]
async fn close_fails_pending_waiters(provider: CappedProvider<CountingFactory>) {
    let _a = provider.acquire(&Context::background()).await.expect("a");
    let _b = provider.acquire(&Context::background()).await.expect("b");

    let waiter = {
        let provider = provider.clone();
        tokio::spawn(async move { provider.acquire(&Context::background()).await })
    };
    tokio::task::yield_now().await;
    provider.close();

    let result = timeout(Duration::from_secs(1), waiter)
        .await
        .expect("waiter finishes")
        .expect("join");
    assert!(matches!(result, Err(ProviderError::Closed)));
    assert!(provider.is_closed());
}
