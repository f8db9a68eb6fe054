//! Steps for capped provider behavioural tests.
use cucumber::{given, then, when};
use wireline::{context::ContextError, provider::ProviderError};

use crate::world::{ProviderWorld, TestResult};

#[given(expr = "a capped provider with capacity {int}")]
fn given_provider(world: &mut ProviderWorld, capacity: usize) { world.create(capacity); }

#[given("the connection factory fails")]
fn given_failing_factory(world: &mut ProviderWorld) { world.fail_factory(); }

#[when(expr = "{int} connections are acquired")]
async fn when_acquired(world: &mut ProviderWorld, count: usize) -> TestResult {
    world.acquire_many(count).await
}

#[when("a caller tries to acquire a connection")]
async fn when_acquire_once(world: &mut ProviderWorld) { world.acquire_once().await; }

#[when("another caller starts waiting for a connection")]
async fn when_waiter(world: &mut ProviderWorld) { world.start_waiter().await; }

#[when("one held connection is closed")]
async fn when_close_one(world: &mut ProviderWorld) -> TestResult { world.close_one().await }

#[when("the waiting caller's context is canceled")]
fn when_cancel(world: &mut ProviderWorld) -> TestResult { world.cancel_waiter() }

#[then("the waiting caller is still blocked")]
async fn then_blocked(world: &mut ProviderWorld) -> TestResult { world.waiter_is_blocked().await }

#[then("the waiting caller fails with a capacity timeout")]
async fn then_timeout(world: &mut ProviderWorld) -> TestResult {
    world.finish_waiter().await?;
    match world.take_outcome()? {
        Err(ProviderError::CapacityTimeout(ContextError::Canceled)) => Ok(()),
        other => Err(format!("expected a capacity timeout, got {other:?}").into()),
    }
}

#[then("the waiting caller receives a connection")]
async fn then_received(world: &mut ProviderWorld) -> TestResult {
    world.finish_waiter().await?;
    world.keep_received()
}

#[then("the caller fails with a factory error")]
fn then_factory_error(world: &mut ProviderWorld) -> TestResult {
    match world.take_outcome()? {
        Err(ProviderError::Factory(_)) => Ok(()),
        other => Err(format!("expected a factory error, got {other:?}").into()),
    }
}

#[then(expr = "{int} slots are in use")]
fn then_in_use(world: &mut ProviderWorld, expected: usize) {
    assert_eq!(world.in_use(), expected);
}
