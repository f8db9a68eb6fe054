//! Steps for topology monitor behavioural tests.
use cucumber::{given, then, when};
use wireline::monitor::ServerKind;

use crate::world::{MonitorWorld, TestResult};

#[given(expr = "a running monitor for a standalone server at {string}")]
fn given_monitor(world: &mut MonitorWorld, address: String) {
    world.start(ServerKind::Standalone, &address);
}

#[given(expr = "{int} subscriptions to the monitor")]
fn given_subscriptions(world: &mut MonitorWorld, count: usize) -> TestResult {
    world.subscribe(count)
}

#[when("the monitor is stopped")]
async fn when_stopped(world: &mut MonitorWorld) -> TestResult { world.stop().await }

#[when("the server becomes a replica set primary")]
async fn when_primary(world: &mut MonitorWorld) -> TestResult {
    world.change_kind(ServerKind::RsPrimary).await
}

#[then("every subscription ends")]
async fn then_closed(world: &mut MonitorWorld) -> TestResult { world.all_closed().await }

#[then("subscribing again fails")]
fn then_refused(world: &mut MonitorWorld) { assert!(world.subscribe_fails()); }

#[then("the monitor reports it is stopped")]
fn then_stopped(world: &mut MonitorWorld) { assert!(world.is_stopped()); }

#[then("every subscription sees the standalone then the primary state")]
async fn then_ordered(world: &mut MonitorWorld) -> TestResult {
    for kinds in world.kinds_seen().await? {
        assert_eq!(kinds, vec![ServerKind::Standalone, ServerKind::RsPrimary]);
    }
    Ok(())
}
