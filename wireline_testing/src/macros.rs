//! Assertion macros shared by test helpers and integration tests.
//!
//! Every wait is bounded by [`TEST_BOUND`](crate::TEST_BOUND) so a hang
//! fails the test instead of stalling the run.

/// Await the next update on a subscription and panic with the call site if
/// none arrives.
#[macro_export]
macro_rules! recv_expect {
    ($sub:expr) => {{
        ::tokio::time::timeout($crate::TEST_BOUND, $sub.recv())
            .await
            .expect(concat!("no update in time at ", file!(), ":", line!()))
            .expect(concat!("subscription closed at ", file!(), ":", line!()))
    }};
    ($sub:expr, $msg:expr) => {{
        let m = ::std::format!("{msg} at {}:{}", file!(), line!(), msg = $msg);
        ::tokio::time::timeout($crate::TEST_BOUND, $sub.recv())
            .await
            .expect(&m)
            .expect(&m)
    }};
}

/// Drain a subscription and panic if it does not end in time.
#[macro_export]
macro_rules! closed_expect {
    ($sub:expr) => {{
        let drained = ::tokio::time::timeout($crate::TEST_BOUND, async {
            while $sub.recv().await.is_some() {}
        })
        .await;
        assert!(
            drained.is_ok(),
            concat!("subscription still open at ", file!(), ":", line!())
        );
    }};
}

/// Acquire a connection and panic with the call site on failure or hang.
#[macro_export]
macro_rules! acquire_expect {
    ($provider:expr, $ctx:expr) => {{
        ::tokio::time::timeout($crate::TEST_BOUND, $provider.acquire($ctx))
            .await
            .expect(concat!("acquire hung at ", file!(), ":", line!()))
            .expect(concat!("acquire failed at ", file!(), ":", line!()))
    }};
}

pub use crate::{acquire_expect, closed_expect, recv_expect};
