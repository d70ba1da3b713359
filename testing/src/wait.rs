//! Polling helpers for eventually-consistent state.
//!
//! Cart snapshots update asynchronously as the actor processes actions, so
//! tests poll instead of sleeping for fixed durations.

use std::time::Duration;

/// How long [`wait_for`] and [`wait_until`] poll before giving up.
pub const WAIT_TIMEOUT: Duration = Duration::from_secs(5);

/// Poll until the closure returns `Some`, yielding to the runtime between
/// attempts.
///
/// # Panics
///
/// Panics if the condition does not hold within [`WAIT_TIMEOUT`].
pub async fn wait_for<T>(mut poll: impl FnMut() -> Option<T>) -> T {
    let deadline = tokio::time::Instant::now() + WAIT_TIMEOUT;
    loop {
        if let Some(value) = poll() {
            return value;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not reached within {WAIT_TIMEOUT:?}"
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

/// Poll until the predicate holds.
///
/// # Panics
///
/// Panics if the predicate does not hold within [`WAIT_TIMEOUT`].
pub async fn wait_until(mut predicate: impl FnMut() -> bool) {
    wait_for(move || predicate().then_some(())).await;
}
