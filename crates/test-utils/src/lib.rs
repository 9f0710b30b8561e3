//! Shared fixtures for the `dagrun` integration tests.
//!
//! - [`builders`]: task constructors that record what they did.
//! - [`fake_strategy`]: an `ExecutionStrategy` that records instead of running.

pub mod builders;
pub mod fake_strategy;

use std::future::Future;
use std::sync::Once;
use std::time::Duration;

use tracing_subscriber::{fmt, EnvFilter};

static INIT: Once = Once::new();

/// Upper bound for any single awaited step in a test.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Install a test-captured tracing subscriber once per test binary.
///
/// Output only shows for failing tests unless run with `--nocapture`.
/// Override the filter with `RUST_LOG`, e.g. `RUST_LOG=dagrun=debug`.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("dagrun=info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .init();
    });
}

/// Await `f`, failing the test if it takes longer than [`TEST_TIMEOUT`].
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: Future<Output = T>,
{
    tokio::time::timeout(TEST_TIMEOUT, f)
        .await
        .unwrap_or_else(|_| panic!("test step timed out after {TEST_TIMEOUT:?}"))
}
