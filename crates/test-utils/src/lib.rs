//! Fixtures shared by the `assetflow` integration tests: temp source trees
//! with controlled mtimes and small filters that record what they did.

pub mod builders;
pub mod fake_filters;

use std::sync::Once;

use tracing_subscriber::{EnvFilter, fmt};

static TRACING: Once = Once::new();

/// Route build logs into the test harness capture.
///
/// Defaults to `assetflow=debug` so a failing test shows which tasks ran and
/// why; override with `RUST_LOG`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("warn,assetflow=debug"));
        let _ = fmt().with_env_filter(filter).with_test_writer().try_init();
    });
}
