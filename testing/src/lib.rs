//! # Shopping Cart Testing
//!
//! Testing utilities for the shopping-cart state manager:
//!
//! - [`MockCartConnector`]: a scriptable in-memory cart server
//! - [`wait::wait_for`] / [`wait::wait_until`]: polling helpers for the
//!   eventually-consistent manager snapshots
//! - [`init_test_tracing`]: tracing setup for integration tests
//!
//! ## Example
//!
//! ```
//! use shopping_cart_testing::MockCartConnector;
//!
//! let connector = MockCartConnector::new()
//!     .with_product_cost(1009, 1000)
//!     .with_coupon("SAVE10", 100);
//! assert_eq!(connector.set_call_count(), 0);
//! ```

pub mod mock_connector;
pub mod wait;

pub use mock_connector::MockCartConnector;
pub use wait::{wait_for, wait_until};

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initialize tracing for tests, honoring `RUST_LOG`. Safe to call from
/// every test; only the first call installs the subscriber.
pub fn init_test_tracing() {
    INIT_TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    });
}
