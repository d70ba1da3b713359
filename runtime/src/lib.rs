//! # Shopping Cart Runtime
//!
//! Async runtime for the shopping-cart state manager: per-cart-key actors
//! around the pure reducer from `shopping-cart-core`, plus the
//! consumer-facing manager API.
//!
//! ## Architecture
//!
//! - [`client::ShoppingCartManagerClient`]: registry of cart managers, one
//!   actor per [`CartKey`](shopping_cart_core::cart::CartKey)
//! - [`manager::ShoppingCartManager`]: immutable per-snapshot facade with
//!   async action creators that resolve once the cart has settled
//! - [`dispatcher::StateBasedDispatcher`]: turns cache-status transitions
//!   into follow-up actions (initial fetch, sync, queued-action replay)
//! - init/sync middleware: spawn connector round-trips and feed fenced
//!   response actions back into the actor
//! - [`subscription::SubscriptionManager`]: change notifications per cart key
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use shopping_cart_core::cart::{CartKey, RequestCartProduct};
//! use shopping_cart_core::connector::CartConnector;
//! use shopping_cart_runtime::client::ShoppingCartManagerClient;
//!
//! # async fn example(connector: Arc<dyn CartConnector>) -> Result<(), Box<dyn std::error::Error>> {
//! let client = ShoppingCartManagerClient::new(connector);
//! let manager = client.for_cart_key(Some(&CartKey::Site(42)));
//! let cart = manager
//!     .add_products_to_cart(vec![RequestCartProduct::new(1009, "personal-bundle")])
//!     .await?;
//! println!("cart total: {}", cart.total_cost_integer);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod dispatcher;
pub mod last_valid;
pub mod manager;
pub mod promises;
pub mod subscription;
mod sync;
mod wrapper;

pub use client::ShoppingCartManagerClient;
pub use manager::ShoppingCartManager;
pub use subscription::{Subscription, SubscriptionManager};
