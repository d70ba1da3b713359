//! # Shopping Cart Core
//!
//! Core types and pure logic for the shopping-cart state manager.
//!
//! This crate provides the fundamental abstractions shared by the runtime:
//!
//! - **Cart data model**: the authoritative [`cart::ResponseCart`] returned by
//!   the server and the [`cart::RequestCart`] shape pushed to it
//! - **Status enums**: [`status::CacheStatus`] and [`status::CouponStatus`]
//!   describing where the in-memory cart sits in its sync lifecycle
//! - **Actions**: [`action::CartAction`], the unified input type for the reducer
//! - **Reducer**: [`reducer::shopping_cart_reducer`], a pure function
//!   `(State, Action) → State`
//! - **Connector**: [`connector::CartConnector`], the injected server boundary
//!
//! ## Architecture Principles
//!
//! - Functional Core, Imperative Shell: everything in this crate is pure and
//!   synchronous; all I/O lives behind the [`connector::CartConnector`] trait
//!   and is driven by the runtime crate
//! - Unidirectional data flow: actions in, state out
//! - Cart mutations made while the cart is not `Valid` are queued, never applied
//!
//! ## Example
//!
//! ```
//! use shopping_cart_core::action::CartAction;
//! use shopping_cart_core::reducer::shopping_cart_reducer;
//! use shopping_cart_core::state::ShoppingCartState;
//! use shopping_cart_core::status::CacheStatus;
//!
//! let state = ShoppingCartState::initial();
//! let next = shopping_cart_reducer(&state, &CartAction::FetchInitialResponseCart);
//! assert_eq!(next.cache_status, CacheStatus::FreshPending);
//! ```

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use serde::{Deserialize, Serialize};

pub mod action;
pub mod cart;
pub mod connector;
pub mod error;
pub mod reducer;
pub mod state;
pub mod status;

pub use action::CartAction;
pub use cart::{CartKey, RequestCart, RequestCartProduct, ResponseCart, ResponseCartProduct};
pub use connector::{CartConnector, CartConnectorError};
pub use error::CartError;
pub use reducer::shopping_cart_reducer;
pub use state::ShoppingCartState;
pub use status::{CacheStatus, CouponStatus, LoadingErrorType};
