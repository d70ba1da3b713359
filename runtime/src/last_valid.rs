//! Cache of the most recent fully-validated cart.
//!
//! Local mutations make the working cart transient and incomplete (the server
//! may change it significantly during validation), so optimistic display is
//! not possible. Consumers are shown this snapshot instead and use
//! `is_pending_update` to know when it is stale.

use shopping_cart_core::cart::ResponseCart;
use shopping_cart_core::state::ShoppingCartState;
use shopping_cart_core::status::CacheStatus;

/// Holds the last cart the server confirmed, for one cart key.
pub struct LastValidCartCache {
    cart: ResponseCart,
}

impl LastValidCartCache {
    /// Seed the cache from the wrapper's initial state.
    #[must_use]
    pub fn new(state: &ShoppingCartState) -> Self {
        Self {
            cart: state.response_cart.clone(),
        }
    }

    /// Adopt the working cart when the state is fully settled: nothing queued
    /// and the server has confirmed everything.
    pub fn update(&mut self, state: &ShoppingCartState) {
        if state.queued_actions.is_empty() && state.cache_status == CacheStatus::Valid {
            self.cart = state.response_cart.clone();
        }
    }

    /// The last server-confirmed cart.
    #[must_use]
    pub const fn cart(&self) -> &ResponseCart {
        &self.cart
    }
}
