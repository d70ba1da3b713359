//! Tracks in-flight action futures until the cart settles.
//!
//! Every public action creator dispatches its action and parks a oneshot
//! sender here. When the cart next reaches `Valid` with nothing queued and
//! nothing left in the wrapper's inbox, all parked senders are resolved in
//! FIFO order with the settled cart. Server failures never reject these
//! futures; callers watch the manager's `loading_error` instead.

use shopping_cart_core::cart::ResponseCart;
use shopping_cart_core::state::ShoppingCartState;
use shopping_cart_core::status::CacheStatus;
use tokio::sync::oneshot;

/// FIFO registry of callers waiting for the next settled cart.
#[derive(Default)]
pub struct ActionPromises {
    pending: Vec<oneshot::Sender<ResponseCart>>,
}

impl ActionPromises {
    /// Empty registry.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            pending: Vec::new(),
        }
    }

    /// Park a sender until the cart settles.
    pub fn add(&mut self, sender: oneshot::Sender<ResponseCart>) {
        self.pending.push(sender);
    }

    /// Number of callers still waiting.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// True when no caller is waiting.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Resolve everything if the state is settled: `Valid` and nothing queued.
    ///
    /// Resolution order is registration order. Receivers that were dropped by
    /// their caller are skipped silently.
    pub fn resolve_if_valid(&mut self, state: &ShoppingCartState) {
        if !state.queued_actions.is_empty()
            || state.cache_status != CacheStatus::Valid
            || self.pending.is_empty()
        {
            return;
        }
        tracing::debug!(count = self.pending.len(), "resolving action promises");
        for sender in self.pending.drain(..) {
            let _ = sender.send(state.response_cart.clone());
        }
    }
}
