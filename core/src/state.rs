//! The reducer-owned cart state.

use crate::action::CartAction;
use crate::cart::{empty_response_cart, ResponseCart};
use crate::status::{CacheStatus, CouponStatus, LoadingErrorType};

/// Complete state for one cart key.
///
/// Exactly one instance exists per cart key, owned exclusively by that key's
/// manager wrapper. `response_cart` here is the *working* cart: it absorbs
/// local mutations before they are validated by the server, so consumers are
/// shown the last-valid snapshot instead.
#[derive(Clone, Debug, PartialEq)]
pub struct ShoppingCartState {
    /// The working cart.
    pub response_cart: ResponseCart,
    /// Where this cart sits in its sync lifecycle.
    pub cache_status: CacheStatus,
    /// Lifecycle of the coupon on the working cart.
    pub coupon_status: CouponStatus,
    /// Cart mutations received while the cart was not `Valid`, in submission
    /// order. Replayed by the state-based dispatcher once the cart is valid.
    pub queued_actions: Vec<CartAction>,
    /// Message from the last failed server round-trip, if any.
    pub loading_error: Option<String>,
    /// Classification of the last failed server round-trip, if any.
    pub loading_error_type: Option<LoadingErrorType>,
}

impl ShoppingCartState {
    /// State for a cart that has never been loaded.
    #[must_use]
    pub fn initial() -> Self {
        Self {
            response_cart: empty_response_cart(),
            cache_status: CacheStatus::Fresh,
            coupon_status: CouponStatus::Fresh,
            queued_actions: Vec::new(),
            loading_error: None,
            loading_error_type: None,
        }
    }

    /// True while any local change has not been confirmed by the server.
    #[must_use]
    pub fn is_pending_update(&self) -> bool {
        !self.queued_actions.is_empty() || self.cache_status != CacheStatus::Valid
    }
}
