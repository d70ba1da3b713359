//! The consumer-facing manager facade.
//!
//! A [`ShoppingCartManager`] is an immutable view of one cart at one point in
//! time, plus async action creators that dispatch into the cart's actor. Each
//! action creator returns only when the cart has settled again, resolving
//! with the resulting validated cart. Managers are cheap to clone and are
//! memoized per snapshot, so [`same_snapshot`](ShoppingCartManager::same_snapshot)
//! is a reliable "did anything change" check.

use std::sync::Arc;

use shopping_cart_core::action::{CartAction, CartProductUpdate};
use shopping_cart_core::cart::{
    empty_response_cart, CartKey, CartLocation, RequestCartProduct, ResponseCart,
};
use shopping_cart_core::error::CartError;
use shopping_cart_core::status::{CacheStatus, CouponStatus, LoadingErrorType};
use tokio::sync::{mpsc, oneshot};

use crate::subscription::{Subscription, SubscriptionManager};
use crate::wrapper::DispatchMessage;

/// State captured when the manager was built.
pub(crate) struct ManagerSnapshot {
    pub(crate) response_cart: ResponseCart,
    pub(crate) cache_status: CacheStatus,
    pub(crate) coupon_status: CouponStatus,
    pub(crate) loading_error: Option<String>,
    pub(crate) loading_error_type: Option<LoadingErrorType>,
    pub(crate) is_pending_update: bool,
}

/// Where a manager's dispatches go.
enum ManagerHandle {
    /// A real cart: dispatches go to the cart's actor.
    Active {
        cart_key: CartKey,
        tx: mpsc::UnboundedSender<DispatchMessage>,
        subscriptions: SubscriptionManager,
    },
    /// No cart key configured: dispatches fail, subscriptions are inert.
    Noop,
}

struct ManagerInner {
    snapshot: ManagerSnapshot,
    handle: ManagerHandle,
}

/// A point-in-time view of one cart with async action creators.
#[derive(Clone)]
pub struct ShoppingCartManager {
    inner: Arc<ManagerInner>,
}

impl ShoppingCartManager {
    pub(crate) fn active(
        snapshot: ManagerSnapshot,
        cart_key: CartKey,
        tx: mpsc::UnboundedSender<DispatchMessage>,
        subscriptions: SubscriptionManager,
    ) -> Self {
        Self {
            inner: Arc::new(ManagerInner {
                snapshot,
                handle: ManagerHandle::Active {
                    cart_key,
                    tx,
                    subscriptions,
                },
            }),
        }
    }

    /// The manager handed out when no cart key is configured yet. It looks
    /// like a never-loaded empty cart; every action creator returns
    /// [`CartError::MissingCartKey`].
    #[must_use]
    pub(crate) fn noop() -> Self {
        Self {
            inner: Arc::new(ManagerInner {
                snapshot: ManagerSnapshot {
                    response_cart: empty_response_cart(),
                    cache_status: CacheStatus::Fresh,
                    coupon_status: CouponStatus::Fresh,
                    loading_error: None,
                    loading_error_type: None,
                    is_pending_update: true,
                },
                handle: ManagerHandle::Noop,
            }),
        }
    }

    /// The last server-validated cart. Never reflects unconfirmed local
    /// mutations; check [`is_pending_update`](Self::is_pending_update) for
    /// staleness.
    #[must_use]
    pub fn response_cart(&self) -> &ResponseCart {
        &self.inner.snapshot.response_cart
    }

    /// Where the cart sits in its sync lifecycle.
    #[must_use]
    pub fn cache_status(&self) -> CacheStatus {
        self.inner.snapshot.cache_status
    }

    /// Lifecycle of the coupon on the cart.
    #[must_use]
    pub fn coupon_status(&self) -> CouponStatus {
        self.inner.snapshot.coupon_status
    }

    /// True until the initial load has completed.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.inner.snapshot.cache_status.is_loading()
    }

    /// True while any local change has not been confirmed by the server.
    #[must_use]
    pub fn is_pending_update(&self) -> bool {
        self.inner.snapshot.is_pending_update
    }

    /// Message from the last failed server round-trip, if any.
    #[must_use]
    pub fn loading_error(&self) -> Option<&str> {
        self.inner.snapshot.loading_error.as_deref()
    }

    /// Classification of the last failed server round-trip, if any.
    #[must_use]
    pub fn loading_error_type(&self) -> Option<LoadingErrorType> {
        self.inner.snapshot.loading_error_type
    }

    /// Whether two managers view the same snapshot.
    ///
    /// Snapshot memoization makes this an identity check: managers obtained
    /// while no transition happened share their inner state.
    #[must_use]
    pub fn same_snapshot(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Register a callback for every state change of this cart.
    ///
    /// On the no-op manager this returns a detached subscription that never
    /// fires.
    pub fn subscribe(&self, callback: impl Fn() + Send + Sync + 'static) -> Subscription {
        match &self.inner.handle {
            ManagerHandle::Active { subscriptions, .. } => subscriptions.subscribe(callback),
            ManagerHandle::Noop => Subscription::detached(),
        }
    }

    /// Add products to the cart.
    ///
    /// # Errors
    ///
    /// [`CartError::MissingCartKey`] on the no-op manager,
    /// [`CartError::ManagerUnavailable`] if the cart's actor is gone.
    pub async fn add_products_to_cart(
        &self,
        products: Vec<RequestCartProduct>,
    ) -> Result<ResponseCart, CartError> {
        self.dispatch_and_settle(CartAction::AddProductsToCart(products))
            .await
    }

    /// Remove the cart line with this uuid.
    ///
    /// # Errors
    ///
    /// See [`add_products_to_cart`](Self::add_products_to_cart).
    pub async fn remove_product_from_cart(
        &self,
        uuid: impl Into<String>,
    ) -> Result<ResponseCart, CartError> {
        self.dispatch_and_settle(CartAction::RemoveProductFromCart { uuid: uuid.into() })
            .await
    }

    /// Update the cart line with this uuid in place.
    ///
    /// # Errors
    ///
    /// See [`add_products_to_cart`](Self::add_products_to_cart).
    pub async fn replace_product_in_cart(
        &self,
        uuid: impl Into<String>,
        updates: CartProductUpdate,
    ) -> Result<ResponseCart, CartError> {
        self.dispatch_and_settle(CartAction::ReplaceProductInCart {
            uuid: uuid.into(),
            updates,
        })
        .await
    }

    /// Replace the cart contents wholesale.
    ///
    /// # Errors
    ///
    /// See [`add_products_to_cart`](Self::add_products_to_cart).
    pub async fn replace_products_in_cart(
        &self,
        products: Vec<RequestCartProduct>,
    ) -> Result<ResponseCart, CartError> {
        self.dispatch_and_settle(CartAction::ReplaceProductsInCart(products))
            .await
    }

    /// Submit a coupon code for server validation. Whether it was accepted
    /// shows up as `coupon_status` on later snapshots, not as an error here.
    ///
    /// # Errors
    ///
    /// See [`add_products_to_cart`](Self::add_products_to_cart).
    pub async fn apply_coupon(
        &self,
        coupon: impl Into<String>,
    ) -> Result<ResponseCart, CartError> {
        self.dispatch_and_settle(CartAction::ApplyCoupon(coupon.into()))
            .await
    }

    /// Remove any coupon from the cart.
    ///
    /// # Errors
    ///
    /// See [`add_products_to_cart`](Self::add_products_to_cart).
    pub async fn remove_coupon(&self) -> Result<ResponseCart, CartError> {
        self.dispatch_and_settle(CartAction::RemoveCoupon).await
    }

    /// Change the cart's tax location.
    ///
    /// # Errors
    ///
    /// See [`add_products_to_cart`](Self::add_products_to_cart).
    pub async fn update_location(
        &self,
        location: CartLocation,
    ) -> Result<ResponseCart, CartError> {
        self.dispatch_and_settle(CartAction::UpdateLocation(location))
            .await
    }

    /// Throw away local state and re-fetch the cart from the server.
    ///
    /// On the no-op manager this succeeds with the empty cart, since there is
    /// no server state to diverge from.
    ///
    /// # Errors
    ///
    /// [`CartError::ManagerUnavailable`] if the cart's actor is gone.
    pub async fn reload_from_server(&self) -> Result<ResponseCart, CartError> {
        if matches!(self.inner.handle, ManagerHandle::Noop) {
            return Ok(empty_response_cart());
        }
        self.dispatch_and_settle(CartAction::CartReload).await
    }

    /// Dispatch an action and wait for the cart to settle.
    async fn dispatch_and_settle(&self, action: CartAction) -> Result<ResponseCart, CartError> {
        let ManagerHandle::Active { cart_key, tx, .. } = &self.inner.handle else {
            return Err(CartError::MissingCartKey);
        };

        tracing::debug!(cart_key = %cart_key, kind = action.kind(), "dispatching cart action");
        let (resolver, settled) = oneshot::channel();
        tx.send(DispatchMessage {
            action,
            resolver: Some(resolver),
        })
        .map_err(|_| CartError::ManagerUnavailable(cart_key.clone()))?;

        settled
            .await
            .map_err(|_| CartError::ManagerUnavailable(cart_key.clone()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn noop_manager_rejects_actions_with_missing_cart_key() {
        let manager = ShoppingCartManager::noop();
        let result = manager
            .add_products_to_cart(vec![RequestCartProduct::new(1, "personal-bundle")])
            .await;
        assert_eq!(result.unwrap_err(), CartError::MissingCartKey);

        let result = manager.apply_coupon("SAVE10").await;
        assert_eq!(result.unwrap_err(), CartError::MissingCartKey);
    }

    #[tokio::test]
    async fn noop_manager_reload_returns_the_empty_cart() {
        let manager = ShoppingCartManager::noop();
        let cart = manager.reload_from_server().await.unwrap();
        assert!(cart.products.is_empty());
        assert_eq!(cart.total_cost_integer, 0);
    }

    #[test]
    fn noop_manager_looks_like_a_never_loaded_cart() {
        let manager = ShoppingCartManager::noop();
        assert!(manager.is_loading());
        assert!(manager.is_pending_update());
        assert!(manager.loading_error().is_none());
        assert!(manager.response_cart().products.is_empty());
    }

    #[test]
    fn cloned_managers_share_their_snapshot() {
        let manager = ShoppingCartManager::noop();
        let clone = manager.clone();
        assert!(manager.same_snapshot(&clone));
        assert!(!manager.same_snapshot(&ShoppingCartManager::noop()));
    }
}
