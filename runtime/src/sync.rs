//! Server round-trips: the init and sync middleware, plus request fencing.
//!
//! Both middleware inspect each action *before* it reaches the reducer and,
//! when the state says a round-trip is due, spawn the connector call on the
//! runtime. Responses come back through the wrapper's action channel as
//! `ReceiveInitialResponseCart` / `ReceiveUpdatedResponseCart` /
//! `RaiseError`, tagged with a fencing id so that responses belonging to an
//! abandoned request (e.g. a reload started meanwhile) are dropped instead of
//! clobbering newer state.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use shopping_cart_core::action::CartAction;
use shopping_cart_core::cart::{empty_response_cart, request_cart_from_response_cart, CartKey};
use shopping_cart_core::connector::CartConnector;
use shopping_cart_core::state::ShoppingCartState;
use shopping_cart_core::status::CacheStatus;
use tokio::sync::mpsc;

use crate::wrapper::DispatchMessage;

/// Monotonic request-id source shared between a wrapper and its middleware.
///
/// Issuing a new id implicitly cancels every outstanding request: the wrapper
/// only admits response actions whose id matches the latest issued one.
#[derive(Clone)]
pub(crate) struct RequestFence {
    current: Arc<AtomicU64>,
}

impl RequestFence {
    pub(crate) fn new() -> Self {
        Self {
            current: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Issue a fresh request id, invalidating all earlier ones.
    pub(crate) fn issue(&self) -> u64 {
        self.current.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_current(&self, request_id: u64) -> bool {
        self.current.load(Ordering::SeqCst) == request_id
    }

    /// Whether the reducer should see this action. Response and error actions
    /// from superseded requests are fenced out; everything else passes.
    pub(crate) fn admits(&self, action: &CartAction) -> bool {
        match action {
            CartAction::ReceiveInitialResponseCart { request_id, .. }
            | CartAction::ReceiveUpdatedResponseCart { request_id, .. }
            | CartAction::RaiseError { request_id, .. } => {
                let current = self.is_current(*request_id);
                if !current {
                    tracing::debug!(
                        request_id,
                        kind = action.kind(),
                        "dropping response from superseded request"
                    );
                }
                current
            }
            _ => true,
        }
    }
}

/// Starts the initial fetch when the dispatcher asks for it.
pub(crate) struct CartInitMiddleware {
    requests: ServerRequests,
}

impl CartInitMiddleware {
    pub(crate) fn new(
        cart_key: CartKey,
        connector: Arc<dyn CartConnector>,
        fence: RequestFence,
        tx: mpsc::UnboundedSender<DispatchMessage>,
    ) -> Self {
        Self {
            requests: ServerRequests {
                cart_key,
                connector,
                fence,
                tx,
            },
        }
    }

    /// Fetch the cart when `GetCartFromServer` arrives with the fetch marked
    /// in flight. The status guard makes a duplicated trigger harmless.
    pub(crate) fn on_action(&self, action: &CartAction, state: &ShoppingCartState) {
        if !matches!(action, CartAction::GetCartFromServer)
            || state.cache_status != CacheStatus::FreshPending
        {
            return;
        }

        let requests = &self.requests;
        let request_id = requests.fence.issue();

        if !requests.cart_key.allows_server_sync() {
            // Placeholder keys never contact the server: their initial cart
            // is the empty cart.
            let mut response = empty_response_cart();
            response.cart_key = Some(requests.cart_key.clone());
            requests.send(CartAction::ReceiveInitialResponseCart {
                request_id,
                response,
            });
            return;
        }

        tracing::debug!(cart_key = %requests.cart_key, request_id, "fetching initial cart");
        metrics::counter!("cart_server_requests_total", "kind" => "get").increment(1);

        let cart_key = requests.cart_key.clone();
        let connector = Arc::clone(&requests.connector);
        let tx = requests.tx.clone();
        tokio::spawn(async move {
            let action = match connector.get_cart(cart_key).await {
                Ok(response) => CartAction::ReceiveInitialResponseCart {
                    request_id,
                    response,
                },
                Err(error) => {
                    metrics::counter!("cart_server_request_failures_total", "kind" => "get")
                        .increment(1);
                    CartAction::RaiseError {
                        request_id,
                        error_type: error.loading_error_type(),
                        message: error.to_string(),
                    }
                }
            };
            let _ = tx.send(DispatchMessage::internal(action));
        });
    }
}

/// Pushes local mutations to the server when the dispatcher asks for it.
pub(crate) struct CartSyncMiddleware {
    requests: ServerRequests,
}

impl CartSyncMiddleware {
    pub(crate) fn new(
        cart_key: CartKey,
        connector: Arc<dyn CartConnector>,
        fence: RequestFence,
        tx: mpsc::UnboundedSender<DispatchMessage>,
    ) -> Self {
        Self {
            requests: ServerRequests {
                cart_key,
                connector,
                fence,
                tx,
            },
        }
    }

    /// Sync the working cart when `SyncCartToServer` arrives with a sync
    /// marked in flight.
    pub(crate) fn on_action(&self, action: &CartAction, state: &ShoppingCartState) {
        if !matches!(action, CartAction::SyncCartToServer)
            || state.cache_status != CacheStatus::Pending
        {
            return;
        }

        let requests = &self.requests;
        let request_id = requests.fence.issue();

        if !requests.cart_key.allows_server_sync() {
            // Placeholder keys treat the local cart as authoritative; a
            // non-empty coupon counts as applied since no server can reject it.
            let mut response = state.response_cart.clone();
            response.cart_key = Some(requests.cart_key.clone());
            response.is_coupon_applied = !response.coupon.is_empty();
            requests.send(CartAction::ReceiveUpdatedResponseCart {
                request_id,
                response,
            });
            return;
        }

        tracing::debug!(cart_key = %requests.cart_key, request_id, "syncing cart to server");
        metrics::counter!("cart_server_requests_total", "kind" => "set").increment(1);

        let request_cart = request_cart_from_response_cart(&state.response_cart);
        let cart_key = requests.cart_key.clone();
        let connector = Arc::clone(&requests.connector);
        let tx = requests.tx.clone();
        tokio::spawn(async move {
            let action = match connector.set_cart(cart_key, request_cart).await {
                Ok(response) => CartAction::ReceiveUpdatedResponseCart {
                    request_id,
                    response,
                },
                Err(error) => {
                    metrics::counter!("cart_server_request_failures_total", "kind" => "set")
                        .increment(1);
                    CartAction::RaiseError {
                        request_id,
                        error_type: error.loading_error_type(),
                        message: error.to_string(),
                    }
                }
            };
            let _ = tx.send(DispatchMessage::internal(action));
        });
    }
}

/// Shared plumbing for spawning connector calls and routing responses back.
struct ServerRequests {
    cart_key: CartKey,
    connector: Arc<dyn CartConnector>,
    fence: RequestFence,
    tx: mpsc::UnboundedSender<DispatchMessage>,
}

impl ServerRequests {
    fn send(&self, action: CartAction) {
        // The receiver only closes when the wrapper is dropped, at which
        // point nobody is listening for this response anyway.
        let _ = self.tx.send(DispatchMessage::internal(action));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use futures::future::BoxFuture;
    use shopping_cart_core::cart::{RequestCart, ResponseCart};
    use shopping_cart_core::connector::CartConnectorError;
    use shopping_cart_core::status::LoadingErrorType;

    struct FixedConnector {
        get_result: Result<ResponseCart, CartConnectorError>,
        set_result: Result<ResponseCart, CartConnectorError>,
    }

    impl CartConnector for FixedConnector {
        fn get_cart(
            &self,
            _cart_key: CartKey,
        ) -> BoxFuture<'_, Result<ResponseCart, CartConnectorError>> {
            let result = self.get_result.clone();
            Box::pin(async move { result })
        }

        fn set_cart(
            &self,
            _cart_key: CartKey,
            _cart: RequestCart,
        ) -> BoxFuture<'_, Result<ResponseCart, CartConnectorError>> {
            let result = self.set_result.clone();
            Box::pin(async move { result })
        }
    }

    fn connector_returning(cart: ResponseCart) -> Arc<dyn CartConnector> {
        Arc::new(FixedConnector {
            get_result: Ok(cart.clone()),
            set_result: Ok(cart),
        })
    }

    #[tokio::test]
    async fn init_middleware_fetches_only_while_fresh_pending() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut cart = empty_response_cart();
        cart.total_cost_integer = 123;
        let middleware = CartInitMiddleware::new(
            CartKey::Site(1),
            connector_returning(cart),
            RequestFence::new(),
            tx,
        );

        // Wrong status: nothing happens.
        let mut state = ShoppingCartState::initial();
        middleware.on_action(&CartAction::GetCartFromServer, &state);
        assert!(rx.try_recv().is_err());

        state.cache_status = CacheStatus::FreshPending;
        middleware.on_action(&CartAction::GetCartFromServer, &state);
        let message = rx.recv().await.unwrap();
        match message.action {
            CartAction::ReceiveInitialResponseCart { response, .. } => {
                assert_eq!(response.total_cost_integer, 123);
            }
            other => panic!("unexpected action: {other:?}"),
        }
    }

    #[tokio::test]
    async fn init_middleware_short_circuits_placeholder_keys() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let connector = Arc::new(FixedConnector {
            get_result: Err(CartConnectorError::Network("must not be called".into())),
            set_result: Err(CartConnectorError::Network("must not be called".into())),
        });
        let middleware =
            CartInitMiddleware::new(CartKey::NoUser, connector, RequestFence::new(), tx);

        let mut state = ShoppingCartState::initial();
        state.cache_status = CacheStatus::FreshPending;
        middleware.on_action(&CartAction::GetCartFromServer, &state);

        let message = rx.recv().await.unwrap();
        match message.action {
            CartAction::ReceiveInitialResponseCart { response, .. } => {
                assert!(response.products.is_empty());
                assert_eq!(response.cart_key, Some(CartKey::NoUser));
            }
            other => panic!("unexpected action: {other:?}"),
        }
    }

    #[tokio::test]
    async fn sync_middleware_reports_errors_as_raise_error() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let connector = Arc::new(FixedConnector {
            get_result: Ok(empty_response_cart()),
            set_result: Err(CartConnectorError::Validation("bad coupon".into())),
        });
        let middleware =
            CartSyncMiddleware::new(CartKey::Site(1), connector, RequestFence::new(), tx);

        let mut state = ShoppingCartState::initial();
        state.cache_status = CacheStatus::Pending;
        middleware.on_action(&CartAction::SyncCartToServer, &state);

        let message = rx.recv().await.unwrap();
        match message.action {
            CartAction::RaiseError { error_type, message, .. } => {
                assert_eq!(error_type, LoadingErrorType::Validation);
                assert!(message.contains("bad coupon"));
            }
            other => panic!("unexpected action: {other:?}"),
        }
    }

    #[tokio::test]
    async fn sync_middleware_echoes_local_cart_for_placeholder_keys() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let connector = Arc::new(FixedConnector {
            get_result: Err(CartConnectorError::Network("must not be called".into())),
            set_result: Err(CartConnectorError::Network("must not be called".into())),
        });
        let middleware =
            CartSyncMiddleware::new(CartKey::NoSite, connector, RequestFence::new(), tx);

        let mut state = ShoppingCartState::initial();
        state.cache_status = CacheStatus::Pending;
        state.response_cart.coupon = "LOCAL".to_string();
        middleware.on_action(&CartAction::SyncCartToServer, &state);

        let message = rx.recv().await.unwrap();
        match message.action {
            CartAction::ReceiveUpdatedResponseCart { response, .. } => {
                assert!(response.is_coupon_applied);
                assert_eq!(response.coupon, "LOCAL");
            }
            other => panic!("unexpected action: {other:?}"),
        }
    }

    #[test]
    fn fence_admits_only_the_latest_request() {
        let fence = RequestFence::new();
        let stale = fence.issue();
        let fresh = fence.issue();

        let stale_action = CartAction::RaiseError {
            request_id: stale,
            error_type: LoadingErrorType::Network,
            message: "late".into(),
        };
        let fresh_action = CartAction::ReceiveInitialResponseCart {
            request_id: fresh,
            response: empty_response_cart(),
        };

        assert!(!fence.admits(&stale_action));
        assert!(fence.admits(&fresh_action));
        assert!(fence.admits(&CartAction::RemoveCoupon));
    }
}
