//! A scriptable in-memory cart server.
//!
//! The default behavior models a well-behaved server: `get_cart` returns the
//! empty cart, `set_cart` validates the submitted cart by pricing each line
//! from a configured cost table, assigning server uuids, and applying any
//! coupon the mock was told to accept. Individual calls can be overridden
//! with handlers for failure injection and custom responses.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use futures::future::BoxFuture;
use shopping_cart_core::cart::{
    empty_response_cart, CartKey, RequestCart, ResponseCart, ResponseCartProduct,
};
use shopping_cart_core::connector::{CartConnector, CartConnectorError};

type GetHandler =
    Box<dyn FnMut(&CartKey) -> Result<ResponseCart, CartConnectorError> + Send>;
type SetHandler =
    Box<dyn FnMut(&CartKey, &RequestCart) -> Result<ResponseCart, CartConnectorError> + Send>;

/// Mock implementation of [`CartConnector`] for tests.
pub struct MockCartConnector {
    product_costs: HashMap<u64, u64>,
    accepted_coupons: HashMap<String, u64>,
    latency: Option<Duration>,
    get_handler: Mutex<Option<GetHandler>>,
    set_handler: Mutex<Option<SetHandler>>,
    get_calls: AtomicUsize,
    set_calls: AtomicUsize,
    set_requests: Mutex<Vec<(CartKey, RequestCart)>>,
}

impl MockCartConnector {
    /// A connector with the default well-behaved server semantics.
    #[must_use]
    pub fn new() -> Self {
        Self {
            product_costs: HashMap::new(),
            accepted_coupons: HashMap::new(),
            latency: None,
            get_handler: Mutex::new(None),
            set_handler: Mutex::new(None),
            get_calls: AtomicUsize::new(0),
            set_calls: AtomicUsize::new(0),
            set_requests: Mutex::new(Vec::new()),
        }
    }

    /// Price a product id at this per-unit cost. Unknown products cost zero.
    #[must_use]
    pub fn with_product_cost(mut self, product_id: u64, cost_integer: u64) -> Self {
        self.product_costs.insert(product_id, cost_integer);
        self
    }

    /// Accept this coupon code with a fixed savings amount. Any other
    /// non-empty coupon is rejected (validated cart, coupon not applied).
    #[must_use]
    pub fn with_coupon(mut self, code: impl Into<String>, savings_integer: u64) -> Self {
        self.accepted_coupons.insert(code.into(), savings_integer);
        self
    }

    /// Sleep this long before answering each request.
    #[must_use]
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Override `get_cart` entirely.
    #[must_use]
    pub fn with_get_handler(
        self,
        handler: impl FnMut(&CartKey) -> Result<ResponseCart, CartConnectorError> + Send + 'static,
    ) -> Self {
        *self
            .get_handler
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(Box::new(handler));
        self
    }

    /// Override `set_cart` entirely.
    #[must_use]
    pub fn with_set_handler(
        self,
        handler: impl FnMut(&CartKey, &RequestCart) -> Result<ResponseCart, CartConnectorError>
        + Send
        + 'static,
    ) -> Self {
        *self
            .set_handler
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(Box::new(handler));
        self
    }

    /// How many times `get_cart` was called.
    #[must_use]
    pub fn get_call_count(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    /// How many times `set_cart` was called.
    #[must_use]
    pub fn set_call_count(&self) -> usize {
        self.set_calls.load(Ordering::SeqCst)
    }

    /// Every cart submitted through `set_cart`, in call order.
    #[must_use]
    pub fn set_requests(&self) -> Vec<(CartKey, RequestCart)> {
        self.set_requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The default server validation: price every line, assign server uuids,
    /// settle the coupon, and total the cart.
    fn validate(&self, cart_key: &CartKey, request: &RequestCart) -> ResponseCart {
        let mut response = empty_response_cart();
        response.cart_key = Some(cart_key.clone());
        response.currency = request.currency.clone();
        response.locale = request.locale.clone();
        response.tax = request.tax.clone();

        for (position, product) in request.products.iter().enumerate() {
            let unit_cost = self.product_costs.get(&product.product_id).copied().unwrap_or(0);
            let subtotal = unit_cost * u64::from(product.volume);
            response.products.push(ResponseCartProduct {
                uuid: format!("server-{position}"),
                product_id: product.product_id,
                product_slug: product.product_slug.clone(),
                product_name: product.product_slug.clone(),
                currency: request.currency.clone(),
                volume: product.volume,
                quantity: product.quantity,
                item_subtotal_integer: subtotal,
                meta: product.meta.clone(),
                extra: product.extra.clone(),
            });
            response.sub_total_integer += subtotal;
        }

        response.coupon = request.coupon.clone();
        if !request.coupon.is_empty() {
            if let Some(savings) = self.accepted_coupons.get(&request.coupon) {
                response.is_coupon_applied = true;
                response.coupon_savings_integer = (*savings).min(response.sub_total_integer);
            }
        }

        response.total_cost_integer =
            response.sub_total_integer - response.coupon_savings_integer + response.total_tax_integer;
        response
    }
}

impl Default for MockCartConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl CartConnector for MockCartConnector {
    fn get_cart(
        &self,
        cart_key: CartKey,
    ) -> BoxFuture<'_, Result<ResponseCart, CartConnectorError>> {
        Box::pin(async move {
            if let Some(latency) = self.latency {
                tokio::time::sleep(latency).await;
            }
            self.get_calls.fetch_add(1, Ordering::SeqCst);

            let mut handler = self
                .get_handler
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if let Some(handler) = handler.as_mut() {
                return handler(&cart_key);
            }
            let mut cart = empty_response_cart();
            cart.cart_key = Some(cart_key);
            Ok(cart)
        })
    }

    fn set_cart(
        &self,
        cart_key: CartKey,
        cart: RequestCart,
    ) -> BoxFuture<'_, Result<ResponseCart, CartConnectorError>> {
        Box::pin(async move {
            if let Some(latency) = self.latency {
                tokio::time::sleep(latency).await;
            }
            self.set_calls.fetch_add(1, Ordering::SeqCst);
            self.set_requests
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push((cart_key.clone(), cart.clone()));

            let mut handler = self
                .set_handler
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if let Some(handler) = handler.as_mut() {
                return handler(&cart_key, &cart);
            }
            Ok(self.validate(&cart_key, &cart))
        })
    }
}
