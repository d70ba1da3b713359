//! The injected server boundary.
//!
//! The entire external surface of the cart manager is this pair of calls:
//! fetch the authoritative cart, and push a locally mutated cart to be merged
//! back. Everything else is in-memory state transition bookkeeping.

use crate::cart::{CartKey, RequestCart, ResponseCart};
use crate::status::LoadingErrorType;
use futures::future::BoxFuture;
use thiserror::Error;

/// Errors a [`CartConnector`] implementation can return.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CartConnectorError {
    /// The request never completed.
    #[error("network error talking to the cart endpoint: {0}")]
    Network(String),

    /// The server rejected the submitted cart.
    #[error("cart validation failed: {0}")]
    Validation(String),

    /// Anything else.
    #[error("cart request failed: {0}")]
    Unknown(String),
}

impl CartConnectorError {
    /// Classification surfaced on the manager's `loading_error_type`.
    #[must_use]
    pub const fn loading_error_type(&self) -> LoadingErrorType {
        match self {
            Self::Network(_) => LoadingErrorType::Network,
            Self::Validation(_) => LoadingErrorType::Validation,
            Self::Unknown(_) => LoadingErrorType::Unknown,
        }
    }
}

/// Server I/O for one or more cart keys.
///
/// # Dyn Compatibility
///
/// This trait uses [`BoxFuture`] returns instead of `async fn` so it can be
/// held as `Arc<dyn CartConnector>` and captured by the middleware's spawned
/// request tasks.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; requests for different cart keys may
/// be in flight concurrently.
pub trait CartConnector: Send + Sync {
    /// Fetch the authoritative cart for a key.
    ///
    /// # Errors
    ///
    /// Returns a [`CartConnectorError`] when the fetch fails; the runtime
    /// converts it into an error action rather than propagating it.
    fn get_cart(&self, cart_key: CartKey) -> BoxFuture<'_, Result<ResponseCart, CartConnectorError>>;

    /// Push local mutations and receive the server's merged-back cart.
    ///
    /// # Errors
    ///
    /// Returns a [`CartConnectorError`] when the sync fails; the runtime
    /// converts it into an error action rather than propagating it.
    fn set_cart(
        &self,
        cart_key: CartKey,
        cart: RequestCart,
    ) -> BoxFuture<'_, Result<ResponseCart, CartConnectorError>>;
}
