//! Cart actions - the unified input type for the reducer.
//!
//! Actions fall into three groups:
//!
//! - **Cart mutations** (add/remove/replace products, coupon, location): applied
//!   to the working cart when it is `Valid`, queued otherwise
//! - **Sync lifecycle** (fetch/receive/request/sync/receive-updated): emitted by
//!   the state-based dispatcher and the middleware, never by consumers
//! - **Bookkeeping** (`RaiseError`, `ClearQueuedActions`)

use crate::cart::{CartLocation, RequestCartProduct, ResponseCart};
use crate::status::LoadingErrorType;
use serde::{Deserialize, Serialize};

/// A partial update applied to an existing cart line.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CartProductUpdate {
    /// Replace the line's product id (e.g. plan upgrade in place).
    pub product_id: Option<u64>,
    /// Replace the line's product slug.
    pub product_slug: Option<String>,
    /// Replace the line's volume.
    pub volume: Option<u32>,
    /// Replace the line's quantity.
    pub quantity: Option<u32>,
    /// Replace the line's meta.
    pub meta: Option<String>,
}

/// All possible inputs to the shopping-cart reducer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum CartAction {
    /// Add products to the working cart.
    AddProductsToCart(Vec<RequestCartProduct>),
    /// Remove the cart line with this uuid.
    RemoveProductFromCart {
        /// Uuid of the line to remove.
        uuid: String,
    },
    /// Update the cart line with this uuid in place.
    ReplaceProductInCart {
        /// Uuid of the line to update.
        uuid: String,
        /// Fields to change.
        updates: CartProductUpdate,
    },
    /// Replace the cart contents wholesale.
    ReplaceProductsInCart(Vec<RequestCartProduct>),
    /// Submit a coupon code for server validation.
    ApplyCoupon(String),
    /// Remove any coupon from the cart.
    RemoveCoupon,
    /// Change the cart's tax location.
    UpdateLocation(CartLocation),
    /// Throw away local state and re-fetch the cart from the server.
    CartReload,
    /// Mark the initial fetch as in flight (`Fresh` → `FreshPending`).
    FetchInitialResponseCart,
    /// Trigger the init middleware to contact the server. No state change.
    GetCartFromServer,
    /// The initial server cart arrived.
    ReceiveInitialResponseCart {
        /// Fencing id of the request that produced this response.
        request_id: u64,
        /// The authoritative cart.
        response: ResponseCart,
    },
    /// Mark a sync as in flight (`Invalid` → `Pending`).
    RequestUpdatedResponseCart,
    /// Trigger the sync middleware to push local mutations. No state change.
    SyncCartToServer,
    /// The server's merged-back cart arrived after a sync.
    ReceiveUpdatedResponseCart {
        /// Fencing id of the request that produced this response.
        request_id: u64,
        /// The authoritative cart.
        response: ResponseCart,
    },
    /// A server round-trip failed.
    RaiseError {
        /// Fencing id of the request that failed.
        request_id: u64,
        /// Classification of the failure.
        error_type: LoadingErrorType,
        /// Human-readable message for the manager's `loading_error`.
        message: String,
    },
    /// Drop the queued-actions list (just before replaying it).
    ClearQueuedActions,
}

impl CartAction {
    /// Whether this action mutates the working cart and is therefore subject
    /// to queueing while the cart is not `Valid`.
    #[must_use]
    pub const fn is_cart_mutation(&self) -> bool {
        matches!(
            self,
            Self::AddProductsToCart(_)
                | Self::RemoveProductFromCart { .. }
                | Self::ReplaceProductInCart { .. }
                | Self::ReplaceProductsInCart(_)
                | Self::ApplyCoupon(_)
                | Self::RemoveCoupon
                | Self::UpdateLocation(_)
        )
    }

    /// Stable label for logging and metrics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::AddProductsToCart(_) => "add_products_to_cart",
            Self::RemoveProductFromCart { .. } => "remove_product_from_cart",
            Self::ReplaceProductInCart { .. } => "replace_product_in_cart",
            Self::ReplaceProductsInCart(_) => "replace_products_in_cart",
            Self::ApplyCoupon(_) => "apply_coupon",
            Self::RemoveCoupon => "remove_coupon",
            Self::UpdateLocation(_) => "update_location",
            Self::CartReload => "cart_reload",
            Self::FetchInitialResponseCart => "fetch_initial_response_cart",
            Self::GetCartFromServer => "get_cart_from_server",
            Self::ReceiveInitialResponseCart { .. } => "receive_initial_response_cart",
            Self::RequestUpdatedResponseCart => "request_updated_response_cart",
            Self::SyncCartToServer => "sync_cart_to_server",
            Self::ReceiveUpdatedResponseCart { .. } => "receive_updated_response_cart",
            Self::RaiseError { .. } => "raise_error",
            Self::ClearQueuedActions => "clear_queued_actions",
        }
    }
}
