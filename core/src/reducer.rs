//! The pure shopping-cart reducer.
//!
//! `(State, Action) → State`, no I/O, no clocks, no randomness. The input
//! state is never mutated; callers receive a new value. Actions the reducer
//! does not recognize as state transitions (the middleware triggers
//! `GetCartFromServer` / `SyncCartToServer`) return the state unchanged.
//!
//! Cart mutations dispatched while the cart is not `Valid` are appended to
//! `queued_actions` in submission order - never applied, never reordered,
//! never deduplicated. The state-based dispatcher replays them later.

use crate::action::{CartAction, CartProductUpdate};
use crate::cart::{response_product_from_request_product, RequestCartProduct, ResponseCart};
use crate::state::ShoppingCartState;
use crate::status::{CacheStatus, CouponStatus};

/// Compute the next cart state for an action.
#[must_use]
pub fn shopping_cart_reducer(state: &ShoppingCartState, action: &CartAction) -> ShoppingCartState {
    if action.is_cart_mutation() && state.cache_status != CacheStatus::Valid {
        let mut next = state.clone();
        next.queued_actions.push(action.clone());
        return next;
    }

    match action {
        CartAction::AddProductsToCart(products) => {
            apply_mutation(state, |cart| add_products(cart, products))
        }
        CartAction::RemoveProductFromCart { uuid } => {
            let exists = state.response_cart.products.iter().any(|p| &p.uuid == uuid);
            if !exists {
                return state.clone();
            }
            apply_mutation(state, |cart| {
                cart.products.retain(|p| &p.uuid != uuid);
            })
        }
        CartAction::ReplaceProductInCart { uuid, updates } => {
            let exists = state.response_cart.products.iter().any(|p| &p.uuid == uuid);
            if !exists {
                return state.clone();
            }
            apply_mutation(state, |cart| replace_product(cart, uuid, updates))
        }
        CartAction::ReplaceProductsInCart(products) => apply_mutation(state, |cart| {
            cart.products.clear();
            add_products(cart, products);
        }),
        CartAction::ApplyCoupon(coupon) => {
            let mut next = apply_mutation(state, |cart| {
                cart.coupon.clone_from(coupon);
                cart.is_coupon_applied = false;
            });
            next.coupon_status = CouponStatus::Pending;
            next
        }
        CartAction::RemoveCoupon => {
            let mut next = apply_mutation(state, |cart| {
                cart.coupon.clear();
                cart.is_coupon_applied = false;
            });
            next.coupon_status = CouponStatus::Fresh;
            next
        }
        CartAction::UpdateLocation(location) => apply_mutation(state, |cart| {
            cart.tax.location = location.clone();
        }),
        CartAction::CartReload => {
            let mut next = state.clone();
            next.cache_status = CacheStatus::Fresh;
            next.loading_error = None;
            next.loading_error_type = None;
            next
        }
        CartAction::FetchInitialResponseCart => {
            let mut next = state.clone();
            next.cache_status = CacheStatus::FreshPending;
            next
        }
        CartAction::ReceiveInitialResponseCart { response, .. } => {
            let mut next = state.clone();
            next.response_cart = response.clone();
            next.cache_status = CacheStatus::Valid;
            next.loading_error = None;
            next.loading_error_type = None;
            next
        }
        CartAction::RequestUpdatedResponseCart => {
            let mut next = state.clone();
            next.cache_status = CacheStatus::Pending;
            next
        }
        CartAction::ReceiveUpdatedResponseCart { response, .. } => {
            let mut next = state.clone();
            if next.coupon_status == CouponStatus::Pending {
                next.coupon_status = if response.is_coupon_applied {
                    CouponStatus::Applied
                } else {
                    CouponStatus::Rejected
                };
            }
            next.response_cart = response.clone();
            next.cache_status = CacheStatus::Valid;
            next.loading_error = None;
            next.loading_error_type = None;
            next
        }
        CartAction::RaiseError {
            error_type,
            message,
            ..
        } => {
            let mut next = state.clone();
            next.cache_status = CacheStatus::Error;
            if next.coupon_status == CouponStatus::Pending {
                next.coupon_status = CouponStatus::Error;
            }
            next.loading_error = Some(message.clone());
            next.loading_error_type = Some(*error_type);
            next
        }
        CartAction::ClearQueuedActions => {
            let mut next = state.clone();
            next.queued_actions.clear();
            next
        }
        // Middleware triggers carry no state transition.
        CartAction::GetCartFromServer | CartAction::SyncCartToServer => state.clone(),
    }
}

/// Apply a working-cart edit and mark the cart `Invalid` so the dispatcher
/// schedules a sync.
fn apply_mutation(
    state: &ShoppingCartState,
    edit: impl FnOnce(&mut ResponseCart),
) -> ShoppingCartState {
    let mut next = state.clone();
    edit(&mut next.response_cart);
    next.cache_status = CacheStatus::Invalid;
    next
}

fn add_products(cart: &mut ResponseCart, products: &[RequestCartProduct]) {
    let currency = cart.currency.clone();
    for product in products {
        let position = cart.products.len();
        cart.products
            .push(response_product_from_request_product(product, position, &currency));
    }
}

fn replace_product(cart: &mut ResponseCart, uuid: &str, updates: &CartProductUpdate) {
    for product in &mut cart.products {
        if product.uuid != uuid {
            continue;
        }
        if let Some(product_id) = updates.product_id {
            product.product_id = product_id;
        }
        if let Some(product_slug) = &updates.product_slug {
            product.product_slug.clone_from(product_slug);
        }
        if let Some(volume) = updates.volume {
            product.volume = volume;
        }
        if let Some(quantity) = updates.quantity {
            product.quantity = Some(quantity);
        }
        if let Some(meta) = &updates.meta {
            product.meta.clone_from(meta);
        }
    }
}
