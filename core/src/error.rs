//! Errors surfaced by the public manager API.

use crate::cart::CartKey;
use thiserror::Error;

/// Errors returned by manager action creators.
///
/// Server failures are deliberately NOT represented here: a failed sync
/// surfaces through the manager's `loading_error` fields while the action's
/// future keeps waiting for the next valid cart. These errors cover the cases
/// where an action can never complete at all.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CartError {
    /// An action was taken on the no-op manager (no cart key configured).
    #[error("cart actions cannot be taken without a cart key")]
    MissingCartKey,

    /// The manager's background task is gone (runtime shut down).
    #[error("the cart manager for cart key {0} is no longer running")]
    ManagerUnavailable(CartKey),
}
