//! Lifecycle enums for the in-memory cart.

use serde::{Deserialize, Serialize};

/// Where the in-memory cart sits relative to the server.
///
/// Transitions are driven entirely by the reducer:
///
/// - `Fresh` → `FreshPending` → `Valid` (initial load)
/// - `Valid` → `Invalid` → `Pending` → `Valid` (local mutation + sync)
/// - any state → `Error` (failed server round-trip)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CacheStatus {
    /// Nothing has been loaded yet.
    Fresh,
    /// The initial server fetch is in flight.
    FreshPending,
    /// The cart matches the last server response.
    Valid,
    /// Local mutations exist that the server has not seen.
    Invalid,
    /// A sync of local mutations is in flight.
    Pending,
    /// A server round-trip failed.
    Error,
}

impl CacheStatus {
    /// True while the initial load has not completed.
    #[must_use]
    pub const fn is_loading(self) -> bool {
        matches!(self, Self::Fresh | Self::FreshPending)
    }
}

impl std::fmt::Display for CacheStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Fresh => "fresh",
            Self::FreshPending => "fresh-pending",
            Self::Valid => "valid",
            Self::Invalid => "invalid",
            Self::Pending => "pending",
            Self::Error => "error",
        };
        write!(f, "{label}")
    }
}

/// Lifecycle of the coupon attached to the cart.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CouponStatus {
    /// No coupon has been submitted.
    Fresh,
    /// A coupon was submitted and is awaiting server validation.
    Pending,
    /// The server accepted the coupon.
    Applied,
    /// The server declined the coupon.
    Rejected,
    /// The sync carrying the coupon failed.
    Error,
}

impl std::fmt::Display for CouponStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Fresh => "fresh",
            Self::Pending => "pending",
            Self::Applied => "applied",
            Self::Rejected => "rejected",
            Self::Error => "error",
        };
        write!(f, "{label}")
    }
}

/// Broad classification of a failed server round-trip, surfaced alongside the
/// human-readable message on the manager.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoadingErrorType {
    /// The request never completed (connection, timeout, transport).
    Network,
    /// The server rejected the cart contents.
    Validation,
    /// Anything else.
    Unknown,
}

impl std::fmt::Display for LoadingErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Network => "network",
            Self::Validation => "validation",
            Self::Unknown => "unknown",
        };
        write!(f, "{label}")
    }
}
