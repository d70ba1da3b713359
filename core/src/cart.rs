//! Cart data model: keys, server carts, request carts, and conversions.
//!
//! Two cart shapes exist on purpose. The [`ResponseCart`] is the authoritative,
//! server-validated cart with totals and tax filled in. The [`RequestCart`] is
//! the shape the client pushes to the server when syncing local mutations; the
//! server responds with a fresh `ResponseCart`. Locally mutated carts carry
//! temporary product uuids until the server replaces them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque identifier selecting which cart a manager operates on.
///
/// `NoUser` and `NoSite` are placeholder keys used before a real site or user
/// exists. They never contact the server: the runtime short-circuits their
/// initial load to the empty cart and echoes local mutations back as
/// authoritative.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CartKey {
    /// A real site cart, identified by blog/site id.
    Site(u64),
    /// Placeholder cart for a visitor with no account.
    NoUser,
    /// Placeholder cart for a user with no selected site.
    NoSite,
}

impl CartKey {
    /// Whether this key is allowed to contact the server at all.
    #[must_use]
    pub const fn allows_server_sync(&self) -> bool {
        matches!(self, Self::Site(_))
    }
}

impl std::fmt::Display for CartKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Site(id) => write!(f, "{id}"),
            Self::NoUser => write!(f, "no-user"),
            Self::NoSite => write!(f, "no-site"),
        }
    }
}

/// Tax location attached to a cart.
///
/// All fields are optional; an empty location means the server decides.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLocation {
    /// Two-letter country code.
    pub country_code: Option<String>,
    /// Postal code, where the country requires one for tax.
    pub postal_code: Option<String>,
    /// Country subdivision (state/province) code.
    pub subdivision_code: Option<String>,
}

impl CartLocation {
    /// True when no component of the location is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.country_code.is_none() && self.postal_code.is_none() && self.subdivision_code.is_none()
    }
}

/// Tax data carried on both cart shapes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartTaxData {
    /// Where tax should be computed.
    pub location: CartLocation,
    /// Whether the server wants taxes displayed for this cart.
    pub display_taxes: bool,
}

/// A product as it appears in a server-validated cart.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResponseCartProduct {
    /// Unique identifier for this cart line. Server-assigned for validated
    /// carts; locally added products carry a deterministic `temp-` uuid until
    /// the next sync round-trip.
    pub uuid: String,
    /// Numeric product identifier.
    pub product_id: u64,
    /// Product slug, e.g. `personal-bundle`.
    pub product_slug: String,
    /// Human-readable product name. Empty until the server fills it in.
    pub product_name: String,
    /// Currency code for the item amounts.
    pub currency: String,
    /// Number of units (e.g. years of a subscription).
    pub volume: u32,
    /// Optional quantity for products sold in counts (e.g. mailboxes).
    pub quantity: Option<u32>,
    /// Line subtotal in the currency's smallest unit.
    pub item_subtotal_integer: u64,
    /// Product meta, e.g. a domain name. Empty when not applicable.
    pub meta: String,
    /// Free-form extra data understood by the server.
    pub extra: serde_json::Value,
}

/// A product as submitted to the server.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RequestCartProduct {
    /// Numeric product identifier.
    pub product_id: u64,
    /// Product slug.
    pub product_slug: String,
    /// Number of units.
    pub volume: u32,
    /// Optional quantity for count-based products.
    pub quantity: Option<u32>,
    /// Product meta, e.g. a domain name.
    pub meta: String,
    /// Free-form extra data passed through to the server.
    pub extra: serde_json::Value,
}

impl RequestCartProduct {
    /// Create a minimal request product from an id and slug.
    #[must_use]
    pub fn new(product_id: u64, product_slug: impl Into<String>) -> Self {
        Self {
            product_id,
            product_slug: product_slug.into(),
            volume: 1,
            quantity: None,
            meta: String::new(),
            extra: serde_json::Value::Null,
        }
    }
}

/// The authoritative, server-validated cart.
///
/// The reducer also uses this shape as the local working cart; consumers only
/// ever see the last fully-validated snapshot of it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResponseCart {
    /// The key this cart belongs to, when known.
    pub cart_key: Option<CartKey>,
    /// Products in the cart, in insertion order.
    pub products: Vec<ResponseCartProduct>,
    /// Applied or requested coupon code. Empty string when none.
    pub coupon: String,
    /// Whether the server accepted the coupon.
    pub is_coupon_applied: bool,
    /// Total coupon savings in the currency's smallest unit.
    pub coupon_savings_integer: u64,
    /// Currency code for all cart amounts.
    pub currency: String,
    /// Locale the server used for display strings.
    pub locale: String,
    /// Subtotal before tax, smallest currency unit.
    pub sub_total_integer: u64,
    /// Total tax, smallest currency unit.
    pub total_tax_integer: u64,
    /// Grand total, smallest currency unit.
    pub total_cost_integer: u64,
    /// Credits applied, smallest currency unit.
    pub credits_integer: u64,
    /// Tax location and display flags.
    pub tax: CartTaxData,
    /// When the server generated this cart.
    pub cart_generated_at_timestamp: DateTime<Utc>,
}

/// The cart shape pushed to the server when syncing local mutations.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RequestCart {
    /// Products the client wants in the cart.
    pub products: Vec<RequestCartProduct>,
    /// Requested coupon code. Empty string when none.
    pub coupon: String,
    /// Currency code.
    pub currency: String,
    /// Client locale.
    pub locale: String,
    /// Temporary carts are never persisted server-side.
    pub temporary: bool,
    /// Tax location for the server to validate against.
    pub tax: CartTaxData,
}

/// The canonical empty cart, used before any server round-trip and for
/// placeholder cart keys.
#[must_use]
pub fn empty_response_cart() -> ResponseCart {
    ResponseCart {
        cart_key: None,
        products: Vec::new(),
        coupon: String::new(),
        is_coupon_applied: false,
        coupon_savings_integer: 0,
        currency: "USD".to_string(),
        locale: "en-us".to_string(),
        sub_total_integer: 0,
        total_tax_integer: 0,
        total_cost_integer: 0,
        credits_integer: 0,
        tax: CartTaxData::default(),
        cart_generated_at_timestamp: DateTime::UNIX_EPOCH,
    }
}

/// Convert a working cart into the shape the server accepts for a sync.
#[must_use]
pub fn request_cart_from_response_cart(cart: &ResponseCart) -> RequestCart {
    RequestCart {
        products: cart
            .products
            .iter()
            .map(request_product_from_response_product)
            .collect(),
        coupon: cart.coupon.clone(),
        currency: cart.currency.clone(),
        locale: cart.locale.clone(),
        temporary: false,
        tax: cart.tax.clone(),
    }
}

/// Convert a single cart line back into its request shape.
#[must_use]
pub fn request_product_from_response_product(product: &ResponseCartProduct) -> RequestCartProduct {
    RequestCartProduct {
        product_id: product.product_id,
        product_slug: product.product_slug.clone(),
        volume: product.volume,
        quantity: product.quantity,
        meta: product.meta.clone(),
        extra: product.extra.clone(),
    }
}

/// Build a placeholder cart line for a locally added product.
///
/// The uuid is deterministic (`temp-{product_id}-{position}`) so the reducer
/// stays pure; the server assigns a real uuid on the next sync.
#[must_use]
pub fn response_product_from_request_product(
    product: &RequestCartProduct,
    position: usize,
    currency: &str,
) -> ResponseCartProduct {
    ResponseCartProduct {
        uuid: format!("temp-{}-{position}", product.product_id),
        product_id: product.product_id,
        product_slug: product.product_slug.clone(),
        product_name: String::new(),
        currency: currency.to_string(),
        volume: product.volume,
        quantity: product.quantity,
        item_subtotal_integer: 0,
        meta: product.meta.clone(),
        extra: product.extra.clone(),
    }
}
