//! Checkout walkthrough: load a cart, add products, try a coupon, reload.
//!
//! Runs against the in-memory mock server from `shopping-cart-testing`, so
//! it exercises the full actor pipeline without any network.

use std::sync::Arc;

use anyhow::Result;
use shopping_cart_core::cart::{CartKey, RequestCartProduct};
use shopping_cart_runtime::ShoppingCartManagerClient;
use shopping_cart_testing::MockCartConnector;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,shopping_cart_runtime=debug")),
        )
        .init();

    let connector: Arc<dyn shopping_cart_core::connector::CartConnector> = Arc::new(
        MockCartConnector::new()
            .with_product_cost(1009, 4800)
            .with_product_cost(106, 1500)
            .with_coupon("WELCOME20", 960),
    );
    let client = ShoppingCartManagerClient::new(connector);
    let cart_key = CartKey::Site(42);

    let subscription = client.subscribe_to_cart_key(&cart_key, || {
        tracing::info!("cart changed");
    });

    // Adding while the initial load is still in flight is fine: the action
    // is queued and replayed once the server cart arrives.
    let manager = client.for_cart_key(Some(&cart_key));
    let cart = manager
        .add_products_to_cart(vec![
            RequestCartProduct::new(1009, "personal-bundle"),
            RequestCartProduct::new(106, "domain-mapping"),
        ])
        .await?;
    tracing::info!(total = cart.total_cost_integer, "products in cart");

    let manager = client.for_cart_key(Some(&cart_key));
    let cart = manager.apply_coupon("WELCOME20").await?;
    tracing::info!(
        applied = cart.is_coupon_applied,
        savings = cart.coupon_savings_integer,
        total = cart.total_cost_integer,
        "coupon result"
    );

    let cart = client.for_cart_key(Some(&cart_key)).reload_from_server().await?;
    tracing::info!(products = cart.products.len(), "cart after reload");

    subscription.unsubscribe();
    Ok(())
}
