//! End-to-end flows through the client, actor, middleware and manager.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use shopping_cart_core::cart::{CartKey, CartLocation, RequestCartProduct};
use shopping_cart_core::connector::CartConnectorError;
use shopping_cart_core::error::CartError;
use shopping_cart_core::status::{CacheStatus, CouponStatus, LoadingErrorType};
use shopping_cart_runtime::{ShoppingCartManager, ShoppingCartManagerClient};
use shopping_cart_testing::{init_test_tracing, wait_for, wait_until, MockCartConnector};

fn client_over(connector: &Arc<MockCartConnector>) -> ShoppingCartManagerClient {
    init_test_tracing();
    let connector: Arc<dyn shopping_cart_core::connector::CartConnector> =
        Arc::<MockCartConnector>::clone(connector);
    ShoppingCartManagerClient::new(connector)
}

async fn wait_for_loaded(client: &ShoppingCartManagerClient, key: &CartKey) -> ShoppingCartManager {
    wait_for(|| {
        let manager = client.for_cart_key(Some(key));
        (!manager.is_loading()).then_some(manager)
    })
    .await
}

#[tokio::test]
async fn initial_load_fetches_the_cart_once() {
    let connector = Arc::new(MockCartConnector::new());
    let client = client_over(&connector);
    let key = CartKey::Site(1);

    let manager = wait_for_loaded(&client, &key).await;
    assert_eq!(manager.cache_status(), CacheStatus::Valid);
    assert!(manager.response_cart().products.is_empty());
    assert_eq!(connector.get_call_count(), 1);
    assert_eq!(connector.set_call_count(), 0);
}

#[tokio::test]
async fn products_added_before_the_initial_load_are_queued_and_synced() {
    let connector = Arc::new(MockCartConnector::new().with_product_cost(1009, 1000));
    let client = client_over(&connector);
    let key = CartKey::Site(1);

    // Dispatch immediately, while the cart is still loading.
    let manager = client.for_cart_key(Some(&key));
    assert!(manager.is_loading());
    let cart = manager
        .add_products_to_cart(vec![RequestCartProduct::new(1009, "personal-bundle")])
        .await
        .unwrap();

    // The returned cart is the post-sync server cart, not the optimistic one.
    assert_eq!(cart.total_cost_integer, 1000);
    assert_eq!(cart.products.len(), 1);
    assert_eq!(cart.products[0].uuid, "server-0");
    assert_eq!(connector.set_call_count(), 1);

    let manager = client.for_cart_key(Some(&key));
    assert!(!manager.is_pending_update());
    assert_eq!(manager.response_cart().total_cost_integer, 1000);
}

#[tokio::test]
async fn overlapping_coupon_actions_both_resolve_with_the_final_cart() {
    let connector = Arc::new(
        MockCartConnector::new()
            .with_product_cost(1, 1000)
            .with_coupon("SAVE10", 100),
    );
    let client = client_over(&connector);
    let key = CartKey::Site(7);

    let manager = wait_for_loaded(&client, &key).await;
    manager
        .add_products_to_cart(vec![RequestCartProduct::new(1, "test-product")])
        .await
        .unwrap();

    let manager = client.for_cart_key(Some(&key));
    let (applied, removed) =
        tokio::join!(manager.apply_coupon("SAVE10"), manager.remove_coupon());

    // The remove was dispatched before the apply settled, so both futures
    // resolve with the same final cart: coupon gone, full price restored.
    let applied = applied.unwrap();
    let removed = removed.unwrap();
    assert_eq!(applied, removed);
    assert!(applied.coupon.is_empty());
    assert!(!applied.is_coupon_applied);
    assert_eq!(applied.total_cost_integer, 1000);

    let manager = client.for_cart_key(Some(&key));
    assert_eq!(manager.coupon_status(), CouponStatus::Fresh);
}

#[tokio::test]
async fn accepted_coupon_reaches_applied_status() {
    let connector = Arc::new(
        MockCartConnector::new()
            .with_product_cost(1, 1000)
            .with_coupon("SAVE10", 100),
    );
    let client = client_over(&connector);
    let key = CartKey::Site(2);

    let manager = wait_for_loaded(&client, &key).await;
    manager
        .add_products_to_cart(vec![RequestCartProduct::new(1, "test-product")])
        .await
        .unwrap();
    let cart = client
        .for_cart_key(Some(&key))
        .apply_coupon("SAVE10")
        .await
        .unwrap();

    assert!(cart.is_coupon_applied);
    assert_eq!(cart.total_cost_integer, 900);
    let manager = client.for_cart_key(Some(&key));
    assert_eq!(manager.coupon_status(), CouponStatus::Applied);
}

#[tokio::test]
async fn rejected_coupon_reaches_rejected_status() {
    let connector = Arc::new(MockCartConnector::new().with_product_cost(1, 1000));
    let client = client_over(&connector);
    let key = CartKey::Site(3);

    let manager = wait_for_loaded(&client, &key).await;
    manager
        .add_products_to_cart(vec![RequestCartProduct::new(1, "test-product")])
        .await
        .unwrap();
    let cart = client
        .for_cart_key(Some(&key))
        .apply_coupon("BOGUS")
        .await
        .unwrap();

    assert!(!cart.is_coupon_applied);
    assert_eq!(cart.total_cost_integer, 1000);
    let manager = client.for_cart_key(Some(&key));
    assert_eq!(manager.coupon_status(), CouponStatus::Rejected);
}

#[tokio::test]
async fn failed_initial_load_surfaces_as_a_loading_error() {
    let connector = Arc::new(MockCartConnector::new().with_get_handler(|_| {
        Err(CartConnectorError::Network("connection refused".into()))
    }));
    let client = client_over(&connector);
    let key = CartKey::Site(4);

    let manager = wait_for(|| {
        let manager = client.for_cart_key(Some(&key));
        manager.loading_error().is_some().then_some(manager)
    })
    .await;

    assert_eq!(manager.cache_status(), CacheStatus::Error);
    assert!(!manager.is_loading());
    assert_eq!(manager.loading_error_type(), Some(LoadingErrorType::Network));
    assert!(manager.loading_error().unwrap().contains("connection refused"));
    // No valid cart ever arrived, so consumers still see the empty cart.
    assert!(manager.response_cart().products.is_empty());
}

#[tokio::test]
async fn placeholder_keys_never_contact_the_server() {
    let connector = Arc::new(MockCartConnector::new());
    let client = client_over(&connector);
    let key = CartKey::NoUser;

    let manager = wait_for_loaded(&client, &key).await;
    assert_eq!(manager.cache_status(), CacheStatus::Valid);
    assert_eq!(connector.get_call_count(), 0);

    // Local mutations are echoed back as authoritative; a coupon with no
    // server to reject it counts as applied.
    let cart = manager.apply_coupon("ANYTHING").await.unwrap();
    assert!(cart.is_coupon_applied);
    assert_eq!(cart.coupon, "ANYTHING");
    assert_eq!(connector.set_call_count(), 0);
}

#[tokio::test]
async fn reload_discards_local_state_and_refetches() {
    let connector = Arc::new(MockCartConnector::new().with_product_cost(1, 500));
    let client = client_over(&connector);
    let key = CartKey::Site(5);

    let manager = wait_for_loaded(&client, &key).await;
    let cart = manager
        .add_products_to_cart(vec![RequestCartProduct::new(1, "test-product")])
        .await
        .unwrap();
    assert_eq!(cart.total_cost_integer, 500);

    // The mock's get_cart always serves the empty cart, so a reload drops
    // the locally built-up cart.
    let manager = client.for_cart_key(Some(&key));
    let cart = manager.reload_from_server().await.unwrap();
    assert!(cart.products.is_empty());
    assert_eq!(connector.get_call_count(), 2);
}

#[tokio::test]
async fn removing_a_product_by_server_uuid_syncs_the_remainder() {
    let connector = Arc::new(
        MockCartConnector::new()
            .with_product_cost(1, 100)
            .with_product_cost(2, 200),
    );
    let client = client_over(&connector);
    let key = CartKey::Site(6);

    let manager = wait_for_loaded(&client, &key).await;
    let cart = manager
        .add_products_to_cart(vec![
            RequestCartProduct::new(1, "first"),
            RequestCartProduct::new(2, "second"),
        ])
        .await
        .unwrap();
    assert_eq!(cart.total_cost_integer, 300);

    let uuid = cart.products[0].uuid.clone();
    let cart = client
        .for_cart_key(Some(&key))
        .remove_product_from_cart(uuid)
        .await
        .unwrap();

    assert_eq!(cart.products.len(), 1);
    assert_eq!(cart.products[0].product_slug, "second");
    assert_eq!(cart.total_cost_integer, 200);
}

#[tokio::test]
async fn updating_the_tax_location_syncs_it_to_the_server() {
    let connector = Arc::new(MockCartConnector::new().with_product_cost(1, 100));
    let client = client_over(&connector);
    let key = CartKey::Site(12);

    wait_for_loaded(&client, &key)
        .await
        .add_products_to_cart(vec![RequestCartProduct::new(1, "test-product")])
        .await
        .unwrap();

    let location = CartLocation {
        country_code: Some("US".to_string()),
        postal_code: Some("90210".to_string()),
        subdivision_code: None,
    };
    let cart = client
        .for_cart_key(Some(&key))
        .update_location(location.clone())
        .await
        .unwrap();

    // The server echoed the submitted location back onto the valid cart.
    assert_eq!(cart.tax.location, location);
    let requests = connector.set_requests();
    assert_eq!(requests.last().unwrap().1.tax.location, location);
}

#[tokio::test]
async fn managers_are_memoized_until_the_state_changes() {
    let connector = Arc::new(MockCartConnector::new().with_product_cost(1, 100));
    let client = client_over(&connector);
    let key = CartKey::Site(8);

    let settled = wait_for_loaded(&client, &key).await;
    let again = client.for_cart_key(Some(&key));
    assert!(settled.same_snapshot(&again));

    settled
        .add_products_to_cart(vec![RequestCartProduct::new(1, "test-product")])
        .await
        .unwrap();
    let after = client.for_cart_key(Some(&key));
    assert!(!settled.same_snapshot(&after));
}

#[tokio::test]
async fn subscribers_are_notified_until_they_unsubscribe() {
    let connector = Arc::new(MockCartConnector::new().with_product_cost(1, 100));
    let client = client_over(&connector);
    let key = CartKey::Site(9);

    let notifications = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&notifications);
    let subscription = client.subscribe_to_cart_key(&key, move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    wait_until(|| notifications.load(Ordering::SeqCst) > 0).await;
    let manager = wait_for_loaded(&client, &key).await;

    subscription.unsubscribe();
    let before = notifications.load(Ordering::SeqCst);
    manager
        .add_products_to_cart(vec![RequestCartProduct::new(1, "test-product")])
        .await
        .unwrap();
    assert_eq!(notifications.load(Ordering::SeqCst), before);
}

#[tokio::test]
async fn a_slow_server_keeps_the_cart_pending_until_the_response_lands() {
    let connector = Arc::new(
        MockCartConnector::new()
            .with_product_cost(1, 100)
            .with_latency(Duration::from_millis(20)),
    );
    let client = client_over(&connector);
    let key = CartKey::Site(10);

    let manager = client.for_cart_key(Some(&key));
    assert!(manager.is_loading());
    assert!(manager.is_pending_update());

    let cart = wait_for_loaded(&client, &key)
        .await
        .add_products_to_cart(vec![RequestCartProduct::new(1, "test-product")])
        .await
        .unwrap();
    assert_eq!(cart.total_cost_integer, 100);
}

#[tokio::test]
async fn stale_sync_responses_after_a_reload_are_discarded() {
    let connector = Arc::new(
        MockCartConnector::new()
            .with_product_cost(1, 100)
            .with_latency(Duration::from_millis(50)),
    );
    let client = client_over(&connector);
    let key = CartKey::Site(11);

    // Start a sync, then reload while its response is still in flight. The
    // reload supersedes the sync's request id.
    let manager = wait_for_loaded(&client, &key).await;
    let add = tokio::spawn({
        let manager = manager.clone();
        async move {
            manager
                .add_products_to_cart(vec![RequestCartProduct::new(1, "test-product")])
                .await
        }
    });
    tokio::time::sleep(Duration::from_millis(10)).await;
    let reloaded = client
        .for_cart_key(Some(&key))
        .reload_from_server()
        .await
        .unwrap();
    assert!(reloaded.products.is_empty());

    // Give the superseded sync response ample time to land; it must not
    // clobber the reloaded cart.
    tokio::time::sleep(Duration::from_millis(150)).await;
    let manager = client.for_cart_key(Some(&key));
    assert_eq!(manager.cache_status(), CacheStatus::Valid);
    assert!(manager.response_cart().products.is_empty());

    // The add settled with the post-reload cart, not the discarded sync.
    assert!(add.await.unwrap().unwrap().products.is_empty());
}

#[tokio::test]
async fn noop_manager_round_trip_through_the_client() {
    let connector = Arc::new(MockCartConnector::new());
    let client = client_over(&connector);

    let manager = client.for_cart_key(None);
    let error = manager.remove_coupon().await.unwrap_err();
    assert_eq!(error, CartError::MissingCartKey);
    assert!(manager.reload_from_server().await.unwrap().products.is_empty());
    assert_eq!(connector.get_call_count(), 0);
}
