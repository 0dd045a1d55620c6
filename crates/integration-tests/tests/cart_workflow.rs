//! Integration tests for the cart mutation workflow.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use qkart_core::{ProductId, Quantity};
use qkart_integration_tests::TestContext;
use qkart_storefront::config::MutationPolicy;
use qkart_storefront::error::CartError;
use qkart_storefront::notify::Severity;
use qkart_storefront::testing::{FakeBackend, entry, product};

fn catalog() -> FakeBackend {
    FakeBackend::with_catalog(vec![product("A", 10), product("B", 25)])
}

// =============================================================================
// Preconditions
// =============================================================================

#[tokio::test]
async fn test_signed_out_add_never_calls_backend() {
    let mut ctx = TestContext::new(catalog());
    ctx.storefront.load().await.unwrap();

    let err = ctx
        .storefront
        .add_to_cart(&ProductId::new("A"))
        .await
        .unwrap_err();
    let err_qty = ctx
        .storefront
        .set_quantity(&ProductId::new("A"), Quantity::new(2).unwrap())
        .await
        .unwrap_err();

    assert!(matches!(err, CartError::Unauthenticated));
    assert!(matches!(err_qty, CartError::Unauthenticated));
    assert!(ctx.backend.upserts().is_empty());
    assert_eq!(ctx.backend.cart_fetches(), 0);

    let notes = ctx.notifications.drain();
    assert_eq!(notes.len(), 2);
    assert!(notes.iter().all(|n| n.severity == Severity::Error));
}

#[tokio::test]
async fn test_duplicate_add_never_calls_backend() {
    let mut ctx = TestContext::new(catalog().with_cart(vec![entry("A", 1)])).signed_in();
    ctx.storefront.load().await.unwrap();

    let err = ctx
        .storefront
        .add_to_cart(&ProductId::new("A"))
        .await
        .unwrap_err();

    assert!(matches!(err, CartError::DuplicateItem(_)));
    assert!(ctx.backend.upserts().is_empty());
    assert_eq!(
        ctx.notifications.drain()[0].message,
        "Item already in cart. Use the cart sidebar to update quantity or remove item"
    );
}

// =============================================================================
// Server-Authoritative Replacement
// =============================================================================

#[tokio::test]
async fn test_quantity_is_absolute() {
    let ctx = TestContext::new(catalog().with_cart(vec![entry("B", 2)])).signed_in();
    ctx.storefront.load().await.unwrap();

    let view = ctx
        .storefront
        .set_quantity(&ProductId::new("B"), Quantity::new(5).unwrap())
        .await
        .unwrap();

    assert_eq!(view.items.len(), 1);
    assert_eq!(view.items[0].qty.get(), 5);
    assert_eq!(view.total.to_string(), "$125");
}

#[tokio::test]
async fn test_server_cart_replaces_stale_local_copy() {
    let ctx = TestContext::new(catalog()).signed_in();
    ctx.storefront.load().await.unwrap();

    // Another device added B after we loaded.
    ctx.backend.set_remote_entry(entry("B", 1));

    let view = ctx.storefront.add_to_cart(&ProductId::new("A")).await.unwrap();

    let ids: Vec<&str> = view.items.iter().map(|i| i.product.id.as_str()).collect();
    assert_eq!(ids, ["B", "A"]);
}

#[tokio::test]
async fn test_unknown_product_is_reported_distinctly() {
    let mut ctx = TestContext::new(catalog()).signed_in();
    ctx.storefront.load().await.unwrap();

    let err = ctx
        .storefront
        .add_to_cart(&ProductId::new("ghost"))
        .await
        .unwrap_err();

    assert!(matches!(err, CartError::ProductNotFound(_)));
    assert_eq!(ctx.notifications.drain()[0].message, "Product doesn't exist");
    assert!(ctx.storefront.cart_view().is_empty());
}

#[tokio::test]
async fn test_expired_token_is_reported() {
    let mut ctx = TestContext::new(catalog()).signed_in();
    ctx.backend.reject_credentials(true);

    let err = ctx.storefront.load_cart().await.unwrap_err();
    assert!(matches!(err, CartError::SessionExpired));
    assert_eq!(
        ctx.notifications.drain()[0].message,
        "Your session has expired. Login again to see your cart"
    );

    let err = ctx
        .storefront
        .add_to_cart(&ProductId::new("A"))
        .await
        .unwrap_err();
    assert!(matches!(err, CartError::Unauthenticated));
}

#[tokio::test]
async fn test_logout_clears_cart() {
    let ctx = TestContext::new(catalog().with_cart(vec![entry("A", 1)])).signed_in();
    ctx.storefront.load().await.unwrap();
    assert!(!ctx.storefront.cart_view().is_empty());

    ctx.storefront.logout();

    assert!(ctx.storefront.cart_view().is_empty());
    let err = ctx
        .storefront
        .add_to_cart(&ProductId::new("B"))
        .await
        .unwrap_err();
    assert!(matches!(err, CartError::Unauthenticated));
}

// =============================================================================
// Concurrent Mutations
// =============================================================================

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn test_rapid_quantity_changes_last_response_wins() {
    let ctx = TestContext::new(catalog().with_cart(vec![entry("A", 1)])).signed_in();
    ctx.storefront.load().await.unwrap();
    ctx.backend.delay_upserts(Duration::from_millis(50));
    let id = ProductId::new("A");

    let (two, three) = tokio::join!(
        ctx.storefront.set_quantity(&id, Quantity::new(2).unwrap()),
        ctx.storefront.set_quantity(&id, Quantity::new(3).unwrap()),
    );

    assert!(two.is_ok());
    assert!(three.is_ok());
    assert_eq!(ctx.storefront.cart_view().item_count, 3);
    assert_eq!(ctx.backend.remote_cart(), vec![entry("A", 3)]);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn test_serialized_policy_keeps_one_upsert_in_flight() {
    let ctx = TestContext::with_policy(
        catalog().with_cart(vec![entry("A", 1)]),
        MutationPolicy::SerializePerProduct,
    )
    .signed_in();
    ctx.storefront.load().await.unwrap();
    ctx.backend.delay_upserts(Duration::from_millis(50));
    let id = ProductId::new("A");
    let other_id = ProductId::new("B");
    let started = tokio::time::Instant::now();

    let (two, three, other) = tokio::join!(
        ctx.storefront.set_quantity(&id, Quantity::new(2).unwrap()),
        ctx.storefront.set_quantity(&id, Quantity::new(3).unwrap()),
        ctx.storefront.add_to_cart(&other_id),
    );

    assert!(two.is_ok() && three.is_ok() && other.is_ok());
    // Two serialized upserts for A; B runs alongside them.
    assert!(started.elapsed() >= Duration::from_millis(100));
    assert!(started.elapsed() < Duration::from_millis(150));
    assert_eq!(ctx.backend.remote_cart(), vec![entry("A", 3), entry("B", 1)]);
}
