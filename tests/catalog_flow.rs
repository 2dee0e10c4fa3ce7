mod common;

use std::sync::Arc;

use chrono::Utc;
use pixelframe_storefront::{
    backend::UnconfiguredBackend,
    cache::MemorySessionCache,
    config::AppConfig,
    enums::{ProductCategory, ServiceCategory},
    error::AppError,
    models::Product,
    seed,
    services::{catalog_service::ViewScope, order_service},
    state::AppState,
};
use uuid::Uuid;

fn fresh_product(name: &str) -> Product {
    let mut product = seed::seed_products().remove(0);
    product.id = Uuid::new_v4();
    product.name = name.into();
    product.created_at = Utc::now();
    product
}

#[tokio::test]
async fn load_returns_backend_rows_newest_first() {
    let (state, backend) = common::memory_state();
    backend.insert_product_row(fresh_product("Tecno Camon 30"));

    let snapshot = state.catalog.load().await;

    assert!(!snapshot.degraded);
    assert_eq!(snapshot.products.len(), 5);
    assert_eq!(snapshot.products[0].name, "Tecno Camon 30");
    assert_eq!(snapshot.services.len(), 3);
    assert_eq!(snapshot.electricians.len(), 3);
}

#[tokio::test]
async fn unreachable_backend_degrades_to_seed_data() {
    let (state, backend) = common::memory_state();
    backend.insert_product_row(fresh_product("Only online"));
    backend.set_available(false);

    let snapshot = state.catalog.load().await;

    assert!(snapshot.degraded);
    assert!(!snapshot.products.is_empty());
    assert_eq!(snapshot.products, seed::seed_products());
    assert_eq!(snapshot.services, seed::seed_services());
}

#[tokio::test]
async fn unconfigured_backend_serves_seed_catalog() {
    let backend = Arc::new(UnconfiguredBackend::new());
    let state = AppState::new(
        AppConfig::offline(),
        backend.clone(),
        backend,
        Arc::new(MemorySessionCache::new()),
    );

    let snapshot = state.catalog.load().await;

    assert!(snapshot.degraded);
    assert_eq!(snapshot.products.len(), seed::seed_products().len());
}

#[tokio::test]
async fn out_of_stock_product_is_rejected_without_a_backend_call() {
    let (state, backend) = common::memory_state();
    common::sign_in(&state, &backend, common::customer("Amina")).await;
    state.catalog.load().await;

    let headphones = state.catalog.product(seed::product_id(3)).unwrap();
    assert!(!headphones.in_stock());

    let calls = backend.calls();
    let err = order_service::add_to_cart(&state, headphones.id).unwrap_err();
    assert!(matches!(err, AppError::OutOfStock(_)));
    assert_eq!(backend.calls(), calls);

    let notice = order_service::add_to_cart(&state, seed::product_id(1)).unwrap();
    assert_eq!(notice.message, "Samsung Galaxy S24 Ultra added to cart!");
}

#[tokio::test]
async fn low_stock_badge_starts_at_five_units() {
    let (state, _backend) = common::memory_state();
    state.catalog.load().await;

    let tv = state.catalog.product(seed::product_id(4)).unwrap();
    assert_eq!(tv.stock, 5);
    assert!(tv.low_stock());
    assert!(!state.catalog.product(seed::product_id(1)).unwrap().low_stock());
    assert!(!state.catalog.product(seed::product_id(3)).unwrap().low_stock());
}

#[tokio::test]
async fn closed_view_ignores_late_refresh() {
    let (state, backend) = common::memory_state();
    let before = state.catalog.load().await;

    let scope = ViewScope::new();
    backend.insert_product_row(fresh_product("Arrives late"));
    scope.close();

    let result = state.catalog.refresh_for(&scope).await;
    assert!(matches!(result, Err(AppError::Cancelled)));
    assert_eq!(*state.catalog.snapshot(), *before);

    let open = ViewScope::new();
    let after = state.catalog.refresh_for(&open).await.unwrap();
    assert_eq!(after.products.len(), before.products.len() + 1);
}

#[tokio::test]
async fn filters_are_deterministic_over_one_snapshot() {
    let (state, _backend) = common::memory_state();
    state.catalog.load().await;

    let first = state.catalog.products("o", Some(ProductCategory::MobilePhones));
    let second = state.catalog.products("o", Some(ProductCategory::MobilePhones));
    assert_eq!(first, second);
    assert!(first.iter().all(|p| p.category == ProductCategory::MobilePhones));

    let all = state.catalog.services("", None);
    assert_eq!(all.len(), 3);
    assert!(
        all.windows(2)
            .all(|w| w[0].electrician_rating >= w[1].electrician_rating)
    );
    let by_provider = state.catalog.services("WANJIKU", None);
    assert_eq!(by_provider.len(), 1);

    let installs = state.catalog.services("", Some(ServiceCategory::Installation));
    assert_eq!(installs.len(), 1);
    assert_eq!(installs[0].electrician_id, seed::DAVID_KIPKEMOI);

    let top = state.catalog.top_electricians(1);
    assert_eq!(top[0].id, seed::JOHN_MWANGI);
}
