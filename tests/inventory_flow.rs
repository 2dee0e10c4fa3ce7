mod common;

use std::{collections::BTreeMap, time::Duration};

use pixelframe_storefront::{
    dto::{
        orders::OrderDraft,
        products::{ProductDraft, ProductPatch},
    },
    enums::ProductCategory,
    error::AppError,
    seed,
    services::{inventory_service, order_service},
};

fn draft(name: &str) -> ProductDraft {
    ProductDraft {
        name: name.into(),
        description: "Fast-charging power bank, 20000mAh".into(),
        price: 3_500,
        category: "Accessories".into(),
        brand: "Oraimo".into(),
        stock: 40,
        images: Vec::new(),
        specifications: BTreeMap::from([("Capacity".to_string(), "20000mAh".to_string())]),
    }
}

#[tokio::test]
async fn added_product_shows_up_in_public_and_seller_views() {
    let (state, backend) = common::memory_state();
    state.catalog.load().await;
    let seller = common::sign_in(&state, &backend, common::seed_identity(seed::TECHHUB_KENYA)).await;

    let product = inventory_service::add_product(&state, &draft("Oraimo Traveler")).await.unwrap();

    assert_eq!(product.sold, 0);
    assert_eq!(product.seller_id, seller.id);
    assert_eq!(product.category, ProductCategory::Accessories);
    assert!(state.catalog.product(product.id).is_some());
    assert_eq!(state.catalog.products("oraimo", None).len(), 1);
    assert!(
        state
            .catalog
            .products_by_seller(seller.id)
            .iter()
            .any(|p| p.id == product.id)
    );
    let mine = inventory_service::my_products(&state).await.unwrap();
    assert_eq!(mine.len(), 3);
}

#[tokio::test]
async fn invalid_drafts_fail_before_any_network_call() {
    let (state, backend) = common::memory_state();
    common::sign_in(&state, &backend, common::seed_identity(seed::TECHHUB_KENYA)).await;
    let calls = backend.calls();

    let mut zero_price = draft("Free lunch");
    zero_price.price = 0;
    let mut negative_stock = draft("Negative");
    negative_stock.stock = -1;
    let mut unknown_category = draft("Mystery");
    unknown_category.category = "Groceries".into();
    let mut blank_name = draft("   ");
    blank_name.name = "  ".into();

    for bad in [zero_price, negative_stock, unknown_category, blank_name] {
        let err = inventory_service::add_product(&state, &bad).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)), "{err:?}");
    }
    assert_eq!(backend.calls(), calls);
}

#[tokio::test]
async fn customers_cannot_add_products() {
    let (state, backend) = common::memory_state();
    common::sign_in(&state, &backend, common::customer("Akinyi")).await;

    let err = inventory_service::add_product(&state, &draft("Nope")).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden));
}

#[tokio::test]
async fn rapid_double_submit_creates_one_product() {
    let (state, backend) = common::memory_state();
    common::sign_in(&state, &backend, common::seed_identity(seed::NAIROBI_ELECTRONICS)).await;
    backend.set_write_latency(Duration::from_millis(50));
    let before = backend.product_count();

    let payload = draft("Anker 737");
    let (first, second) = tokio::join!(
        inventory_service::add_product(&state, &payload),
        inventory_service::add_product(&state, &payload),
    );

    let outcomes = [first, second];
    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(
        outcomes
            .iter()
            .any(|r| matches!(r, Err(AppError::SubmissionPending(_))))
    );
    assert_eq!(backend.product_count(), before + 1);
    assert!(!state.guard.is_pending(inventory_service::ADD_PRODUCT_FORM));
}

#[tokio::test]
async fn non_owner_update_is_rejected_and_snapshot_kept() {
    let (state, backend) = common::memory_state();
    state.catalog.load().await;
    common::sign_in(&state, &backend, common::seed_identity(seed::AUDIO_WORLD)).await;
    let before = state.catalog.snapshot();

    let patch = ProductPatch {
        price: Some(1),
        ..ProductPatch::default()
    };
    let err = inventory_service::update_product(&state, seed::product_id(1), &patch)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::NotOwner));
    assert_eq!(*state.catalog.snapshot(), *before);
    assert_eq!(backend.product(seed::product_id(1)).unwrap().price, 120_000);
}

#[tokio::test]
async fn owner_update_changes_only_patched_fields() {
    let (state, backend) = common::memory_state();
    state.catalog.load().await;
    common::sign_in(&state, &backend, common::seed_identity(seed::AUDIO_WORLD)).await;

    let patch = ProductPatch {
        stock: Some(12),
        price: Some(26_500),
        ..ProductPatch::default()
    };
    let updated = inventory_service::update_product(&state, seed::product_id(3), &patch)
        .await
        .unwrap();

    assert_eq!(updated.stock, 12);
    assert_eq!(updated.price, 26_500);
    assert_eq!(updated.sold, 25);
    assert_eq!(updated.name, "Sony WH-1000XM5 Headphones");
    assert!(state.catalog.product(seed::product_id(3)).unwrap().in_stock());

    let empty = inventory_service::update_product(&state, seed::product_id(3), &ProductPatch::default())
        .await
        .unwrap_err();
    assert!(matches!(empty, AppError::Validation(_)));
}

#[tokio::test]
async fn failed_write_surfaces_error_and_leaves_snapshot() {
    let (state, backend) = common::memory_state();
    state.catalog.load().await;
    common::sign_in(&state, &backend, common::seed_identity(seed::TECHHUB_KENYA)).await;
    let before = state.catalog.snapshot();
    backend.set_available(false);

    let err = inventory_service::add_product(&state, &draft("Offline")).await.unwrap_err();

    assert!(err.is_unavailable());
    assert_eq!(*state.catalog.snapshot(), *before);
}

#[tokio::test]
async fn deletion_waits_for_confirmation() {
    let (state, backend) = common::memory_state();
    state.catalog.load().await;
    common::sign_in(&state, &backend, common::seed_identity(seed::TECHHUB_KENYA)).await;
    let calls = backend.calls();

    let pending = inventory_service::request_delete(&state, seed::product_id(4)).unwrap();
    assert!(pending.prompt().contains("LG 55\" 4K Smart TV"));
    pending.cancel();
    assert_eq!(backend.calls(), calls);
    assert!(backend.product(seed::product_id(4)).is_some());

    inventory_service::request_delete(&state, seed::product_id(4))
        .unwrap()
        .confirm()
        .await
        .unwrap();
    assert!(backend.product(seed::product_id(4)).is_none());
    assert!(state.catalog.product(seed::product_id(4)).is_none());
}

#[tokio::test]
async fn ordered_products_cannot_be_deleted() {
    let (state, backend) = common::memory_state();
    state.catalog.load().await;
    common::sign_in(&state, &backend, common::customer("Ouma")).await;
    order_service::place_order(
        &state,
        &OrderDraft {
            product_id: seed::product_id(4),
            quantity: 1,
            delivery_address: "Kilimani, Nairobi".into(),
        },
    )
    .await
    .unwrap();
    state.session.logout().await.unwrap();

    common::sign_in(&state, &backend, common::seed_identity(seed::TECHHUB_KENYA)).await;
    let err = inventory_service::request_delete(&state, seed::product_id(4))
        .unwrap()
        .confirm()
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::BadRequest(_)));
    assert!(state.catalog.product(seed::product_id(4)).is_some());
}

#[tokio::test]
async fn overview_tracks_the_sellers_listings() {
    let (state, backend) = common::memory_state();
    state.catalog.load().await;
    common::sign_in(&state, &backend, common::seed_identity(seed::TECHHUB_KENYA)).await;

    let overview = inventory_service::seller_overview(&state).unwrap();
    assert_eq!(overview.product_count, 2);
    assert_eq!(overview.units_sold, 11);

    let mut sold_out = draft("Sold out cable");
    sold_out.stock = 0;
    inventory_service::add_product(&state, &sold_out).await.unwrap();

    let overview = inventory_service::seller_overview(&state).unwrap();
    assert_eq!(overview.product_count, 3);
    assert_eq!(overview.out_of_stock, 1);
}
