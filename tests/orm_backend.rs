use std::{collections::BTreeMap, sync::Arc};

use pixelframe_storefront::{
    backend::{DataBackend, OrmBackend, OrmSessionBackend, ProductQuery},
    cache::MemorySessionCache,
    config::AppConfig,
    db::{create_orm_conn, run_migrations},
    dto::{auth::ProfileDraft, orders::OrderDraft, products::ProductDraft},
    enums::{OrderStatus, Role},
    error::AppError,
    services::{inventory_service, order_service},
    state::AppState,
};
use sea_orm::{ConnectionTrait, Statement};

fn profile(name: &str, email: &str, role: Role) -> ProfileDraft {
    ProfileDraft {
        name: name.into(),
        email: email.into(),
        role,
        phone: None,
        location: "Kisumu".into(),
        experience_years: None,
        specialties: Vec::new(),
    }
}

// Integration flow against Postgres: seller lists -> customer orders -> stock moves -> cancel restores.
#[tokio::test]
async fn hosted_listing_order_and_cancel_flow() -> anyhow::Result<()> {
    // Allow skipping when no DB is configured in the environment.
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run hosted backend tests."
            );
            return Ok(());
        }
    };

    let (state, data) = setup_state(&database_url).await?;
    state.catalog.load().await;

    let seller = state
        .session
        .register(
            &profile("Kisumu Gadgets", "gadgets@example.com", Role::Seller),
            "seller-pass",
        )
        .await?
        .identity;
    let product = inventory_service::add_product(
        &state,
        &ProductDraft {
            name: "Infinix Hot 40".into(),
            description: "6.78\" display, 8GB RAM".into(),
            price: 18_500,
            category: "Mobile Phones".into(),
            brand: "Infinix".into(),
            stock: 6,
            images: Vec::new(),
            specifications: BTreeMap::from([("RAM".to_string(), "8GB".to_string())]),
        },
    )
    .await?;
    assert_eq!(product.seller_name, "Kisumu Gadgets");
    assert_eq!(product.review_count, 0);
    assert!(state.catalog.product(product.id).is_some());
    assert!(!state.catalog.snapshot().degraded);
    state.session.logout().await?;

    let duplicate = state
        .session
        .register(
            &profile("Copycat", "GADGETS@example.com", Role::Customer),
            "other-pass",
        )
        .await
        .unwrap_err();
    assert!(matches!(duplicate, AppError::BadRequest(_)));

    state
        .session
        .register(
            &profile("Otieno", "otieno@example.com", Role::Customer),
            "buyer-pass",
        )
        .await?;
    let order = order_service::place_order(
        &state,
        &OrderDraft {
            product_id: product.id,
            quantity: 4,
            delivery_address: "Oginga Odinga St, Kisumu".into(),
        },
    )
    .await?;
    assert_eq!(order.total_price(), 74_000);

    let listed = data
        .list_products(ProductQuery::for_seller(seller.id))
        .await?;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].stock, 2);
    assert_eq!(listed[0].sold, 4);

    let summaries = order_service::list_orders(&state).await?;
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].product_name, "Infinix Hot 40");

    let cancelled =
        order_service::update_order_status(&state, order.id(), OrderStatus::Cancelled).await?;
    assert_eq!(cancelled.status(), OrderStatus::Cancelled);
    let restored = state.catalog.product(product.id).unwrap();
    assert_eq!(restored.stock, 6);
    assert_eq!(restored.sold, 0);
    state.session.logout().await?;

    let signed_in = state
        .session
        .login("gadgets@example.com", "seller-pass")
        .await?;
    assert_eq!(signed_in.identity.id, seller.id);
    state.session.logout().await?;
    let err = state
        .session
        .login("gadgets@example.com", "wrong")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidCredentials));

    Ok(())
}

async fn setup_state(database_url: &str) -> anyhow::Result<(AppState, Arc<OrmBackend>)> {
    let orm = create_orm_conn(database_url).await?;
    run_migrations(&orm).await?;
    // Clean tables to keep the test idempotent.
    orm.execute(Statement::from_string(
        orm.get_database_backend(),
        "TRUNCATE reviews, orders, bookings, services, electricians, products, accounts, profiles CASCADE;",
    ))
    .await?;

    let data = Arc::new(OrmBackend::new(orm.clone()));
    let sessions = Arc::new(OrmSessionBackend::new(orm, "test-secret", 1));
    let state = AppState::new(
        AppConfig::offline(),
        data.clone(),
        sessions,
        Arc::new(MemorySessionCache::new()),
    );
    Ok((state, data))
}
