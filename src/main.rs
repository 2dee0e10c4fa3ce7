use pixelframe_storefront::{
    config::AppConfig,
    services::{catalog_service, session_service::SessionState, storefront_service},
    state::AppState,
    telemetry::init_tracing,
};

/// Boots the storefront state the way a UI shell would and prints what the
/// landing page would render.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env()?;
    let state = AppState::from_config(config).await?;
    let _watch = state.session.watch();

    let (session, catalog) = storefront_service::start(&state).await;
    let session = match session {
        SessionState::Authenticated(_) => state.session.revalidate().await?,
        other => other,
    };
    match &session {
        SessionState::Authenticated(identity) => {
            tracing::info!(user_id = %identity.id, role = %identity.role, "signed in")
        }
        SessionState::Anonymous | SessionState::Authenticating => {
            tracing::info!("browsing anonymously")
        }
    }

    if catalog.degraded {
        tracing::warn!("marketplace unreachable, showing sample listings");
    }
    println!(
        "{} products, {} services",
        catalog.products.len(),
        catalog.services.len()
    );
    for product in catalog_service::filter_products(&catalog.products, "", None).iter().take(5) {
        let badge = if !product.in_stock() {
            " (out of stock)"
        } else if product.low_stock() {
            " (low stock)"
        } else {
            ""
        };
        println!("  KSh {:>9}  {}{badge}", product.price, product.name);
    }
    for electrician in catalog_service::top_electricians(&catalog.electricians, 3) {
        println!("  {:.1}  {}", electrician.rating, electrician.name);
    }
    Ok(())
}
