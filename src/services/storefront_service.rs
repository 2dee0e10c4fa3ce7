//! UI entry points that need a signed-in identity. Each event goes through
//! the session gate; an anonymous visitor gets `AuthRequired` and the event
//! is replayed once after the next successful sign-in.

use std::sync::Arc;

use crate::{
    dto::auth::ProfileDraft,
    enums::Capability,
    error::{AppError, AppResult},
    models::{Identity, SellerOverview, Service},
    services::{
        catalog_service::CatalogSnapshot,
        inventory_service,
        order_service::{self, CartNotice},
        session_service::{LoginOutcome, PendingAction, SessionState},
    },
    state::AppState,
};

#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome {
    AddedToCart(CartNotice),
    /// Booking form opened for this service.
    BookingForm(Service),
    SellerDashboard(SellerOverview),
}

#[derive(Debug)]
pub struct SignedIn {
    pub identity: Identity,
    /// Result of the action that was waiting for this sign-in, if any.
    pub resumed: Option<AppResult<ActionOutcome>>,
}

/// Restores the cached session and loads the catalog.
pub async fn start(state: &AppState) -> (SessionState, Arc<CatalogSnapshot>) {
    let session = state.session.rehydrate().await;
    let catalog = state.catalog.load().await;
    (session, catalog)
}

pub async fn dispatch(state: &AppState, action: PendingAction) -> AppResult<ActionOutcome> {
    let identity = state.session.require_auth(action)?;
    run(state, &identity, action)
}

fn run(state: &AppState, identity: &Identity, action: PendingAction) -> AppResult<ActionOutcome> {
    match action {
        PendingAction::AddToCart { product_id } => {
            order_service::add_to_cart(state, product_id).map(ActionOutcome::AddedToCart)
        }
        PendingAction::BookService { service_id } => {
            identity.ensure(Capability::BookServices)?;
            let service = state.catalog.service(service_id).ok_or(AppError::NotFound)?;
            Ok(ActionOutcome::BookingForm(service))
        }
        PendingAction::OpenSellerDashboard => {
            inventory_service::seller_overview(state).map(ActionOutcome::SellerDashboard)
        }
    }
}

fn resume(state: &AppState, outcome: LoginOutcome) -> SignedIn {
    let resumed = outcome.resumed.map(|action| {
        tracing::debug!(?action, "resuming deferred action");
        run(state, &outcome.identity, action)
    });
    SignedIn {
        identity: outcome.identity,
        resumed,
    }
}

pub async fn login(state: &AppState, email: &str, password: &str) -> AppResult<SignedIn> {
    let outcome = state.session.login(email, password).await?;
    Ok(resume(state, outcome))
}

pub async fn register(
    state: &AppState,
    draft: &ProfileDraft,
    password: &str,
) -> AppResult<SignedIn> {
    let outcome = state.session.register(draft, password).await?;
    Ok(resume(state, outcome))
}

pub async fn logout(state: &AppState) -> AppResult<()> {
    state.session.logout().await
}
