#![allow(dead_code)]

use std::sync::Arc;

use pixelframe_storefront::{
    backend::MemoryBackend,
    cache::{MemorySessionCache, SessionCache},
    config::AppConfig,
    enums::{Location, Role},
    models::Identity,
    seed,
    state::AppState,
};
use uuid::Uuid;

pub const PASSWORD: &str = "secret123";

pub fn memory_state() -> (AppState, Arc<MemoryBackend>) {
    let cache: Arc<dyn SessionCache> = Arc::new(MemorySessionCache::new());
    memory_state_with_cache(cache)
}

pub fn memory_state_with_cache(cache: Arc<dyn SessionCache>) -> (AppState, Arc<MemoryBackend>) {
    let backend = Arc::new(MemoryBackend::seeded());
    let state = state_over(&backend, cache);
    (state, backend)
}

pub fn state_over(backend: &Arc<MemoryBackend>, cache: Arc<dyn SessionCache>) -> AppState {
    AppState::new(AppConfig::offline(), backend.clone(), backend.clone(), cache)
}

pub fn customer(name: &str) -> Identity {
    Identity {
        id: Uuid::new_v4(),
        name: name.into(),
        email: format!("{}@example.com", name.to_lowercase()),
        role: Role::Customer,
        phone: Some("+254700000000".into()),
        location: Some(Location::Westlands),
        verified: true,
        avatar: None,
        rating: None,
        review_count: None,
    }
}

pub fn seed_identity(id: Uuid) -> Identity {
    seed::seed_identities()
        .into_iter()
        .find(|i| i.id == id)
        .expect("seed identity")
}

/// Registers `identity` with the backend and signs it in through the gate.
pub async fn sign_in(state: &AppState, backend: &MemoryBackend, identity: Identity) -> Identity {
    let email = identity.email.clone();
    backend.add_account(identity, PASSWORD);
    state
        .session
        .login(&email, PASSWORD)
        .await
        .expect("sign in")
        .identity
}
