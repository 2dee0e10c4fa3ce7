use std::sync::Arc;

use crate::{
    backend::{
        DataBackend, OrmBackend, OrmSessionBackend, SessionBackend, UnconfiguredBackend,
    },
    cache::{FileSessionCache, SessionCache},
    config::AppConfig,
    guard::SubmitGuard,
    services::{catalog_service::CatalogStore, session_service::SessionGate},
};

/// Everything a UI consumer needs, passed explicitly instead of held in globals.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub data: Arc<dyn DataBackend>,
    pub catalog: Arc<CatalogStore>,
    pub session: Arc<SessionGate>,
    pub guard: SubmitGuard,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        data: Arc<dyn DataBackend>,
        sessions: Arc<dyn SessionBackend>,
        cache: Arc<dyn SessionCache>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            catalog: Arc::new(CatalogStore::new(Arc::clone(&data))),
            session: Arc::new(SessionGate::new(sessions, cache)),
            data,
            guard: SubmitGuard::new(),
        }
    }

    /// Hosted backend when `DATABASE_URL` is set, seed-only mode otherwise.
    pub async fn from_config(config: AppConfig) -> anyhow::Result<Self> {
        let cache: Arc<dyn SessionCache> =
            Arc::new(FileSessionCache::new(config.session_cache_dir.clone()));

        let Some(database_url) = config.database_url.clone() else {
            tracing::warn!("DATABASE_URL not set, running on seed data");
            let backend = Arc::new(UnconfiguredBackend::new());
            return Ok(Self::new(config, backend.clone(), backend, cache));
        };

        let jwt_secret = config
            .jwt_secret
            .clone()
            .ok_or_else(|| anyhow::anyhow!("JWT_SECRET must be set when DATABASE_URL is configured"))?;
        let data = OrmBackend::connect(&database_url).await?;
        let sessions = OrmSessionBackend::new(
            data.conn().clone(),
            jwt_secret,
            config.session_ttl_hours,
        );
        tracing::info!("connected to hosted marketplace backend");
        Ok(Self::new(config, Arc::new(data), Arc::new(sessions), cache))
    }
}
