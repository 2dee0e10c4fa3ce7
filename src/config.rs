use std::{env, path::PathBuf};

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Hosted backend; `None` runs the storefront on the seed dataset.
    pub database_url: Option<String>,
    pub jwt_secret: Option<String>,
    pub session_ttl_hours: i64,
    pub session_cache_dir: PathBuf,
    pub delivery_lead_days: i64,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL").ok().filter(|url| !url.is_empty());
        let jwt_secret = env::var("JWT_SECRET").ok().filter(|s| !s.is_empty());
        if database_url.is_some() && jwt_secret.is_none() {
            anyhow::bail!("JWT_SECRET must be set when DATABASE_URL is configured");
        }
        let session_ttl_hours = env::var("SESSION_TTL_HOURS")
            .ok()
            .and_then(|h| h.parse::<i64>().ok())
            .filter(|h| *h > 0)
            .unwrap_or(24);
        let session_cache_dir = env::var("SESSION_CACHE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(".pixelframe"));
        let delivery_lead_days = env::var("DELIVERY_LEAD_DAYS")
            .ok()
            .and_then(|d| d.parse::<i64>().ok())
            .filter(|d| *d >= 0)
            .unwrap_or(7);
        Ok(Self {
            database_url,
            jwt_secret,
            session_ttl_hours,
            session_cache_dir,
            delivery_lead_days,
        })
    }

    /// Configuration with no hosted backend, as used by tests and offline demos.
    pub fn offline() -> Self {
        Self {
            database_url: None,
            jwt_secret: None,
            session_ttl_hours: 24,
            session_cache_dir: PathBuf::from(".pixelframe"),
            delivery_lead_days: 7,
        }
    }
}
