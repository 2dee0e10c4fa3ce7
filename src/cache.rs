use std::{
    collections::HashMap,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Mutex,
};

use async_trait::async_trait;
use tokio::fs;

use crate::error::{AppError, AppResult};

/// Slot holding the serialized signed-in identity.
pub const SESSION_KEY: &str = "pixelframe_user";

/// Durable string slots keyed by name, read at startup and cleared on logout.
#[async_trait]
pub trait SessionCache: Send + Sync {
    async fn read(&self, key: &str) -> AppResult<Option<String>>;
    async fn write(&self, key: &str, value: &str) -> AppResult<()>;
    async fn clear(&self, key: &str) -> AppResult<()>;
}

/// One JSON file per key under a directory.
#[derive(Debug, Clone)]
pub struct FileSessionCache {
    dir: PathBuf,
}

impl FileSessionCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn slot(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

#[async_trait]
impl SessionCache for FileSessionCache {
    async fn read(&self, key: &str) -> AppResult<Option<String>> {
        match fs::read_to_string(self.slot(key)).await {
            Ok(raw) => Ok(Some(raw)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(AppError::Internal(err.into())),
        }
    }

    async fn write(&self, key: &str, value: &str) -> AppResult<()> {
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| AppError::Internal(e.into()))?;
        fs::write(self.slot(key), value)
            .await
            .map_err(|e| AppError::Internal(e.into()))
    }

    async fn clear(&self, key: &str) -> AppResult<()> {
        match fs::remove_file(self.slot(key)).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(AppError::Internal(err.into())),
        }
    }
}

#[derive(Debug, Default)]
pub struct MemorySessionCache {
    slots: Mutex<HashMap<String, String>>,
}

impl MemorySessionCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn slots(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl SessionCache for MemorySessionCache {
    async fn read(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.slots().get(key).cloned())
    }

    async fn write(&self, key: &str, value: &str) -> AppResult<()> {
        self.slots().insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn clear(&self, key: &str) -> AppResult<()> {
        self.slots().remove(key);
        Ok(())
    }
}
