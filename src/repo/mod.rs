/// Repository layer: persisted location config and the last-good payload
use crate::config::LocationConfig;
use crate::domain::WeatherPayload;
use crate::errors::{ApiError, ApiResult};
use chrono::{DateTime, Utc};
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use tracing::debug;

/// A payload together with the moment it was derived
#[derive(Debug, Clone, PartialEq)]
pub struct CachedPayload {
    pub payload: WeatherPayload,
    pub captured_at: DateTime<Utc>,
}

impl CachedPayload {
    /// Copy of the held payload annotated as stale relative to `now`.
    pub fn as_stale(&self, now: DateTime<Utc>) -> WeatherPayload {
        let mut payload = self.payload.clone();
        payload.stale = Some(true);
        payload.stale_age_ms = Some((now - self.captured_at).num_milliseconds().max(0));
        payload
    }
}

/// Holder of the last successfully derived payload.
///
/// Starts empty, is overwritten on every successful run, and is never
/// expired or cleared.
pub trait FreshnessCache: Send + Sync {
    fn get(&self) -> Option<CachedPayload>;
    fn put(&self, payload: WeatherPayload, captured_at: DateTime<Utc>);
}

/// Process-lifetime in-memory cache
#[derive(Debug, Default)]
pub struct MemoryCache {
    slot: RwLock<Option<CachedPayload>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FreshnessCache for MemoryCache {
    fn get(&self) -> Option<CachedPayload> {
        self.slot
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn put(&self, payload: WeatherPayload, captured_at: DateTime<Utc>) {
        let mut slot = self
            .slot
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *slot = Some(CachedPayload {
            payload,
            captured_at,
        });
    }
}

/// JSON-file backed location config.
///
/// Reads and writes go through one lock so a read never observes a partial
/// write; writes land via a temp file and rename.
#[derive(Clone)]
pub struct ConfigStore {
    path: PathBuf,
    lock: Arc<tokio::sync::RwLock<()>>,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Arc::new(tokio::sync::RwLock::new(())),
        }
    }

    /// Read the config fresh from disk
    pub async fn load(&self) -> ApiResult<LocationConfig> {
        let _guard = self.lock.read().await;
        self.read_file().await
    }

    /// Persist the config, replacing the file atomically
    #[cfg(test)]
    pub async fn save(&self, cfg: &LocationConfig) -> ApiResult<()> {
        let _guard = self.lock.write().await;
        self.write_file(cfg).await
    }

    /// Re-read the file and apply `edit` to it under one write lock, so edits
    /// made on disk since the caller's last `load` are kept.
    pub async fn update<F>(&self, edit: F) -> ApiResult<LocationConfig>
    where
        F: FnOnce(&mut LocationConfig),
    {
        let _guard = self.lock.write().await;
        let mut cfg = self.read_file().await?;
        edit(&mut cfg);
        self.write_file(&cfg).await?;
        Ok(cfg)
    }

    async fn read_file(&self) -> ApiResult<LocationConfig> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(ApiError::ConfigMissing),
            Err(e) => return Err(e.into()),
        };
        let cfg: LocationConfig = serde_json::from_str(&raw).map_err(|e| {
            ApiError::ConfigInvalid(format!("{}: {}", self.path.display(), e))
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    async fn write_file(&self, cfg: &LocationConfig) -> ApiResult<()> {
        let body = serde_json::to_string_pretty(cfg)
            .map_err(|e| ApiError::Internal(format!("serialize config: {}", e)))?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        tokio::fs::write(&tmp, body).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        debug!(path = %self.path.display(), "location config written");
        Ok(())
    }
}
