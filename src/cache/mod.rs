//! Cache layer for short-lived OAuth flow state
//!
//! Pending authorization state and freshly exchanged credentials are held
//! here under explicit TTLs; nothing in this service persists beyond them.
//! The surface is deliberately small: set-with-expiry, get, delete, and an
//! existence probe. All values are JSON strings.

pub mod memory;
pub mod redis;

pub use memory::MemoryCache;
pub use redis::RedisCache;

use crate::config::CacheConfig;
use thiserror::Error;

/// Cache error types
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache error: {0}")]
    Cache(String),
    #[error("Connection error: {0}")]
    Connection(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type CacheResult<T> = Result<T, CacheError>;

/// Keyed store with per-entry expiration. Expired entries read as absent.
#[async_trait::async_trait]
pub trait Cache: Send + Sync {
    async fn get<T>(&self, key: &str) -> CacheResult<Option<T>>
    where
        T: serde::de::DeserializeOwned + Send;

    async fn set<T>(
        &self,
        key: &str,
        value: &T,
        ttl: Option<std::time::Duration>,
    ) -> CacheResult<()>
    where
        T: serde::Serialize + Send + Sync;

    /// Remove a key; removing an absent key is not an error
    async fn delete(&self, key: &str) -> CacheResult<()>;

    async fn exists(&self, key: &str) -> CacheResult<bool>;
}

/// Backend selected at startup. Enum dispatch rather than trait objects
/// because the cache methods are generic over the stored type.
pub enum CacheBackend {
    Memory(MemoryCache),
    Redis(RedisCache),
}

#[async_trait::async_trait]
impl Cache for CacheBackend {
    async fn get<T>(&self, key: &str) -> CacheResult<Option<T>>
    where
        T: serde::de::DeserializeOwned + Send,
    {
        match self {
            CacheBackend::Memory(cache) => cache.get(key).await,
            CacheBackend::Redis(cache) => cache.get(key).await,
        }
    }

    async fn set<T>(
        &self,
        key: &str,
        value: &T,
        ttl: Option<std::time::Duration>,
    ) -> CacheResult<()>
    where
        T: serde::Serialize + Send + Sync,
    {
        match self {
            CacheBackend::Memory(cache) => cache.set(key, value, ttl).await,
            CacheBackend::Redis(cache) => cache.set(key, value, ttl).await,
        }
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        match self {
            CacheBackend::Memory(cache) => cache.delete(key).await,
            CacheBackend::Redis(cache) => cache.delete(key).await,
        }
    }

    async fn exists(&self, key: &str) -> CacheResult<bool> {
        match self {
            CacheBackend::Memory(cache) => cache.exists(key).await,
            CacheBackend::Redis(cache) => cache.exists(key).await,
        }
    }
}

/// Cache manager - selects the backend from configuration
pub struct CacheManager;

impl CacheManager {
    /// Memory-backed cache for tests and single-instance deployments
    pub fn new_memory() -> CacheBackend {
        CacheBackend::Memory(MemoryCache::new())
    }

    /// Create a cache from configuration, failing fast if the Redis
    /// backend is configured but unreachable.
    pub async fn new_from_config(config: &CacheConfig) -> CacheResult<CacheBackend> {
        match config.backend.as_str() {
            "redis" => Ok(CacheBackend::Redis(
                RedisCache::connect(&config.redis_url, config.key_prefix.clone()).await?,
            )),
            "memory" => Ok(CacheBackend::Memory(MemoryCache::new())),
            other => Err(CacheError::Cache(format!("Unknown cache backend: {other}"))),
        }
    }
}
