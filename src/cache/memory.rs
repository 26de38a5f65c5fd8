use super::{Cache, CacheError, CacheResult};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// In-memory backend. Each entry carries its own deadline; expired entries
/// read as absent and are swept out on the next write.
pub struct MemoryCache {
    entries: RwLock<HashMap<String, Entry>>,
}

#[derive(Debug)]
struct Entry {
    payload: String,
    deadline: Option<DateTime<Utc>>,
}

impl Entry {
    fn live(&self) -> bool {
        match self.deadline {
            Some(deadline) => Utc::now() <= deadline,
            None => true,
        }
    }
}

impl MemoryCache {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Cache for MemoryCache {
    async fn get<T>(&self, key: &str) -> CacheResult<Option<T>>
    where
        T: serde::de::DeserializeOwned + Send,
    {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|entry| entry.live())
            .map(|entry| {
                serde_json::from_str(&entry.payload)
                    .map_err(|e| CacheError::Serialization(e.to_string()))
            })
            .transpose()
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
        let payload =
            serde_json::to_string(value).map_err(|e| CacheError::Serialization(e.to_string()))?;
        let deadline = match ttl {
            Some(ttl) => Some(
                Utc::now()
                    + chrono::Duration::from_std(ttl)
                        .map_err(|e| CacheError::Cache(e.to_string()))?,
            ),
            None => None,
        };

        let mut entries = self.entries.write().await;
        // Writes double as the sweep point for anything already expired
        entries.retain(|_, entry| entry.live());
        entries.insert(key.to_string(), Entry { payload, deadline });

        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> CacheResult<bool> {
        let entries = self.entries.read().await;
        Ok(entries.get(key).is_some_and(Entry::live))
    }
}
