use super::{Cache, CacheError, CacheResult};
use redis::{aio::MultiplexedConnection, AsyncCommands, Client};
use std::time::Duration;

/// Redis backend. A single multiplexed connection is established (and
/// pinged) at startup and cloned per operation; every key gets the
/// configured prefix so the connector stays inside its own namespace on a
/// shared database.
pub struct RedisCache {
    connection: MultiplexedConnection,
    key_prefix: String,
}

impl RedisCache {
    pub async fn connect(redis_url: &str, key_prefix: String) -> CacheResult<Self> {
        let client = Client::open(redis_url)
            .map_err(|e| CacheError::Connection(format!("Invalid Redis URL: {e}")))?;

        let mut connection = client
            .get_multiplexed_tokio_connection()
            .await
            .map_err(|e| CacheError::Connection(format!("Redis connection failed: {e}")))?;

        let _: String = redis::cmd("PING")
            .query_async(&mut connection)
            .await
            .map_err(|e| CacheError::Connection(format!("Redis ping failed: {e}")))?;

        Ok(Self {
            connection,
            key_prefix,
        })
    }
}

fn prefixed(prefix: &str, key: &str) -> String {
    format!("{prefix}{key}")
}

#[async_trait::async_trait]
impl Cache for RedisCache {
    async fn get<T>(&self, key: &str) -> CacheResult<Option<T>>
    where
        T: serde::de::DeserializeOwned + Send,
    {
        let mut conn = self.connection.clone();
        let raw: Option<String> = conn
            .get(prefixed(&self.key_prefix, key))
            .await
            .map_err(|e| CacheError::Cache(e.to_string()))?;

        raw.map(|payload| {
            serde_json::from_str(&payload).map_err(|e| CacheError::Serialization(e.to_string()))
        })
        .transpose()
    }

    async fn set<T>(&self, key: &str, value: &T, ttl: Option<Duration>) -> CacheResult<()>
    where
        T: serde::Serialize + Send + Sync,
    {
        let payload =
            serde_json::to_string(value).map_err(|e| CacheError::Serialization(e.to_string()))?;
        let key = prefixed(&self.key_prefix, key);

        let mut conn = self.connection.clone();
        match ttl {
            Some(ttl) => {
                let _: () = conn
                    .set_ex(key, payload, ttl.as_secs())
                    .await
                    .map_err(|e| CacheError::Cache(e.to_string()))?;
            }
            None => {
                let _: () = conn
                    .set(key, payload)
                    .await
                    .map_err(|e| CacheError::Cache(e.to_string()))?;
            }
        }

        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        let mut conn = self.connection.clone();
        let _: () = conn
            .del(prefixed(&self.key_prefix, key))
            .await
            .map_err(|e| CacheError::Cache(e.to_string()))?;
        Ok(())
    }

    async fn exists(&self, key: &str) -> CacheResult<bool> {
        let mut conn = self.connection.clone();
        conn.exists(prefixed(&self.key_prefix, key))
            .await
            .map_err(|e| CacheError::Cache(e.to_string()))
    }
}
