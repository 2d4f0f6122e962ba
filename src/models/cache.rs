//! Model blob cache: in-process TTL map by default, Redis with the `redis` feature.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use rustc_hash::FxHashMap;
use tracing::debug;

use super::errors::ModelError;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ModelCache: Send + Sync {
    /// Blob for `name`, or `None` when absent or expired
    async fn get(&self, name: &str) -> Result<Option<Vec<u8>>, ModelError>;

    async fn set(&self, name: &str, blob: Vec<u8>, ttl: Duration) -> Result<(), ModelError>;

    /// Drop `name`; returns whether an entry was removed
    async fn expire(&self, name: &str) -> Result<bool, ModelError>;

    /// Round-trip to the backend for health reporting
    async fn ping(&self) -> Result<(), ModelError>;

    fn backend(&self) -> &'static str;
}

struct CachedModel {
    inserted_at: Instant,
    ttl: Duration,
    blob: Vec<u8>,
}

/// Mutex-guarded map; expiry is checked on read, no background sweeper
#[derive(Default)]
pub struct InMemoryModelCache {
    entries: Mutex<FxHashMap<String, CachedModel>>,
}

impl InMemoryModelCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, FxHashMap<String, CachedModel>>, ModelError> {
        self.entries
            .lock()
            .map_err(|e| ModelError::CacheUnavailable(format!("memory cache lock poisoned: {}", e)))
    }
}

#[async_trait]
impl ModelCache for InMemoryModelCache {
    async fn get(&self, name: &str) -> Result<Option<Vec<u8>>, ModelError> {
        let mut entries = self.lock()?;
        let expired = match entries.get(name) {
            None => return Ok(None),
            Some(entry) => entry.inserted_at.elapsed() >= entry.ttl,
        };

        if expired {
            entries.remove(name);
            debug!("⏰ Cached model {} expired", name);
            return Ok(None);
        }
        Ok(entries.get(name).map(|entry| entry.blob.clone()))
    }

    async fn set(&self, name: &str, blob: Vec<u8>, ttl: Duration) -> Result<(), ModelError> {
        let mut entries = self.lock()?;
        entries.insert(
            name.to_string(),
            CachedModel {
                inserted_at: Instant::now(),
                ttl,
                blob,
            },
        );
        Ok(())
    }

    async fn expire(&self, name: &str) -> Result<bool, ModelError> {
        Ok(self.lock()?.remove(name).is_some())
    }

    async fn ping(&self) -> Result<(), ModelError> {
        self.lock().map(|_| ())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

#[cfg(feature = "redis")]
pub use redis_cache::RedisModelCache;

#[cfg(feature = "redis")]
mod redis_cache {
    use std::time::Duration;

    use async_trait::async_trait;
    use redis::{aio::ConnectionManager, AsyncCommands, Client};
    use tracing::{debug, info};

    use super::ModelCache;
    use crate::common::constants::REDIS_MODEL_KEY_PREFIX;
    use crate::models::errors::ModelError;

    /// Shared cache across instances; keys are `model:<name>` with a server-side TTL
    pub struct RedisModelCache {
        conn: ConnectionManager,
    }

    impl RedisModelCache {
        pub async fn connect(url: &str) -> Result<Self, ModelError> {
            let client = Client::open(url)?;
            let conn = ConnectionManager::new(client).await?;

            info!(url = %url, "🔗 Connected to Redis for model cache");
            Ok(Self { conn })
        }

        fn key(name: &str) -> String {
            format!("{}{}", REDIS_MODEL_KEY_PREFIX, name)
        }
    }

    #[async_trait]
    impl ModelCache for RedisModelCache {
        async fn get(&self, name: &str) -> Result<Option<Vec<u8>>, ModelError> {
            let mut conn = self.conn.clone();
            let blob: Option<Vec<u8>> = conn.get(Self::key(name)).await?;
            if blob.is_some() {
                debug!(model = %name, "Loaded model blob from Redis");
            }
            Ok(blob)
        }

        async fn set(&self, name: &str, blob: Vec<u8>, ttl: Duration) -> Result<(), ModelError> {
            let mut conn = self.conn.clone();
            let _: () = conn.set_ex(Self::key(name), blob, ttl.as_secs().max(1)).await?;
            Ok(())
        }

        async fn expire(&self, name: &str) -> Result<bool, ModelError> {
            let mut conn = self.conn.clone();
            let removed: u64 = conn.del(Self::key(name)).await?;
            Ok(removed > 0)
        }

        async fn ping(&self) -> Result<(), ModelError> {
            let mut conn = self.conn.clone();
            let _: bool = conn.exists(Self::key("__ping__")).await?;
            Ok(())
        }

        fn backend(&self) -> &'static str {
            "redis"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_cache_round_trip() {
        let cache = InMemoryModelCache::new();
        cache.set("network_optimization", b"{}".to_vec(), Duration::from_secs(60)).await.unwrap();

        assert_eq!(cache.get("network_optimization").await.unwrap(), Some(b"{}".to_vec()));
        assert_eq!(cache.get("system_optimization").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_memory_cache_deletes_expired_entry_on_read() {
        let cache = InMemoryModelCache::new();
        cache.set("server_recommender", b"{}".to_vec(), Duration::ZERO).await.unwrap();

        assert_eq!(cache.get("server_recommender").await.unwrap(), None);
        assert!(!cache.expire("server_recommender").await.unwrap());
    }

    #[tokio::test]
    async fn test_memory_cache_expire() {
        let cache = InMemoryModelCache::new();
        cache.set("system_optimization", vec![1, 2, 3], Duration::from_secs(60)).await.unwrap();

        assert!(cache.expire("system_optimization").await.unwrap());
        assert!(!cache.expire("system_optimization").await.unwrap());
        assert!(cache.ping().await.is_ok());
        assert_eq!(cache.backend(), "memory");
    }
}
