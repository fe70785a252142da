use async_trait::async_trait;
use redis::aio::ConnectionManager;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::models::{Coordinate, UserId, UserProfile};
use crate::services::store::{ProfileStore, StoreError};

/// Errors that can occur with cache operations
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Redis error: {0}")]
    RedisError(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Cache miss: {0}")]
    CacheMiss(String),
}

/// Multi-tier cache manager
///
/// L1 is an in-process moka cache. L2 is Redis, shared across instances,
/// and optional: without a Redis URL the manager runs L1-only.
pub struct CacheManager {
    redis: Option<Arc<tokio::sync::Mutex<ConnectionManager>>>,
    l1_cache: moka::future::Cache<String, Vec<u8>>,
    ttl_secs: u64,
}

impl CacheManager {
    /// Create a new cache manager
    pub async fn new(redis_url: Option<&str>, l1_size: u64, ttl_secs: u64) -> Result<Self, CacheError> {
        let redis = match redis_url {
            Some(url) => {
                let client = redis::Client::open(url)?;
                let manager = ConnectionManager::new(client).await?;
                Some(Arc::new(tokio::sync::Mutex::new(manager)))
            }
            None => None,
        };

        let l1_cache = moka::future::CacheBuilder::new(l1_size)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();

        Ok(Self {
            redis,
            l1_cache,
            ttl_secs,
        })
    }

    pub fn has_redis(&self) -> bool {
        self.redis.is_some()
    }

    /// Get a value from cache (L1 first, then L2)
    pub async fn get<T>(&self, key: &str) -> Result<T, CacheError>
    where
        T: for<'de> Deserialize<'de>,
    {
        if let Some(bytes) = self.l1_cache.get(key).await {
            tracing::trace!("L1 cache hit: {}", key);
            return Ok(serde_json::from_slice(&bytes)?);
        }

        if let Some(redis) = &self.redis {
            let mut conn = redis.lock().await;
            let value: Option<String> = redis::cmd("GET")
                .arg(key)
                .query_async(&mut *conn)
                .await?;
            drop(conn);

            if let Some(json) = value {
                tracing::trace!("L2 cache hit: {}", key);
                self.l1_cache.insert(key.to_string(), json.as_bytes().to_vec()).await;
                return Ok(serde_json::from_str(&json)?);
            }
        }

        tracing::trace!("Cache miss: {}", key);
        Err(CacheError::CacheMiss(key.to_string()))
    }

    /// Set a value in cache (both L1 and L2)
    pub async fn set<T>(&self, key: &str, value: &T) -> Result<(), CacheError>
    where
        T: Serialize,
    {
        let json = serde_json::to_string(value)?;

        self.l1_cache.insert(key.to_string(), json.as_bytes().to_vec()).await;

        if let Some(redis) = &self.redis {
            let mut conn = redis.lock().await;
            let _: () = redis::cmd("SETEX")
                .arg(key)
                .arg(self.ttl_secs)
                .arg(json)
                .query_async(&mut *conn)
                .await?;
        }

        tracing::trace!("Cache set: {}", key);
        Ok(())
    }

    /// Delete a value from both cache tiers
    pub async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.l1_cache.invalidate(key).await;

        if let Some(redis) = &self.redis {
            let mut conn = redis.lock().await;
            let _: () = redis::cmd("DEL")
                .arg(key)
                .query_async(&mut *conn)
                .await?;
        }
        Ok(())
    }
}

/// Cache key builder
pub struct CacheKey;

impl CacheKey {
    /// Build a cache key for a user profile
    pub fn profile(user_id: UserId) -> String {
        format!("profile:{}", user_id)
    }

    /// Key for the active-profile population snapshot
    pub fn active_profiles() -> String {
        "profiles:active".to_string()
    }
}

/// Read-through cache in front of another profile store.
///
/// Cache failures are logged and fall through to the inner store; they never
/// fail a request. Writes go to the inner store and then evict the affected
/// keys. The population snapshot may lag by up to the TTL, which candidate
/// discovery tolerates.
pub struct CachedProfileStore<S> {
    inner: S,
    cache: CacheManager,
}

impl<S: ProfileStore> CachedProfileStore<S> {
    pub fn new(inner: S, cache: CacheManager) -> Self {
        Self { inner, cache }
    }

    async fn evict(&self, user_id: UserId) {
        for key in [CacheKey::profile(user_id), CacheKey::active_profiles()] {
            if let Err(e) = self.cache.delete(&key).await {
                tracing::warn!("Failed to invalidate cache key {}: {}", key, e);
            }
        }
    }
}

#[async_trait]
impl<S: ProfileStore> ProfileStore for CachedProfileStore<S> {
    async fn get_profile(&self, user_id: UserId) -> Result<Option<UserProfile>, StoreError> {
        let key = CacheKey::profile(user_id);
        match self.cache.get::<UserProfile>(&key).await {
            Ok(profile) => return Ok(Some(profile)),
            Err(CacheError::CacheMiss(_)) => {}
            Err(e) => tracing::warn!("Profile cache read failed for {}: {}", user_id, e),
        }

        let profile = self.inner.get_profile(user_id).await?;
        if let Some(profile) = &profile {
            if let Err(e) = self.cache.set(&key, profile).await {
                tracing::warn!("Profile cache write failed for {}: {}", user_id, e);
            }
        }
        Ok(profile)
    }

    async fn active_profiles(&self) -> Result<Vec<UserProfile>, StoreError> {
        let key = CacheKey::active_profiles();
        match self.cache.get::<Vec<UserProfile>>(&key).await {
            Ok(profiles) => return Ok(profiles),
            Err(CacheError::CacheMiss(_)) => {}
            Err(e) => tracing::warn!("Population cache read failed: {}", e),
        }

        let profiles = self.inner.active_profiles().await?;
        if let Err(e) = self.cache.set(&key, &profiles).await {
            tracing::warn!("Population cache write failed: {}", e);
        }
        Ok(profiles)
    }

    async fn update_location(
        &self,
        user_id: UserId,
        location: Option<Coordinate>,
    ) -> Result<bool, StoreError> {
        let updated = self.inner.update_location(user_id, location).await?;
        self.evict(user_id).await;
        Ok(updated)
    }

    async fn update_online_status(&self, user_id: UserId, online: bool) -> Result<bool, StoreError> {
        let updated = self.inner.update_online_status(user_id, online).await?;
        self.evict(user_id).await;
        Ok(updated)
    }
}
