use redis::aio::ConnectionManager;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::models::MatchSummary;

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

/// A cached value and the generation it was read under
#[derive(Debug, Serialize, Deserialize)]
struct Generational<T> {
    generation: u64,
    value: T,
}

/// Multi-tier cache for per-user match lists
///
/// L1 is an in-process moka cache. L2 is Redis shared across instances,
/// or absent when running in-process only.
///
/// Match lists are tagged with a per-user generation. Resolving a match
/// bumps the generation of both users, and an entry whose tag no longer
/// matches is treated as a miss. A reader that loaded a list before the
/// bump can still write it, but nobody will ever be served that list.
/// Generation counters never expire, so a counter can't reset under a
/// live entry.
pub struct CacheManager {
    redis: Option<Arc<Mutex<ConnectionManager>>>,
    l1_cache: moka::future::Cache<String, Vec<u8>>,
    local_generations: Mutex<HashMap<String, u64>>,
    ttl_secs: u64,
}

impl CacheManager {
    /// Create a cache backed by Redis
    pub async fn new(redis_url: &str, l1_size: u64, ttl_secs: u64) -> Result<Self, CacheError> {
        let client = redis::Client::open(redis_url)?;
        let redis = redis::aio::ConnectionManager::new(client).await?;

        let mut cache = Self::in_process(l1_size, ttl_secs);
        cache.redis = Some(Arc::new(Mutex::new(redis)));
        Ok(cache)
    }

    /// Create a cache that lives in this process only
    ///
    /// Only correct for a single instance: other instances never see its
    /// invalidations.
    pub fn in_process(l1_size: u64, ttl_secs: u64) -> Self {
        let l1_cache = moka::future::CacheBuilder::new(l1_size)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();

        Self {
            redis: None,
            l1_cache,
            local_generations: Mutex::new(HashMap::new()),
            ttl_secs,
        }
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

        if let Some(connection) = &self.redis {
            let mut conn = connection.lock().await;
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

    /// Set a value in every configured tier
    pub async fn set<T>(&self, key: &str, value: &T) -> Result<(), CacheError>
    where
        T: Serialize,
    {
        let json = serde_json::to_string(value)?;

        self.l1_cache.insert(key.to_string(), json.as_bytes().to_vec()).await;

        if let Some(connection) = &self.redis {
            let mut conn = connection.lock().await;
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

    /// Delete a value from every configured tier
    pub async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.l1_cache.invalidate(key).await;

        if let Some(connection) = &self.redis {
            let mut conn = connection.lock().await;
            let _: () = redis::cmd("DEL").arg(key).query_async(&mut *conn).await?;
        }
        Ok(())
    }

    /// Current match-list generation for `user_id`
    ///
    /// Read it before loading the list from the store and hand it back
    /// to [`fill_matches`](Self::fill_matches).
    pub async fn matches_generation(&self, user_id: &str) -> Result<u64, CacheError> {
        let key = CacheKey::matches_generation(user_id);

        match &self.redis {
            Some(connection) => {
                let mut conn = connection.lock().await;
                let value: Option<u64> = redis::cmd("GET").arg(&key).query_async(&mut *conn).await?;
                Ok(value.unwrap_or(0))
            }
            None => Ok(self.local_generations.lock().await.get(&key).copied().unwrap_or(0)),
        }
    }

    /// Cached match list for `user_id`, if present and still current
    pub async fn get_matches(&self, user_id: &str) -> Result<Option<Vec<MatchSummary>>, CacheError> {
        let key = CacheKey::matches(user_id);

        let entry: Generational<Vec<MatchSummary>> = match self.get(&key).await {
            Ok(entry) => entry,
            Err(CacheError::CacheMiss(_)) => return Ok(None),
            Err(e) => return Err(e),
        };

        let current = self.matches_generation(user_id).await?;
        if entry.generation != current {
            tracing::debug!(
                "Discarding stale match list for {} (generation {} < {})",
                user_id,
                entry.generation,
                current
            );
            self.l1_cache.invalidate(&key).await;
            return Ok(None);
        }

        Ok(Some(entry.value))
    }

    /// Cache a match list loaded under `generation`
    ///
    /// Skipped when the generation has already moved on.
    pub async fn fill_matches(
        &self,
        user_id: &str,
        generation: u64,
        matches: &[MatchSummary],
    ) -> Result<(), CacheError> {
        if self.matches_generation(user_id).await? != generation {
            tracing::debug!("Match list for {} changed while loading, not caching", user_id);
            return Ok(());
        }

        self.set(
            &CacheKey::matches(user_id),
            &Generational {
                generation,
                value: matches,
            },
        )
        .await
    }

    /// Invalidate cached match lists for both members of a pair
    pub async fn invalidate_matches(&self, first: &str, second: &str) -> Result<(), CacheError> {
        for user_id in [first, second] {
            self.bump_generation(user_id).await?;
            self.delete(&CacheKey::matches(user_id)).await?;
        }
        Ok(())
    }

    async fn bump_generation(&self, user_id: &str) -> Result<(), CacheError> {
        let key = CacheKey::matches_generation(user_id);

        match &self.redis {
            Some(connection) => {
                let mut conn = connection.lock().await;
                let _: u64 = redis::cmd("INCR").arg(&key).query_async(&mut *conn).await?;
            }
            None => {
                *self.local_generations.lock().await.entry(key).or_insert(0) += 1;
            }
        }
        Ok(())
    }
}

/// Cache key builder
pub struct CacheKey;

impl CacheKey {
    /// Build a cache key for a user's match list
    pub fn matches(user_id: &str) -> String {
        format!("matches:{}", user_id)
    }

    /// Build the key holding a user's match-list generation
    pub fn matches_generation(user_id: &str) -> String {
        format!("matches-gen:{}", user_id)
    }
}
