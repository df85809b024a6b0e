//! In-memory counter store using moka
//!
//! Stands in for Redis in development and tests. Expiry is tracked per
//! entry; moka's own TTL acts as an upper-bound sweep.

use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache as MokaCache;
use tokio::sync::Mutex;

use crate::domain::{Cache, DomainError};

/// Configuration for the in-memory counter store
#[derive(Debug, Clone)]
pub struct InMemoryCacheConfig {
    /// Maximum number of entries
    pub max_capacity: u64,
    /// Upper bound on entry lifetime, regardless of per-entry TTL
    pub max_ttl: Duration,
}

impl Default for InMemoryCacheConfig {
    fn default() -> Self {
        Self {
            max_capacity: 100_000,
            max_ttl: Duration::from_secs(3600),
        }
    }
}

/// Cache entry with its own expiry
#[derive(Debug, Clone)]
struct CacheEntry {
    data: String,
    /// Expiration timestamp (millis since epoch)
    expires_at: u64,
}

/// Thread-safe in-memory counter store
#[derive(Debug)]
pub struct InMemoryCache {
    cache: MokaCache<String, CacheEntry>,
    /// Serializes read-modify-write increments
    incr_lock: Mutex<()>,
}

impl InMemoryCache {
    /// Create a store with default configuration
    pub fn new() -> Self {
        Self::with_config(InMemoryCacheConfig::default())
    }

    /// Create a store with the given configuration
    pub fn with_config(config: InMemoryCacheConfig) -> Self {
        let cache = MokaCache::builder()
            .max_capacity(config.max_capacity)
            .time_to_live(config.max_ttl)
            .build();

        Self {
            cache,
            incr_lock: Mutex::new(()),
        }
    }

    fn current_time_millis() -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }

    fn is_expired(entry: &CacheEntry) -> bool {
        Self::current_time_millis() > entry.expires_at
    }

    async fn live_entry(&self, key: &str) -> Option<CacheEntry> {
        match self.cache.get(key).await {
            Some(entry) if Self::is_expired(&entry) => {
                self.cache.remove(key).await;
                None
            }
            other => other,
        }
    }
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Cache for InMemoryCache {
    async fn get_raw(&self, key: &str) -> Result<Option<String>, DomainError> {
        Ok(self.live_entry(key).await.map(|e| e.data))
    }

    async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> Result<(), DomainError> {
        let entry = CacheEntry {
            data: value.to_string(),
            expires_at: Self::current_time_millis() + ttl.as_millis() as u64,
        };

        self.cache.insert(key.to_string(), entry).await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, DomainError> {
        Ok(self.cache.remove(key).await.is_some())
    }

    async fn ttl(&self, key: &str) -> Result<Option<Duration>, DomainError> {
        Ok(self.live_entry(key).await.map(|entry| {
            let now = Self::current_time_millis();
            Duration::from_millis(entry.expires_at.saturating_sub(now))
        }))
    }

    async fn increment_with_ttl(
        &self,
        key: &str,
        delta: i64,
        ttl: Duration,
    ) -> Result<i64, DomainError> {
        let _guard = self.incr_lock.lock().await;

        let (new_value, expires_at) = match self.live_entry(key).await {
            Some(entry) => {
                let current: i64 = entry.data.parse().map_err(|e| {
                    DomainError::cache(format!("Malformed counter '{}': {}", key, e))
                })?;
                // Existing window keeps its expiry
                (current + delta, entry.expires_at)
            }
            None => (
                delta,
                Self::current_time_millis() + ttl.as_millis() as u64,
            ),
        };

        self.cache
            .insert(
                key.to_string(),
                CacheEntry {
                    data: new_value.to_string(),
                    expires_at,
                },
            )
            .await;

        Ok(new_value)
    }
}
