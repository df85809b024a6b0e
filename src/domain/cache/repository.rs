//! Cache trait definition

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::DomainError;

/// Key-value counter store with TTL support.
///
/// This is the rate limiter's view of its backing store: string values with
/// expiry plus an atomic counter increment. Values are small and ephemeral;
/// losing them (e.g. a store restart) resets the limiter, which is an
/// accepted imprecision rather than an error.
#[async_trait]
pub trait Cache: Send + Sync + Debug {
    /// Gets a raw value from the cache
    async fn get_raw(&self, key: &str) -> Result<Option<String>, DomainError>;

    /// Sets a raw value in the cache with a TTL
    async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> Result<(), DomainError>;

    /// Deletes a value from the cache
    async fn delete(&self, key: &str) -> Result<bool, DomainError>;

    /// Checks if a key exists in the cache
    async fn exists(&self, key: &str) -> Result<bool, DomainError> {
        Ok(self.get_raw(key).await?.is_some())
    }

    /// Gets the remaining TTL for a key
    async fn ttl(&self, key: &str) -> Result<Option<Duration>, DomainError>;

    /// Increments a numeric value, returning the new value.
    ///
    /// The TTL must be applied only when the increment creates the key, so a
    /// counter's window never slides on subsequent increments. The whole
    /// operation must be atomic with respect to concurrent increments of the
    /// same key.
    async fn increment_with_ttl(
        &self,
        key: &str,
        delta: i64,
        ttl: Duration,
    ) -> Result<i64, DomainError>;

    /// Reads a key as an integer counter; missing keys read as zero
    async fn get_counter(&self, key: &str) -> Result<i64, DomainError> {
        match self.get_raw(key).await? {
            Some(raw) => raw
                .parse::<i64>()
                .map_err(|e| DomainError::cache(format!("Malformed counter '{key}': {e}"))),
            None => Ok(0),
        }
    }
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Mock cache for testing: stores TTLs without enforcing them, and can
    /// be armed to fail every operation.
    #[derive(Debug, Default)]
    pub struct MockCache {
        entries: Mutex<HashMap<String, (String, Option<Duration>)>>,
        error: Mutex<Option<String>>,
    }

    impl MockCache {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_error(self, error: impl Into<String>) -> Self {
            *self.error.lock().unwrap() = Some(error.into());
            self
        }

        pub fn set_error(&self, error: Option<String>) {
            *self.error.lock().unwrap() = error;
        }

        fn check_error(&self) -> Result<(), DomainError> {
            if let Some(error) = self.error.lock().unwrap().clone() {
                return Err(DomainError::cache(error));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl Cache for MockCache {
        async fn get_raw(&self, key: &str) -> Result<Option<String>, DomainError> {
            self.check_error()?;
            let entries = self.entries.lock().unwrap();
            Ok(entries.get(key).map(|(raw, _)| raw.clone()))
        }

        async fn set_raw(
            &self,
            key: &str,
            value: &str,
            ttl: Duration,
        ) -> Result<(), DomainError> {
            self.check_error()?;
            self.entries
                .lock()
                .unwrap()
                .insert(key.to_string(), (value.to_string(), Some(ttl)));
            Ok(())
        }

        async fn delete(&self, key: &str) -> Result<bool, DomainError> {
            self.check_error()?;
            Ok(self.entries.lock().unwrap().remove(key).is_some())
        }

        async fn ttl(&self, key: &str) -> Result<Option<Duration>, DomainError> {
            self.check_error()?;
            let entries = self.entries.lock().unwrap();
            Ok(entries.get(key).and_then(|(_, ttl)| *ttl))
        }

        async fn increment_with_ttl(
            &self,
            key: &str,
            delta: i64,
            ttl: Duration,
        ) -> Result<i64, DomainError> {
            self.check_error()?;
            let mut entries = self.entries.lock().unwrap();

            match entries.get_mut(key) {
                Some((raw, _)) => {
                    let current: i64 = raw.parse().unwrap_or(0);
                    let new_value = current + delta;
                    *raw = new_value.to_string();
                    Ok(new_value)
                }
                None => {
                    entries.insert(key.to_string(), (delta.to_string(), Some(ttl)));
                    Ok(delta)
                }
            }
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[tokio::test]
        async fn test_mock_cache_set_get() {
            let cache = MockCache::new();
            cache
                .set_raw("key1", "value1", Duration::from_secs(60))
                .await
                .unwrap();

            let result = cache.get_raw("key1").await.unwrap();
            assert_eq!(result, Some("value1".to_string()));
        }

        #[tokio::test]
        async fn test_mock_cache_increment_sets_ttl_once() {
            let cache = MockCache::new();

            let val = cache
                .increment_with_ttl("counter", 1, Duration::from_secs(60))
                .await
                .unwrap();
            assert_eq!(val, 1);

            // A second increment must not restart the window
            let val = cache
                .increment_with_ttl("counter", 1, Duration::from_secs(999))
                .await
                .unwrap();
            assert_eq!(val, 2);
            assert_eq!(
                cache.ttl("counter").await.unwrap(),
                Some(Duration::from_secs(60))
            );
        }

        #[tokio::test]
        async fn test_mock_cache_get_counter() {
            let cache = MockCache::new();
            assert_eq!(cache.get_counter("missing").await.unwrap(), 0);

            cache
                .increment_with_ttl("c", 5, Duration::from_secs(1))
                .await
                .unwrap();
            assert_eq!(cache.get_counter("c").await.unwrap(), 5);
        }

        #[tokio::test]
        async fn test_mock_cache_with_error() {
            let cache = MockCache::new().with_error("Test error");

            assert!(cache.get_raw("key").await.is_err());
            assert!(cache
                .increment_with_ttl("key", 1, Duration::from_secs(1))
                .await
                .is_err());
        }

        #[tokio::test]
        async fn test_mock_cache_delete() {
            let cache = MockCache::new();
            cache
                .set_raw("key1", "value1", Duration::from_secs(60))
                .await
                .unwrap();

            assert!(cache.delete("key1").await.unwrap());
            assert!(cache.get_raw("key1").await.unwrap().is_none());
        }
    }
}
