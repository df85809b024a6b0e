//! Fixed-window rate limiter
//!
//! One counter per API key in the counter store, expiring with the window.
//! The check is check-then-increment: a rejected request performs no
//! increment, so the first request of the next window always succeeds.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, warn};

use crate::domain::{Cache, DomainError};

/// Rate limit configuration
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Maximum requests per key per window
    pub limit: u32,
    /// Window length
    pub window: Duration,
    /// Admit requests when the counter store is unreachable.
    /// Either way the outcome is logged, never silent.
    pub fail_open: bool,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            limit: 10,
            window: Duration::from_secs(60),
            fail_open: true,
        }
    }
}

impl RateLimitConfig {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            limit,
            window,
            fail_open: true,
        }
    }

    pub fn with_fail_open(mut self, fail_open: bool) -> Self {
        self.fail_open = fail_open;
        self
    }
}

/// Result of a rate limit check
#[derive(Debug, Clone)]
pub struct RateLimitResult {
    /// Whether the request is allowed
    pub allowed: bool,
    /// Remaining requests in the current window
    pub remaining: u32,
    /// Total limit for the window
    pub limit: u32,
    /// Time until the window resets (in seconds)
    pub reset_in_seconds: u64,
}

/// Fixed-window limiter over a TTL counter store
#[derive(Debug)]
pub struct FixedWindowLimiter {
    cache: Arc<dyn Cache>,
    config: RateLimitConfig,
}

impl FixedWindowLimiter {
    /// Create a new limiter
    pub fn new(cache: Arc<dyn Cache>, config: RateLimitConfig) -> Self {
        Self { cache, config }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    fn counter_key(api_key: &str) -> String {
        format!("rate_limit:{}", api_key)
    }

    /// Check-then-increment for one request.
    ///
    /// Reads the key's counter; a count already at the limit rejects without
    /// incrementing. Otherwise the increment sets the window TTL only when
    /// it creates the counter, so the window never slides.
    pub async fn check(&self, api_key: &str) -> Result<RateLimitResult, DomainError> {
        let key = Self::counter_key(api_key);
        let limit = self.config.limit;
        let window_secs = self.config.window.as_secs();

        let current = match self.cache.get_counter(&key).await {
            Ok(count) => count,
            Err(e) => return self.on_store_error(e),
        };

        if current >= i64::from(limit) {
            let reset_in_seconds = match self.cache.ttl(&key).await {
                Ok(Some(ttl)) => ttl.as_secs().max(1),
                // Counter without TTL or unreadable TTL: assume a full window
                _ => window_secs,
            };

            return Ok(RateLimitResult {
                allowed: false,
                remaining: 0,
                limit,
                reset_in_seconds,
            });
        }

        let count = match self
            .cache
            .increment_with_ttl(&key, 1, self.config.window)
            .await
        {
            Ok(count) => count,
            Err(e) => return self.on_store_error(e),
        };

        Ok(RateLimitResult {
            allowed: true,
            remaining: limit.saturating_sub(count.max(0) as u32),
            limit,
            reset_in_seconds: window_secs,
        })
    }

    /// Drop a key's counter, ending its current window early
    pub async fn reset(&self, api_key: &str) -> Result<(), DomainError> {
        self.cache.delete(&Self::counter_key(api_key)).await?;
        Ok(())
    }

    fn on_store_error(&self, e: DomainError) -> Result<RateLimitResult, DomainError> {
        if self.config.fail_open {
            warn!(error = %e, "Rate counter store unreachable, failing open");
            Ok(RateLimitResult {
                allowed: true,
                remaining: self.config.limit,
                limit: self.config.limit,
                reset_in_seconds: self.config.window.as_secs(),
            })
        } else {
            error!(error = %e, "Rate counter store unreachable, failing closed");
            Err(e)
        }
    }
}
