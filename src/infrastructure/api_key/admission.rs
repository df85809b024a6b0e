//! Request admission
//!
//! Validates a presented key against the credential store, then checks the
//! rate limiter. Admission only ever reads credentials; state transitions
//! belong to the key manager.

use std::sync::Arc;

use tracing::debug;

use crate::domain::api_key::is_well_formed_token;
use crate::domain::{CredentialRepository, DomainError};

use super::rate_limiter::{FixedWindowLimiter, RateLimitResult};

/// Identity attached to a request after successful validation
#[derive(Debug, Clone)]
pub struct AdmittedKey {
    pub owner: String,
    pub api_key: String,
}

/// Gate in front of every metered endpoint
#[derive(Debug)]
pub struct AdmissionController<R>
where
    R: CredentialRepository,
{
    repository: Arc<R>,
    limiter: Arc<FixedWindowLimiter>,
}

impl<R: CredentialRepository> AdmissionController<R> {
    pub fn new(repository: Arc<R>, limiter: Arc<FixedWindowLimiter>) -> Self {
        Self { repository, limiter }
    }

    /// Resolve a presented key to its owner. Pure read, no side effects.
    ///
    /// Malformed, unknown, and inactive keys are indistinguishable to the
    /// caller: all fail `Unauthenticated`.
    pub async fn validate(&self, presented: &str) -> Result<AdmittedKey, DomainError> {
        if !is_well_formed_token(presented) {
            debug!("Presented key is malformed");
            return Err(DomainError::unauthenticated("Invalid or inactive API key"));
        }

        let record = self.repository.find_by_token(presented).await?;

        match record {
            Some(record) if record.is_active() => Ok(AdmittedKey {
                owner: record.owner().to_string(),
                api_key: record.api_key().to_string(),
            }),
            _ => {
                debug!("Presented key is unknown or inactive");
                Err(DomainError::unauthenticated("Invalid or inactive API key"))
            }
        }
    }

    /// Check the identity against the fixed-window limiter
    pub async fn admit(&self, key: &AdmittedKey) -> Result<RateLimitResult, DomainError> {
        let result = self.limiter.check(&key.api_key).await?;

        if !result.allowed {
            return Err(DomainError::rate_limited(result.reset_in_seconds));
        }

        Ok(result)
    }
}
