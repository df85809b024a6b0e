//! Application state for shared services

use std::sync::Arc;

use crate::domain::api_key::{ApiKeyRecord, Profile};
use crate::domain::{CredentialRepository, DomainError, UsageDay, UsageLedger, UsageQuery};
use crate::infrastructure::api_key::{
    AdmissionController, AdmittedKey, IssueOutcome, KeyManager, RateLimitResult, RotationOutcome,
};
use crate::infrastructure::usage::UsageRecorder;

/// Application state containing shared services using dynamic dispatch
#[derive(Clone)]
pub struct AppState {
    pub key_service: Arc<dyn KeyLifecycleService>,
    pub admission: Arc<dyn AdmissionService>,
    pub usage: Arc<dyn UsageService>,
}

impl AppState {
    pub fn new(
        key_service: Arc<dyn KeyLifecycleService>,
        admission: Arc<dyn AdmissionService>,
        usage: Arc<dyn UsageService>,
    ) -> Self {
        Self {
            key_service,
            admission,
            usage,
        }
    }
}

/// Trait for key lifecycle operations
#[async_trait::async_trait]
pub trait KeyLifecycleService: Send + Sync {
    async fn issue(
        &self,
        owner: &str,
        password: &str,
        profile: Profile,
    ) -> Result<IssueOutcome, DomainError>;
    async fn rotate(&self, owner: &str, password: &str) -> Result<RotationOutcome, DomainError>;
    async fn disable(&self, owner: &str, password: &str) -> Result<ApiKeyRecord, DomainError>;
    async fn enable(&self, owner: &str, password: &str) -> Result<ApiKeyRecord, DomainError>;
    async fn delete(&self, owner: &str, password: &str) -> Result<ApiKeyRecord, DomainError>;
    async fn retrieve(&self, owner: &str, password: &str) -> Result<ApiKeyRecord, DomainError>;
    async fn count(&self) -> Result<usize, DomainError>;
}

/// Trait for request admission
#[async_trait::async_trait]
pub trait AdmissionService: Send + Sync {
    async fn validate(&self, presented: &str) -> Result<AdmittedKey, DomainError>;
    async fn admit(&self, key: &AdmittedKey) -> Result<RateLimitResult, DomainError>;
}

/// Trait for usage accounting
#[async_trait::async_trait]
pub trait UsageService: Send + Sync {
    async fn record(&self, api_key: &str, endpoint: &str);
    async fn query(
        &self,
        api_key: &str,
        query: &UsageQuery,
    ) -> Result<Vec<UsageDay>, DomainError>;
}

// Implement the state traits for the concrete services

#[async_trait::async_trait]
impl<R: CredentialRepository + 'static> KeyLifecycleService for KeyManager<R> {
    async fn issue(
        &self,
        owner: &str,
        password: &str,
        profile: Profile,
    ) -> Result<IssueOutcome, DomainError> {
        KeyManager::issue(self, owner, password, profile).await
    }

    async fn rotate(&self, owner: &str, password: &str) -> Result<RotationOutcome, DomainError> {
        KeyManager::rotate(self, owner, password).await
    }

    async fn disable(&self, owner: &str, password: &str) -> Result<ApiKeyRecord, DomainError> {
        KeyManager::disable(self, owner, password).await
    }

    async fn enable(&self, owner: &str, password: &str) -> Result<ApiKeyRecord, DomainError> {
        KeyManager::enable(self, owner, password).await
    }

    async fn delete(&self, owner: &str, password: &str) -> Result<ApiKeyRecord, DomainError> {
        KeyManager::delete(self, owner, password).await
    }

    async fn retrieve(&self, owner: &str, password: &str) -> Result<ApiKeyRecord, DomainError> {
        KeyManager::retrieve(self, owner, password).await
    }

    async fn count(&self) -> Result<usize, DomainError> {
        KeyManager::count(self).await
    }
}

#[async_trait::async_trait]
impl<R: CredentialRepository + 'static> AdmissionService for AdmissionController<R> {
    async fn validate(&self, presented: &str) -> Result<AdmittedKey, DomainError> {
        AdmissionController::validate(self, presented).await
    }

    async fn admit(&self, key: &AdmittedKey) -> Result<RateLimitResult, DomainError> {
        AdmissionController::admit(self, key).await
    }
}

#[async_trait::async_trait]
impl<L: UsageLedger + 'static> UsageService for UsageRecorder<L> {
    async fn record(&self, api_key: &str, endpoint: &str) {
        UsageRecorder::record(self, api_key, endpoint).await
    }

    async fn query(
        &self,
        api_key: &str,
        query: &UsageQuery,
    ) -> Result<Vec<UsageDay>, DomainError> {
        UsageRecorder::query(self, api_key, query).await
    }
}
