//! Credential repository trait

use async_trait::async_trait;
use std::fmt::Debug;

use super::ApiKeyRecord;
use crate::domain::DomainError;

/// Repository trait for the credential store.
///
/// Token uniqueness is the store's responsibility: `insert` must fail with
/// `DomainError::Conflict` when the token already exists, atomically with
/// the insert itself. Everything else is plain reads and writes.
#[async_trait]
pub trait CredentialRepository: Send + Sync + Debug {
    /// Insert a new record; fails with `Conflict` on a duplicate token
    async fn insert(&self, record: ApiKeyRecord) -> Result<ApiKeyRecord, DomainError>;

    /// Look up a record by its token, active or not
    async fn find_by_token(&self, token: &str) -> Result<Option<ApiKeyRecord>, DomainError>;

    /// The owner's currently active record, if any
    async fn find_active_by_owner(&self, owner: &str)
        -> Result<Option<ApiKeyRecord>, DomainError>;

    /// The owner's most recently deactivated record, if any
    async fn find_latest_disabled_by_owner(
        &self,
        owner: &str,
    ) -> Result<Option<ApiKeyRecord>, DomainError>;

    /// Persist changes to an existing record, matched by token
    async fn update(&self, record: &ApiKeyRecord) -> Result<ApiKeyRecord, DomainError>;

    /// Remove a record by token; returns whether anything was deleted
    async fn delete_by_token(&self, token: &str) -> Result<bool, DomainError>;

    /// Whether any record (active or not) holds this token
    async fn token_exists(&self, token: &str) -> Result<bool, DomainError> {
        Ok(self.find_by_token(token).await?.is_some())
    }

    /// Total number of records, used by readiness probes
    async fn count(&self) -> Result<usize, DomainError>;
}
