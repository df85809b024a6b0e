//! In-memory credential repository
//!
//! Used in development and tests. The token map doubles as the uniqueness
//! constraint: inserting an existing token fails with `Conflict` under the
//! same write lock that performs the insert.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::api_key::ApiKeyRecord;
use crate::domain::{CredentialRepository, DomainError};

/// In-memory credential store keyed by token
#[derive(Debug, Default)]
pub struct InMemoryCredentialRepository {
    records: RwLock<HashMap<String, ApiKeyRecord>>,
}

impl InMemoryCredentialRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialRepository for InMemoryCredentialRepository {
    async fn insert(&self, record: ApiKeyRecord) -> Result<ApiKeyRecord, DomainError> {
        let mut records = self.records.write().await;

        if records.contains_key(record.api_key()) {
            return Err(DomainError::conflict(format!(
                "API key token already exists: {}...",
                &record.api_key()[..8.min(record.api_key().len())]
            )));
        }

        records.insert(record.api_key().to_string(), record.clone());
        Ok(record)
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<ApiKeyRecord>, DomainError> {
        let records = self.records.read().await;
        Ok(records.get(token).cloned())
    }

    async fn find_active_by_owner(
        &self,
        owner: &str,
    ) -> Result<Option<ApiKeyRecord>, DomainError> {
        let records = self.records.read().await;
        Ok(records
            .values()
            .find(|r| r.owner() == owner && r.is_active())
            .cloned())
    }

    async fn find_latest_disabled_by_owner(
        &self,
        owner: &str,
    ) -> Result<Option<ApiKeyRecord>, DomainError> {
        let records = self.records.read().await;
        Ok(records
            .values()
            .filter(|r| r.owner() == owner && !r.is_active())
            .max_by_key(|r| r.deactivated_at())
            .cloned())
    }

    async fn update(&self, record: &ApiKeyRecord) -> Result<ApiKeyRecord, DomainError> {
        let mut records = self.records.write().await;

        if !records.contains_key(record.api_key()) {
            return Err(DomainError::not_found("API key record not found"));
        }

        records.insert(record.api_key().to_string(), record.clone());
        Ok(record.clone())
    }

    async fn delete_by_token(&self, token: &str) -> Result<bool, DomainError> {
        let mut records = self.records.write().await;
        Ok(records.remove(token).is_some())
    }

    async fn count(&self) -> Result<usize, DomainError> {
        let records = self.records.read().await;
        Ok(records.len())
    }
}
