//! API key lifecycle management
//!
//! Issues, rotates, disables, enables, deletes, and retrieves keys. Every
//! operation on an existing key verifies the owner's password first.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::domain::api_key::{validate_owner_identity, ApiKeyRecord, Profile};
use crate::domain::{CredentialRepository, DomainError};

use super::generator::ApiKeyGenerator;
use super::password::PasswordHasher;

/// Maximum insert attempts when the store reports a token collision
const INSERT_ATTEMPTS: u32 = 2;

/// Maximum token draws against the pre-insert existence check
const TOKEN_DRAWS: u32 = 4;

/// Result of issuing a key
#[derive(Debug)]
pub struct IssueOutcome {
    /// The owner's active record
    pub record: ApiKeyRecord,
    /// False when the owner already held an active key and issuance
    /// returned it idempotently
    pub created: bool,
}

/// Result of rotating a key
#[derive(Debug)]
pub struct RotationOutcome {
    /// The token that was just deactivated
    pub old_key: String,
    /// The replacement record
    pub record: ApiKeyRecord,
}

/// Key lifecycle service
#[derive(Debug)]
pub struct KeyManager<R>
where
    R: CredentialRepository,
{
    repository: Arc<R>,
    generator: ApiKeyGenerator,
    hasher: Arc<dyn PasswordHasher>,
}

impl<R: CredentialRepository> KeyManager<R> {
    /// Create a new key manager
    pub fn new(repository: Arc<R>, hasher: Arc<dyn PasswordHasher>) -> Self {
        Self {
            repository,
            generator: ApiKeyGenerator::new(),
            hasher,
        }
    }

    /// Create with a custom generator
    pub fn with_generator(mut self, generator: ApiKeyGenerator) -> Self {
        self.generator = generator;
        self
    }

    /// Issue a key for `owner`.
    ///
    /// Idempotent while an active key exists: the existing record is
    /// returned instead of an error and the stored password hash is left
    /// untouched.
    pub async fn issue(
        &self,
        owner: &str,
        password: &str,
        profile: Profile,
    ) -> Result<IssueOutcome, DomainError> {
        validate_owner_identity(owner).map_err(|e| DomainError::validation(e.to_string()))?;

        if let Some(existing) = self.repository.find_active_by_owner(owner).await? {
            debug!(owner, "Owner already holds an active key, returning it");
            return Ok(IssueOutcome {
                record: existing,
                created: false,
            });
        }

        let password_hash = self.hasher.hash(password)?;
        let record = self
            .insert_with_retry(|token| {
                ApiKeyRecord::new(owner, token, password_hash.clone(), profile.clone())
            })
            .await?;

        info!(owner, "Issued new API key");

        Ok(IssueOutcome {
            record,
            created: true,
        })
    }

    /// Rotate the owner's active key: deactivate it, then insert a fresh
    /// one carrying the same password hash and profile.
    pub async fn rotate(
        &self,
        owner: &str,
        password: &str,
    ) -> Result<RotationOutcome, DomainError> {
        let mut current = self.verified_active_record(owner, password).await?;

        current.deactivate();
        self.repository.update(&current).await?;

        let record = self
            .insert_with_retry(|token| current.successor(token))
            .await?;

        info!(owner, "Rotated API key");

        Ok(RotationOutcome {
            old_key: current.api_key().to_string(),
            record,
        })
    }

    /// Take the owner's active key out of service
    pub async fn disable(&self, owner: &str, password: &str) -> Result<ApiKeyRecord, DomainError> {
        let mut record = self.verified_active_record(owner, password).await?;

        record.deactivate();
        let updated = self.repository.update(&record).await?;

        info!(owner, "Disabled API key");
        Ok(updated)
    }

    /// Put the owner's most recently disabled key back into service.
    ///
    /// Refuses if the owner already holds an active key, so an owner never
    /// ends up with two admitting keys.
    pub async fn enable(&self, owner: &str, password: &str) -> Result<ApiKeyRecord, DomainError> {
        let mut record = self
            .repository
            .find_latest_disabled_by_owner(owner)
            .await?
            .ok_or_else(|| {
                DomainError::not_found(format!("Owner '{}' has no disabled API key", owner))
            })?;

        self.verify_password(password, record.password_hash())?;

        if self.repository.find_active_by_owner(owner).await?.is_some() {
            return Err(DomainError::validation(format!(
                "Owner '{}' already has an active API key",
                owner
            )));
        }

        record.reactivate();
        let updated = self.repository.update(&record).await?;

        info!(owner, "Enabled API key");
        Ok(updated)
    }

    /// Delete the owner's active key record
    pub async fn delete(&self, owner: &str, password: &str) -> Result<ApiKeyRecord, DomainError> {
        let record = self.verified_active_record(owner, password).await?;

        self.repository.delete_by_token(record.api_key()).await?;

        info!(owner, "Deleted API key");
        Ok(record)
    }

    /// Out-of-band key recovery: return the active record without mutating
    pub async fn retrieve(&self, owner: &str, password: &str) -> Result<ApiKeyRecord, DomainError> {
        self.verified_active_record(owner, password).await
    }

    /// Total stored records; doubles as a store connectivity probe
    pub async fn count(&self) -> Result<usize, DomainError> {
        self.repository.count().await
    }

    /// Insert a record built from a freshly drawn token, retrying the whole
    /// insert once if the store reports a uniqueness violation. A second
    /// conflict is surfaced to the caller.
    async fn insert_with_retry<F>(&self, build: F) -> Result<ApiKeyRecord, DomainError>
    where
        F: Fn(String) -> ApiKeyRecord,
    {
        let mut attempt = 0;

        loop {
            attempt += 1;
            let token = self.draw_token().await?;

            match self.repository.insert(build(token)).await {
                Ok(created) => return Ok(created),
                Err(DomainError::Conflict { .. }) if attempt < INSERT_ATTEMPTS => {
                    warn!(attempt, "Token collision on insert, redrawing");
                }
                Err(DomainError::Conflict { message }) => {
                    return Err(DomainError::conflict(format!(
                        "Token collision survived retry: {}",
                        message
                    )));
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Draw a token that no existing record holds. The existence check is
    /// advisory; the insert's uniqueness constraint is the real arbiter.
    async fn draw_token(&self) -> Result<String, DomainError> {
        for _ in 0..TOKEN_DRAWS {
            let token = self.generator.generate();

            if !self.repository.token_exists(&token).await? {
                return Ok(token);
            }
        }

        Err(DomainError::conflict("Could not draw an unused token"))
    }

    async fn verified_active_record(
        &self,
        owner: &str,
        password: &str,
    ) -> Result<ApiKeyRecord, DomainError> {
        let record = self
            .repository
            .find_active_by_owner(owner)
            .await?
            .ok_or_else(|| {
                DomainError::not_found(format!("Owner '{}' has no active API key", owner))
            })?;

        self.verify_password(password, record.password_hash())?;
        Ok(record)
    }

    fn verify_password(&self, password: &str, hash: &str) -> Result<(), DomainError> {
        if self.hasher.verify(password, hash) {
            Ok(())
        } else {
            Err(DomainError::unauthorized("Invalid owner identity or password"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::api_key::InMemoryCredentialRepository;

    /// Transparent hasher so tests stay fast; Argon2 has its own tests.
    #[derive(Debug)]
    struct PlainHasher;

    impl PasswordHasher for PlainHasher {
        fn hash(&self, password: &str) -> Result<String, DomainError> {
            Ok(format!("plain:{}", password))
        }

        fn verify(&self, password: &str, hash: &str) -> bool {
            hash == format!("plain:{}", password)
        }
    }

    fn manager() -> KeyManager<InMemoryCredentialRepository> {
        KeyManager::new(
            Arc::new(InMemoryCredentialRepository::new()),
            Arc::new(PlainHasher),
        )
    }

    fn profile() -> Profile {
        Profile::new("Alice", "Smith", "4445556666")
    }

    #[tokio::test]
    async fn test_issue_creates_active_key() {
        let manager = manager();

        let outcome = manager
            .issue("alice@example.com", "pw123", profile())
            .await
            .unwrap();

        assert!(outcome.created);
        assert!(outcome.record.is_active());
        assert_eq!(outcome.record.api_key().len(), 64);
        assert_eq!(outcome.record.owner(), "alice@example.com");
    }

    #[tokio::test]
    async fn test_issue_is_idempotent_per_owner() {
        let manager = manager();

        let first = manager
            .issue("alice@example.com", "pw123", profile())
            .await
            .unwrap();
        let second = manager
            .issue("alice@example.com", "pw123", profile())
            .await
            .unwrap();

        assert!(first.created);
        assert!(!second.created);
        assert_eq!(first.record.api_key(), second.record.api_key());
    }

    #[tokio::test]
    async fn test_issue_rejects_malformed_owner() {
        let manager = manager();

        let result = manager.issue("alice smith", "pw123", profile()).await;
        assert!(matches!(result, Err(DomainError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_rotate_replaces_token_and_keeps_credentials() {
        let manager = manager();

        let issued = manager
            .issue("alice@example.com", "pw123", profile())
            .await
            .unwrap();

        let rotated = manager.rotate("alice@example.com", "pw123").await.unwrap();

        assert_eq!(rotated.old_key, issued.record.api_key());
        assert_ne!(rotated.record.api_key(), issued.record.api_key());
        assert!(rotated.record.is_active());

        // The old password still verifies against the new record
        let retrieved = manager
            .retrieve("alice@example.com", "pw123")
            .await
            .unwrap();
        assert_eq!(retrieved.api_key(), rotated.record.api_key());
    }

    #[tokio::test]
    async fn test_rotate_without_active_key_is_not_found() {
        let manager = manager();

        let result = manager.rotate("nobody@example.com", "pw123").await;
        assert!(matches!(result, Err(DomainError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_rotate_with_wrong_password_leaves_key_active() {
        let manager = manager();

        let issued = manager
            .issue("alice@example.com", "pw123", profile())
            .await
            .unwrap();

        let result = manager.rotate("alice@example.com", "wrong").await;
        assert!(matches!(result, Err(DomainError::Unauthorized { .. })));

        // Old key untouched
        let current = manager
            .retrieve("alice@example.com", "pw123")
            .await
            .unwrap();
        assert_eq!(current.api_key(), issued.record.api_key());
        assert!(current.is_active());
    }

    #[tokio::test]
    async fn test_disable_then_enable_roundtrip() {
        let manager = manager();

        let issued = manager
            .issue("alice@example.com", "pw123", profile())
            .await
            .unwrap();

        let disabled = manager.disable("alice@example.com", "pw123").await.unwrap();
        assert!(!disabled.is_active());
        assert!(disabled.deactivated_at().is_some());

        let enabled = manager.enable("alice@example.com", "pw123").await.unwrap();
        assert!(enabled.is_active());
        assert_eq!(enabled.api_key(), issued.record.api_key());
    }

    #[tokio::test]
    async fn test_enable_verifies_against_latest_disabled_record() {
        let manager = manager();

        manager
            .issue("alice@example.com", "pw123", profile())
            .await
            .unwrap();
        // Rotation leaves one disabled record behind; disable the new key too
        let rotated = manager.rotate("alice@example.com", "pw123").await.unwrap();
        manager.disable("alice@example.com", "pw123").await.unwrap();

        let enabled = manager.enable("alice@example.com", "pw123").await.unwrap();

        // The most recently disabled key (the rotated one) comes back
        assert_eq!(enabled.api_key(), rotated.record.api_key());
    }

    #[tokio::test]
    async fn test_enable_refuses_second_active_key() {
        let manager = manager();

        manager
            .issue("alice@example.com", "pw123", profile())
            .await
            .unwrap();
        // Rotating leaves the old record disabled while the new one is active
        manager.rotate("alice@example.com", "pw123").await.unwrap();

        let result = manager.enable("alice@example.com", "pw123").await;
        assert!(matches!(result, Err(DomainError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_enable_without_disabled_key_is_not_found() {
        let manager = manager();

        let result = manager.enable("alice@example.com", "pw123").await;
        assert!(matches!(result, Err(DomainError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_delete_removes_record() {
        let manager = manager();

        manager
            .issue("alice@example.com", "pw123", profile())
            .await
            .unwrap();

        manager.delete("alice@example.com", "pw123").await.unwrap();

        let result = manager.retrieve("alice@example.com", "pw123").await;
        assert!(matches!(result, Err(DomainError::NotFound { .. })));

        // A fresh issuance creates a brand new key
        let reissued = manager
            .issue("alice@example.com", "pw456", profile())
            .await
            .unwrap();
        assert!(reissued.created);
    }

    #[tokio::test]
    async fn test_delete_with_wrong_password_is_unauthorized() {
        let manager = manager();

        manager
            .issue("alice@example.com", "pw123", profile())
            .await
            .unwrap();

        let result = manager.delete("alice@example.com", "wrong").await;
        assert!(matches!(result, Err(DomainError::Unauthorized { .. })));
    }

    #[tokio::test]
    async fn test_retrieve_requires_password() {
        let manager = manager();

        manager
            .issue("alice@example.com", "pw123", profile())
            .await
            .unwrap();

        assert!(manager.retrieve("alice@example.com", "pw123").await.is_ok());
        assert!(matches!(
            manager.retrieve("alice@example.com", "wrong").await,
            Err(DomainError::Unauthorized { .. })
        ));
    }

    #[tokio::test]
    async fn test_concurrent_issuance_yields_distinct_tokens() {
        let manager = Arc::new(manager());

        let issuances = (0..64).map(|i| {
            let manager = manager.clone();
            async move {
                manager
                    .issue(&format!("user{}@example.com", i), "pw", Profile::default())
                    .await
                    .unwrap()
                    .record
                    .api_key()
                    .to_string()
            }
        });

        let tokens: std::collections::HashSet<String> =
            futures::future::join_all(issuances).await.into_iter().collect();

        assert_eq!(tokens.len(), 64);
    }
}
