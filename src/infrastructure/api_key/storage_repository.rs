//! PostgreSQL credential repository
//!
//! The `api_key` primary key is the store-level uniqueness constraint the
//! key manager's retry loop relies on; a duplicate-key violation maps to
//! `DomainError::Conflict`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};

use crate::domain::api_key::{ApiKeyRecord, Profile};
use crate::domain::{CredentialRepository, DomainError};

/// PostgreSQL implementation of CredentialRepository
#[derive(Debug, Clone)]
pub struct PostgresCredentialRepository {
    pool: PgPool,
}

impl PostgresCredentialRepository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Ensure the credential table exists
    pub async fn ensure_table(&self) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS api_keys (
                api_key VARCHAR(64) PRIMARY KEY,
                owner_identity VARCHAR(254) NOT NULL,
                password_hash TEXT NOT NULL,
                active BOOLEAN NOT NULL,
                created_at TIMESTAMPTZ NOT NULL,
                deactivated_at TIMESTAMPTZ,
                first_name TEXT NOT NULL DEFAULT '',
                last_name TEXT NOT NULL DEFAULT '',
                phone TEXT NOT NULL DEFAULT ''
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to create api_keys table: {}", e)))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS api_keys_owner_idx ON api_keys (owner_identity, active)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to create owner index: {}", e)))?;

        Ok(())
    }
}

const RECORD_COLUMNS: &str = "api_key, owner_identity, password_hash, active, created_at, \
                              deactivated_at, first_name, last_name, phone";

fn row_to_record(row: &sqlx::postgres::PgRow) -> Result<ApiKeyRecord, DomainError> {
    let deactivated_at: Option<DateTime<Utc>> = row.get("deactivated_at");

    Ok(ApiKeyRecord::restore(
        row.get("owner_identity"),
        row.get("api_key"),
        row.get("password_hash"),
        row.get("active"),
        row.get("created_at"),
        deactivated_at,
        Profile::new(
            row.get::<String, _>("first_name"),
            row.get::<String, _>("last_name"),
            row.get::<String, _>("phone"),
        ),
    ))
}

#[async_trait]
impl CredentialRepository for PostgresCredentialRepository {
    async fn insert(&self, record: ApiKeyRecord) -> Result<ApiKeyRecord, DomainError> {
        sqlx::query(
            r#"
            INSERT INTO api_keys (api_key, owner_identity, password_hash, active,
                                  created_at, deactivated_at, first_name, last_name, phone)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(record.api_key())
        .bind(record.owner())
        .bind(record.password_hash())
        .bind(record.is_active())
        .bind(record.created_at())
        .bind(record.deactivated_at())
        .bind(&record.profile().first_name)
        .bind(&record.profile().last_name)
        .bind(&record.profile().phone)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            let msg = e.to_string();

            if msg.contains("duplicate key") || msg.contains("unique constraint") {
                DomainError::conflict("API key token already exists")
            } else {
                DomainError::storage(format!("Failed to insert API key: {}", e))
            }
        })?;

        Ok(record)
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<ApiKeyRecord>, DomainError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM api_keys WHERE api_key = $1",
            RECORD_COLUMNS
        ))
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to look up API key: {}", e)))?;

        match row {
            Some(row) => Ok(Some(row_to_record(&row)?)),
            None => Ok(None),
        }
    }

    async fn find_active_by_owner(
        &self,
        owner: &str,
    ) -> Result<Option<ApiKeyRecord>, DomainError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM api_keys WHERE owner_identity = $1 AND active",
            RECORD_COLUMNS
        ))
        .bind(owner)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to look up owner: {}", e)))?;

        match row {
            Some(row) => Ok(Some(row_to_record(&row)?)),
            None => Ok(None),
        }
    }

    async fn find_latest_disabled_by_owner(
        &self,
        owner: &str,
    ) -> Result<Option<ApiKeyRecord>, DomainError> {
        let row = sqlx::query(&format!(
            r#"
            SELECT {} FROM api_keys
            WHERE owner_identity = $1 AND NOT active
            ORDER BY deactivated_at DESC NULLS LAST
            LIMIT 1
            "#,
            RECORD_COLUMNS
        ))
        .bind(owner)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to look up disabled keys: {}", e)))?;

        match row {
            Some(row) => Ok(Some(row_to_record(&row)?)),
            None => Ok(None),
        }
    }

    async fn update(&self, record: &ApiKeyRecord) -> Result<ApiKeyRecord, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE api_keys
            SET active = $2, deactivated_at = $3
            WHERE api_key = $1
            "#,
        )
        .bind(record.api_key())
        .bind(record.is_active())
        .bind(record.deactivated_at())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to update API key: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("API key record not found"));
        }

        Ok(record.clone())
    }

    async fn delete_by_token(&self, token: &str) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM api_keys WHERE api_key = $1")
            .bind(token)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to delete API key: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> Result<usize, DomainError> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM api_keys")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to count API keys: {}", e)))?;

        let count: i64 = row.get("count");
        Ok(count as usize)
    }
}
