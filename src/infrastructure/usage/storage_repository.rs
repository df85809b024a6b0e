//! PostgreSQL usage ledger
//!
//! The upsert is a single INSERT .. ON CONFLICT statement so concurrent hits
//! for the same key and day are both counted without application locking.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};

use crate::domain::{DomainError, UsageDay, UsageLedger, UsageQuery};

/// PostgreSQL implementation of UsageLedger
#[derive(Debug, Clone)]
pub struct PostgresUsageLedger {
    pool: PgPool,
}

impl PostgresUsageLedger {
    /// Create a new ledger with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Ensure the ledger table exists
    pub async fn ensure_table(&self) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS usage_days (
                api_key VARCHAR(64) NOT NULL,
                date DATE NOT NULL,
                count BIGINT NOT NULL,
                endpoints JSONB NOT NULL,
                first_access TIMESTAMPTZ NOT NULL,
                last_access TIMESTAMPTZ NOT NULL,
                PRIMARY KEY (api_key, date)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to create usage_days table: {}", e)))?;

        Ok(())
    }
}

fn row_to_day(row: &sqlx::postgres::PgRow) -> Result<UsageDay, DomainError> {
    let endpoints_json: serde_json::Value = row.get("endpoints");
    let endpoints: HashMap<String, u64> = serde_json::from_value(endpoints_json)
        .map_err(|e| DomainError::storage(format!("Malformed endpoints column: {}", e)))?;

    let count: i64 = row.get("count");

    Ok(UsageDay {
        api_key: row.get("api_key"),
        date: row.get("date"),
        count: count as u64,
        endpoints,
        first_access: row.get("first_access"),
        last_access: row.get("last_access"),
    })
}

#[async_trait]
impl UsageLedger for PostgresUsageLedger {
    async fn record_hit(
        &self,
        api_key: &str,
        endpoint: &str,
        at: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO usage_days (api_key, date, count, endpoints, first_access, last_access)
            VALUES ($1, $2, 1, jsonb_build_object($3::text, 1), $4, $4)
            ON CONFLICT (api_key, date) DO UPDATE
            SET count = usage_days.count + 1,
                endpoints = jsonb_set(
                    usage_days.endpoints,
                    ARRAY[$3::text],
                    to_jsonb(COALESCE((usage_days.endpoints ->> $3::text)::bigint, 0) + 1)
                ),
                last_access = $4
            "#,
        )
        .bind(api_key)
        .bind(at.date_naive())
        .bind(endpoint)
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to record usage: {}", e)))?;

        Ok(())
    }

    async fn query(
        &self,
        api_key: &str,
        query: &UsageQuery,
    ) -> Result<Vec<UsageDay>, DomainError> {
        let rows = sqlx::query(
            r#"
            SELECT api_key, date, count, endpoints, first_access, last_access
            FROM usage_days
            WHERE api_key = $1
              AND ($2::date IS NULL OR date >= $2)
              AND ($3::date IS NULL OR date <= $3)
            ORDER BY date DESC
            "#,
        )
        .bind(api_key)
        .bind(query.start_date)
        .bind(query.end_date)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to query usage: {}", e)))?;

        let mut days = Vec::with_capacity(rows.len());

        for row in rows {
            days.push(row_to_day(&row)?);
        }

        Ok(days)
    }
}
