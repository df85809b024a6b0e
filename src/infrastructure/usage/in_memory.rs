//! In-memory usage ledger

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::RwLock;

use crate::domain::{DomainError, UsageDay, UsageLedger, UsageQuery};

/// In-memory ledger keyed by (api_key, day). The write lock makes each
/// upsert atomic.
#[derive(Debug, Default)]
pub struct InMemoryUsageLedger {
    days: RwLock<HashMap<(String, NaiveDate), UsageDay>>,
}

impl InMemoryUsageLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UsageLedger for InMemoryUsageLedger {
    async fn record_hit(
        &self,
        api_key: &str,
        endpoint: &str,
        at: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        let mut days = self.days.write().await;

        days.entry((api_key.to_string(), at.date_naive()))
            .and_modify(|day| day.add_hit(endpoint, at))
            .or_insert_with(|| UsageDay::first_hit(api_key, endpoint, at));

        Ok(())
    }

    async fn query(
        &self,
        api_key: &str,
        query: &UsageQuery,
    ) -> Result<Vec<UsageDay>, DomainError> {
        let days = self.days.read().await;

        let mut result: Vec<UsageDay> = days
            .values()
            .filter(|day| day.api_key == api_key && query.matches(day.date))
            .cloned()
            .collect();

        result.sort_by(|a, b| b.date.cmp(&a.date));

        Ok(result)
    }
}
