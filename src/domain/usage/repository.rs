//! Usage ledger trait

use async_trait::async_trait;
use std::fmt::Debug;

use chrono::{DateTime, Utc};

use super::{UsageDay, UsageQuery};
use crate::domain::DomainError;

/// Repository trait for the usage ledger.
///
/// `record_hit` must be a single atomic upsert: create the day's record with
/// `first_access` set when it does not exist, otherwise increment `count` and
/// the endpoint counter and overwrite `last_access`. Two concurrent hits for
/// the same key and day must both be counted.
#[async_trait]
pub trait UsageLedger: Send + Sync + Debug {
    /// Account one admitted request against `(api_key, day of `at`)`
    async fn record_hit(
        &self,
        api_key: &str,
        endpoint: &str,
        at: DateTime<Utc>,
    ) -> Result<(), DomainError>;

    /// The key's usage days inside the optional range, newest first.
    /// An empty result is a valid, non-error outcome.
    async fn query(&self, api_key: &str, query: &UsageQuery)
        -> Result<Vec<UsageDay>, DomainError>;
}
