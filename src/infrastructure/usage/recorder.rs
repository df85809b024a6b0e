//! Usage recorder service
//!
//! Best-effort telemetry: a failed write is logged and dropped so metering
//! can never affect the user-facing response.

use std::sync::Arc;

use chrono::Utc;
use tracing::warn;

use crate::domain::{DomainError, UsageDay, UsageLedger, UsageQuery};

/// Records and serves per-key usage
#[derive(Debug)]
pub struct UsageRecorder<L>
where
    L: UsageLedger,
{
    ledger: Arc<L>,
}

impl<L: UsageLedger> UsageRecorder<L> {
    pub fn new(ledger: Arc<L>) -> Self {
        Self { ledger }
    }

    /// Account one admitted request. Never fails; ledger errors are
    /// swallowed after logging.
    pub async fn record(&self, api_key: &str, endpoint: &str) {
        let now = Utc::now();

        if let Err(e) = self.ledger.record_hit(api_key, endpoint, now).await {
            warn!(error = %e, endpoint, "Failed to record usage, dropping the sample");
        }
    }

    /// The caller's own usage days, newest first
    pub async fn query(
        &self,
        api_key: &str,
        query: &UsageQuery,
    ) -> Result<Vec<UsageDay>, DomainError> {
        self.ledger.query(api_key, query).await
    }
}
