//! Admission-gated endpoints: usage stats and a gated probe

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::api::state::AppState;
use crate::api::types::ApiError;
use crate::domain::{UsageDay, UsageQuery};
use crate::infrastructure::api_key::AdmittedKey;

/// Optional date-range filters, ISO calendar days
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UsageStatsParams {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// Daily usage stats for the calling key
#[derive(Debug, Clone, Serialize)]
pub struct UsageStatsResponse {
    pub user: String,
    pub total_calls: u64,
    pub days_tracked: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub usage: Vec<UsageDay>,
}

fn parse_date(field: &str, value: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| ApiError::bad_request(format!("{} must be formatted YYYY-MM-DD", field)))
}

/// GET /api/usage-stats
///
/// Returns the caller's own usage only; the identity comes from the
/// admission gate, never from request parameters.
pub async fn usage_stats(
    State(state): State<AppState>,
    Extension(identity): Extension<AdmittedKey>,
    Query(params): Query<UsageStatsParams>,
) -> Result<Json<UsageStatsResponse>, ApiError> {
    let mut query = UsageQuery::new();

    if let Some(ref start) = params.start_date {
        query = query.with_start(parse_date("start_date", start)?);
    }

    if let Some(ref end) = params.end_date {
        query = query.with_end(parse_date("end_date", end)?);
    }

    let usage = state
        .usage
        .query(&identity.api_key, &query)
        .await
        .map_err(ApiError::from)?;

    let total_calls = usage.iter().map(|day| day.count).sum();
    let message = usage
        .is_empty()
        .then(|| "No usage data found for this period".to_string());

    Ok(Json(UsageStatsResponse {
        user: identity.owner,
        total_calls,
        days_tracked: usage.len(),
        message,
        usage,
    }))
}

/// Greeting behind the gate
#[derive(Debug, Clone, Serialize)]
pub struct SecureDataResponse {
    pub message: String,
}

/// GET /api/secure-data
///
/// Minimal gated endpoint; useful for verifying a key end to end.
pub async fn secure_data(
    Extension(identity): Extension<AdmittedKey>,
) -> Json<SecureDataResponse> {
    Json(SecureDataResponse {
        message: format!(
            "Hello {}, your API key is valid and within rate limits!",
            identity.owner
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_valid() {
        let date = parse_date("start_date", "2024-05-17").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 5, 17).unwrap());
    }

    #[test]
    fn test_parse_date_invalid() {
        assert!(parse_date("start_date", "17/05/2024").is_err());
        assert!(parse_date("end_date", "2024-13-01").is_err());
        assert!(parse_date("end_date", "yesterday").is_err());
    }
}
