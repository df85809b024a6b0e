//! Admission gate middleware
//!
//! Layered over every metered route so no handler can skip the contract:
//! validate the presented key, check the rate limiter, run the handler, and
//! account the request once a successful response is ready.

use axum::{
    extract::{OriginalUri, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use tracing::debug;

use crate::api::state::AppState;
use crate::api::types::ApiError;

/// Header carrying the literal API key value
pub const API_KEY_HEADER: &str = "x-api-key";

/// Gate a request: authenticate, rate-limit, then meter on success.
pub async fn admission_gate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let presented = extract_api_key(request.headers())?;

    debug!(
        key_prefix = %presented.chars().take(8).collect::<String>(),
        "Validating API key"
    );

    let admitted = state.admission.validate(&presented).await.map_err(ApiError::from)?;
    state.admission.admit(&admitted).await.map_err(ApiError::from)?;

    // Meter against the externally visible path, not the nested remainder
    let endpoint = request
        .extensions()
        .get::<OriginalUri>()
        .map(|uri| uri.0.path().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    request.extensions_mut().insert(admitted.clone());

    let response = next.run(request).await;

    if response.status().is_success() {
        state.usage.record(&admitted.api_key, &endpoint).await;
    }

    Ok(response)
}

fn extract_api_key(headers: &HeaderMap) -> Result<String, ApiError> {
    let value = headers
        .get(API_KEY_HEADER)
        .ok_or_else(|| ApiError::unauthorized("Missing API key"))?;

    let key = value
        .to_str()
        .map_err(|_| ApiError::bad_request("Invalid x-api-key header encoding"))?;

    Ok(key.trim().to_string())
}
