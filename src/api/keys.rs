//! Key lifecycle endpoints
//!
//! Every operation on an existing key is password-gated; none of these
//! routes sit behind the admission gate, since the key itself may be lost
//! or disabled when they are called.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::debug;
use validator::Validate;

use crate::api::state::AppState;
use crate::api::types::ApiError;
use crate::domain::api_key::Profile;

/// Request to issue a new key
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateKeyRequest {
    #[validate(email(message = "owner identity must be an email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "password must not be empty"))]
    pub password: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub phone: String,
}

/// Owner credentials for operations on an existing key
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CredentialsRequest {
    #[validate(email(message = "owner identity must be an email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "password must not be empty"))]
    pub password: String,
}

/// Response carrying key material
#[derive(Debug, Clone, Serialize)]
pub struct KeyResponse {
    pub message: String,
    pub email: String,
    pub api_key: String,
}

/// Response for a rotation
#[derive(Debug, Clone, Serialize)]
pub struct RotateKeyResponse {
    pub message: String,
    pub email: String,
    pub old_key: String,
    pub new_key: String,
}

/// POST /apikey/create-key
pub async fn create_key(
    State(state): State<AppState>,
    Json(request): Json<CreateKeyRequest>,
) -> Result<Json<KeyResponse>, ApiError> {
    request
        .validate()
        .map_err(|e| ApiError::bad_request(e.to_string()))?;

    debug!(email = %request.email, "Issuing API key");

    let profile = Profile::new(request.first_name, request.last_name, request.phone);
    let outcome = state
        .key_service
        .issue(&request.email, &request.password, profile)
        .await
        .map_err(ApiError::from)?;

    let message = if outcome.created {
        "New API key created"
    } else {
        "User already has an active API key"
    };

    Ok(Json(KeyResponse {
        message: message.to_string(),
        email: request.email,
        api_key: outcome.record.api_key().to_string(),
    }))
}

/// POST /apikey/rotate-key
pub async fn rotate_key(
    State(state): State<AppState>,
    Json(request): Json<CredentialsRequest>,
) -> Result<Json<RotateKeyResponse>, ApiError> {
    request
        .validate()
        .map_err(|e| ApiError::bad_request(e.to_string()))?;

    debug!(email = %request.email, "Rotating API key");

    let outcome = state
        .key_service
        .rotate(&request.email, &request.password)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(RotateKeyResponse {
        message: "API key rotated successfully".to_string(),
        email: request.email,
        old_key: outcome.old_key,
        new_key: outcome.record.api_key().to_string(),
    }))
}

/// POST /apikey/disable-key
pub async fn disable_key(
    State(state): State<AppState>,
    Json(request): Json<CredentialsRequest>,
) -> Result<Json<KeyResponse>, ApiError> {
    request
        .validate()
        .map_err(|e| ApiError::bad_request(e.to_string()))?;

    debug!(email = %request.email, "Disabling API key");

    let record = state
        .key_service
        .disable(&request.email, &request.password)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(KeyResponse {
        message: "API key disabled successfully".to_string(),
        email: request.email,
        api_key: record.api_key().to_string(),
    }))
}

/// POST /apikey/enable-key
pub async fn enable_key(
    State(state): State<AppState>,
    Json(request): Json<CredentialsRequest>,
) -> Result<Json<KeyResponse>, ApiError> {
    request
        .validate()
        .map_err(|e| ApiError::bad_request(e.to_string()))?;

    debug!(email = %request.email, "Enabling API key");

    let record = state
        .key_service
        .enable(&request.email, &request.password)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(KeyResponse {
        message: "API key enabled successfully".to_string(),
        email: request.email,
        api_key: record.api_key().to_string(),
    }))
}

/// POST /apikey/delete-key
pub async fn delete_key(
    State(state): State<AppState>,
    Json(request): Json<CredentialsRequest>,
) -> Result<Json<KeyResponse>, ApiError> {
    request
        .validate()
        .map_err(|e| ApiError::bad_request(e.to_string()))?;

    debug!(email = %request.email, "Deleting API key");

    let record = state
        .key_service
        .delete(&request.email, &request.password)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(KeyResponse {
        message: "API key deleted successfully".to_string(),
        email: request.email,
        api_key: record.api_key().to_string(),
    }))
}

/// POST /apikey/get-api-key
///
/// Out-of-band key recovery for owners who lost the token.
pub async fn get_api_key(
    State(state): State<AppState>,
    Json(request): Json<CredentialsRequest>,
) -> Result<Json<KeyResponse>, ApiError> {
    request
        .validate()
        .map_err(|e| ApiError::bad_request(e.to_string()))?;

    debug!(email = %request.email, "Retrieving API key");

    let record = state
        .key_service
        .retrieve(&request.email, &request.password)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(KeyResponse {
        message: "API key retrieved successfully".to_string(),
        email: request.email,
        api_key: record.api_key().to_string(),
    }))
}
