use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::health;
use super::keys;
use super::middleware::admission_gate;
use super::state::AppState;
use super::usage;

/// Create the full router with application state
pub fn create_router_with_state(state: AppState) -> Router {
    // Every route under /api passes the admission gate; handlers cannot
    // opt out of metering or rate limiting.
    let gated = Router::new()
        .route("/usage-stats", get(usage::usage_stats))
        .route("/secure-data", get(usage::secure_data))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            admission_gate,
        ));

    Router::new()
        // Health endpoints
        .route("/health", get(health::health_check))
        .route("/ready", get(health::ready_check))
        .route("/live", get(health::live_check))
        // Key lifecycle (password-gated, not admission-gated)
        .nest("/apikey", lifecycle_router())
        // Metered surface
        .nest("/api", gated)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer())
}

fn lifecycle_router() -> Router<AppState> {
    Router::new()
        .route("/create-key", post(keys::create_key))
        .route("/rotate-key", post(keys::rotate_key))
        .route("/disable-key", post(keys::disable_key))
        .route("/enable-key", post(keys::enable_key))
        .route("/delete-key", post(keys::delete_key))
        .route("/get-api-key", post(keys::get_api_key))
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
}
