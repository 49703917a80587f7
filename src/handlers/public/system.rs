use axum::{extract::{OriginalUri, State}, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::ApiResponse;

/// GET / - service information
pub async fn root(State(state): State<AppState>) -> ApiResponse {
    ApiResponse::success(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "environment": state.config.environment,
        "endpoints": ["/api/v1/weather", "/api/v1/users"],
    }))
}

/// GET /health - store reachability
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let backend = if state.stores.is_persistent() { "postgres" } else { "memory" };
    match state.stores.health_check().await {
        Ok(()) => (StatusCode::OK, Json(json!({ "status": "success", "store": backend }))),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "error", "store": backend, "message": "Store unreachable" })),
            )
        }
    }
}

pub async fn not_found(OriginalUri(uri): OriginalUri) -> ApiError {
    ApiError::not_found(format!("Can't find {} on this server", uri.path()))
}
