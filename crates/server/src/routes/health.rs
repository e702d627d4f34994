//! Health check endpoints.

use axum::{Json, Router, extract::State, http::StatusCode, routing::get};
use chrono::Utc;
use serde_json::{Value, json};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
}

/// Liveness health check endpoint.
///
/// Returns `{status: "ok", timestamp}` if the server is running. Does not
/// check dependencies.
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if item storage is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.items().ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
