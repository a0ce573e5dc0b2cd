//! Health check HTTP handler

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;

use crate::AppState;

/// Health check reporting record-store connectivity
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let store_status = match state.store.ping().await {
        Ok(()) => "connected".to_string(),
        Err(e) => format!("error: {}", e),
    };

    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "healthy",
            "store": store_status,
            "timestamp": Utc::now(),
        })),
    )
}
