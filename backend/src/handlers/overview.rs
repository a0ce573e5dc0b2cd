//! Overview statistics HTTP handler

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::middleware::CurrentUser;
use crate::services::overview::OverviewService;
use crate::AppState;

/// Aggregate statistics over all seasons.
///
/// Reading the overview may backfill missing yield estimates into
/// storage; the response reports how many records were touched.
pub async fn get_overview(State(state): State<AppState>, _user: CurrentUser) -> impl IntoResponse {
    let service = OverviewService::new(state.store.clone());

    match service.overview().await {
        Ok(stats) => (StatusCode::OK, Json(stats)).into_response(),
        Err(e) => e.into_response(),
    }
}
