//! Season management HTTP handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::middleware::CurrentUser;
use crate::services::season::{
    CreateSeasonInput, RecordYieldInput, SeasonService, UpdateSeasonInput,
};
use crate::AppState;

/// List the newest seasons (management page, capped)
pub async fn list_seasons(State(state): State<AppState>, _user: CurrentUser) -> impl IntoResponse {
    let service = SeasonService::new(state.store.clone());

    match service.list_seasons().await {
        Ok(seasons) => (
            StatusCode::OK,
            Json(serde_json::json!({ "seasons": seasons })),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

/// Register a new season
pub async fn create_season(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<CreateSeasonInput>,
) -> impl IntoResponse {
    let service = SeasonService::new(state.store.clone());

    match service.create_season(&user.username, input).await {
        Ok(season) => (StatusCode::CREATED, Json(season)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Get a specific season
pub async fn get_season(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(season_id): Path<String>,
) -> impl IntoResponse {
    let service = SeasonService::new(state.store.clone());

    match service.get_season(&season_id).await {
        Ok(season) => (StatusCode::OK, Json(season)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Edit a season
pub async fn update_season(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(season_id): Path<String>,
    Json(input): Json<UpdateSeasonInput>,
) -> impl IntoResponse {
    let service = SeasonService::new(state.store.clone());

    match service.update_season(&season_id, input).await {
        Ok(season) => (StatusCode::OK, Json(season)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Delete a season
pub async fn delete_season(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(season_id): Path<String>,
) -> impl IntoResponse {
    let service = SeasonService::new(state.store.clone());

    match service.delete_season(&season_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => e.into_response(),
    }
}

/// Estimate and advisory review for a season (nothing is persisted)
pub async fn get_yield_review(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(season_id): Path<String>,
) -> impl IntoResponse {
    let service = SeasonService::new(state.store.clone());

    match service.yield_review(&season_id).await {
        Ok(review) => (StatusCode::OK, Json(review)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Record a yield value (manual figure, or auto-computed when absent)
pub async fn record_yield(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(season_id): Path<String>,
    Json(input): Json<RecordYieldInput>,
) -> impl IntoResponse {
    let service = SeasonService::new(state.store.clone());

    match service.record_yield(&season_id, input).await {
        Ok(season) => (StatusCode::OK, Json(season)).into_response(),
        Err(e) => e.into_response(),
    }
}
