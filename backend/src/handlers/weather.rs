//! Weather HTTP handlers

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

use crate::error::AppError;
use crate::middleware::CurrentUser;
use crate::services::weather_history::WeatherHistoryService;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CityQuery {
    pub city: String,
}

/// Current conditions for a place name
pub async fn get_current_weather(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(query): Query<CityQuery>,
) -> impl IntoResponse {
    let city = query.city.trim();
    if city.is_empty() {
        return AppError::Validation {
            field: "city".to_string(),
            message: "City name is required".to_string(),
            message_vi: "Vui lòng nhập tên thành phố.".to_string(),
        }
        .into_response();
    }

    match state.weather.current_by_city(city).await {
        Ok(conditions) => (StatusCode::OK, Json(conditions)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Newest rows of the annual weather series
pub async fn get_weather_history(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> impl IntoResponse {
    let service = WeatherHistoryService::new(&state.config.weather.history_path);

    match service.history().await {
        Ok(rows) => (
            StatusCode::OK,
            Json(serde_json::json!({ "weather": rows })),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

/// Column-oriented chart series of the annual weather
pub async fn get_weather_chart(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> impl IntoResponse {
    let service = WeatherHistoryService::new(&state.config.weather.history_path);

    match service.chart().await {
        Ok(chart) => (StatusCode::OK, Json(chart)).into_response(),
        Err(e) => e.into_response(),
    }
}
