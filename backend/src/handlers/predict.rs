//! Yield prediction HTTP handler (opaque regression model)

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Deserialize;

use crate::error::AppError;
use crate::middleware::CurrentUser;
use crate::AppState;

/// Weather triple for the regression model
#[derive(Debug, Deserialize)]
pub struct PredictInput {
    pub temp: f64,
    pub rain: f64,
    pub humid: f64,
}

/// Predict yield from a weather triple
pub async fn predict_yield(
    State(state): State<AppState>,
    _user: CurrentUser,
    Json(input): Json<PredictInput>,
) -> impl IntoResponse {
    let Some(model) = &state.model else {
        return AppError::Unavailable("yield model".to_string()).into_response();
    };

    let result = model.predict(input.temp, input.rain, input.humid);
    (
        StatusCode::OK,
        Json(serde_json::json!({ "result": result })),
    )
        .into_response()
}
