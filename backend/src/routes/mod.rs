//! Route definitions for the AgriConnect platform

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Auth routes (public)
        .nest("/auth", auth_routes())
        // Protected routes - season management
        .nest("/seasons", season_routes())
        // Protected routes - aggregate statistics
        .nest("/overview", overview_routes())
        // Protected routes - weather
        .nest("/weather", weather_routes())
        // Protected routes - model prediction
        .nest("/predict", predict_routes())
}

/// Authentication routes (public)
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(handlers::register))
        .route("/login", post(handlers::login))
}

/// Season management routes (protected)
fn season_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_seasons).post(handlers::create_season),
        )
        .route(
            "/:season_id",
            get(handlers::get_season)
                .put(handlers::update_season)
                .delete(handlers::delete_season),
        )
        .route(
            "/:season_id/yield",
            get(handlers::get_yield_review).post(handlers::record_yield),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Overview routes (protected)
fn overview_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::get_overview))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Weather routes (protected)
fn weather_routes() -> Router<AppState> {
    Router::new()
        .route("/current", get(handlers::get_current_weather))
        .route("/history", get(handlers::get_weather_history))
        .route("/chart", get(handlers::get_weather_chart))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Prediction routes (protected)
fn predict_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::predict_yield))
        .route_layer(middleware::from_fn(auth_middleware))
}
