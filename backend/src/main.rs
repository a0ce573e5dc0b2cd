//! AgriConnect - Backend Server
//!
//! Season record-keeping, yield estimation and decision support for
//! farm provinces.

use std::{net::SocketAddr, sync::Arc};

use axum::{routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod error;
mod external;
mod handlers;
mod middleware;
mod models;
mod routes;
mod services;
mod store;

pub use config::Config;

use external::{WeatherClient, YieldModel};
use store::RecordStore;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RecordStore>,
    pub config: Arc<Config>,
    pub weather: WeatherClient,
    pub model: Option<Arc<YieldModel>>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "agri_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::load()?;

    tracing::info!("Starting AgriConnect Server");
    tracing::info!("Environment: {}", config.environment);

    // Connect the record store (the server still starts when the store is
    // unreachable; requests report unavailability)
    let store = store::connect(&config).await?;

    // External collaborators
    let weather = WeatherClient::new(
        config.weather.api_endpoint.clone(),
        config.weather.api_key.clone(),
    );
    let model = match YieldModel::load(&config.model.path) {
        Ok(model) => Some(Arc::new(model)),
        Err(e) => {
            tracing::warn!("Yield model not loaded: {}", e);
            None
        }
    };

    // Create application state
    let state = AppState {
        store,
        config: Arc::new(config.clone()),
        weather,
        model,
    };

    // Build application
    let app = create_app(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes and middleware
fn create_app(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(handlers::health_check))
        .nest("/api/v1", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Root endpoint
async fn root() -> &'static str {
    "AgriConnect API v1.0"
}
