//! Business logic services for the AgriConnect platform

pub mod auth;
pub mod overview;
pub mod season;
pub mod weather_history;

pub use auth::AuthService;
pub use overview::OverviewService;
pub use season::SeasonService;
pub use weather_history::WeatherHistoryService;
