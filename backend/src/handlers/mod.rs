//! HTTP handlers for the AgriConnect platform

pub mod auth;
pub mod health;
pub mod overview;
pub mod predict;
pub mod seasons;
pub mod weather;

pub use auth::*;
pub use health::*;
pub use overview::*;
pub use predict::*;
pub use seasons::*;
pub use weather::*;
