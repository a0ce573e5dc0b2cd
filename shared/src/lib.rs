//! Shared types and domain logic for the AgriConnect platform
//!
//! This crate contains the season and user models together with the pure
//! estimation and advisory functions the backend builds on.

pub mod advisory;
pub mod estimate;
pub mod models;
pub mod validation;

pub use advisory::*;
pub use estimate::*;
pub use models::*;
pub use validation::*;
