//! Domain models for the AgriConnect platform
//!
//! Re-exports models from the shared crate

pub use shared::models::*;
