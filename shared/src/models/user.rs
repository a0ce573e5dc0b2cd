//! User account models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered account. Passwords are stored as bcrypt hashes only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub fullname: Option<String>,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

/// Default role assigned at registration.
pub const DEFAULT_ROLE: &str = "user";
