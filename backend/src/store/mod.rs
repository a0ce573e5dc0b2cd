//! Record storage backends
//!
//! Seasons and users are persisted either in Firestore (hosted document
//! database) or in flat CSV files. Services operate only on the
//! [`RecordStore`] trait and never branch on the active backend.

pub mod firestore;
pub mod flatfile;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{AppError, AppResult};
use shared::models::{Season, User, YieldSource};

pub use firestore::FirestoreStore;
pub use flatfile::FlatFileStore;

/// Page size for the management list view. Aggregation reads bypass this
/// cap and scan everything.
pub const MANAGEMENT_PAGE_SIZE: usize = 50;

/// Season fields as supplied by a client, before the store assigns an id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSeason {
    pub farmer_name: String,
    pub province: String,
    pub crop: String,
    pub area: f64,
    pub sow_date: Option<String>,
    pub harvest_date: Option<String>,
    pub fertilizer: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub user: String,
}

/// Partial update for a season record. `None` fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeasonPatch {
    pub farmer_name: Option<String>,
    pub province: Option<String>,
    pub crop: Option<String>,
    pub area: Option<f64>,
    pub sow_date: Option<String>,
    pub harvest_date: Option<String>,
    pub fertilizer: Option<String>,
    pub notes: Option<String>,
    pub actual_yield: Option<f64>,
    pub yield_calculated_at: Option<DateTime<Utc>>,
    pub yield_source: Option<YieldSource>,
}

/// User fields as supplied at registration, before the store assigns an id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub fullname: Option<String>,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

/// Storage abstraction over the season and user collections.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn create_season(&self, season: &NewSeason) -> AppResult<String>;

    async fn get_season(&self, id: &str) -> AppResult<Season>;

    /// Newest-first and capped when `limit` is given; unbounded full scan
    /// in storage order otherwise.
    async fn list_seasons(&self, limit: Option<usize>) -> AppResult<Vec<Season>>;

    async fn update_season(&self, id: &str, patch: &SeasonPatch) -> AppResult<()>;

    async fn delete_season(&self, id: &str) -> AppResult<()>;

    async fn create_user(&self, user: &NewUser) -> AppResult<String>;

    async fn find_user(&self, username: &str) -> AppResult<Option<User>>;

    /// Cheap connectivity probe.
    async fn ping(&self) -> AppResult<()>;
}

const PING_ATTEMPTS: usize = 2;
const PING_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Build the configured backend and probe connectivity.
///
/// A store that stays unreachable after the probe is still returned: the
/// server starts and each request reports unavailability instead of the
/// process crashing.
pub async fn connect(config: &Config) -> AppResult<Arc<dyn RecordStore>> {
    let store: Arc<dyn RecordStore> = match config.store.backend.as_str() {
        "firestore" => Arc::new(FirestoreStore::new(&config.store.firestore)?),
        "csv" => Arc::new(FlatFileStore::new(&config.store.data_dir)?),
        other => {
            return Err(AppError::Configuration(format!(
                "unknown store backend: {}",
                other
            )))
        }
    };

    if ping_with_retry(store.as_ref()).await {
        tracing::info!(backend = %config.store.backend, "record store connected");
    } else {
        tracing::error!(backend = %config.store.backend, "record store unavailable");
    }

    Ok(store)
}

/// Probe the store, retrying at most twice with a fixed one-second delay.
pub async fn ping_with_retry(store: &dyn RecordStore) -> bool {
    for attempt in 1..=PING_ATTEMPTS {
        match store.ping().await {
            Ok(()) => return true,
            Err(e) => {
                tracing::warn!(attempt, error = %e, "store connectivity check failed");
                if attempt < PING_ATTEMPTS {
                    tokio::time::sleep(PING_RETRY_DELAY).await;
                }
            }
        }
    }
    false
}

/// Lenient coercion for the `area` field: absent or unparseable → 0.0.
pub(crate) fn normalize_area(raw: Option<f64>) -> f64 {
    match raw {
        Some(v) if v.is_finite() => v,
        _ => 0.0,
    }
}

/// Lenient coercion for the `actual_yield` field: absent or unparseable
/// stays absent — zero is a valid stored value, not a sentinel.
pub(crate) fn normalize_yield(raw: Option<f64>) -> Option<f64> {
    raw.filter(|v| v.is_finite())
}

/// Parse a free-text numeric field from a flat file.
pub(crate) fn parse_f64_field(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    raw.parse::<f64>().ok()
}
