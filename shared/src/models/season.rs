//! Season (crop-growing cycle) models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One crop-growing cycle tied to a farmer, province and crop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Season {
    /// Identifier assigned by the record store.
    pub id: String,
    pub farmer_name: String,
    /// Province as entered; matched by substring against the canonical
    /// region list when estimating.
    pub province: String,
    pub crop: String,
    /// Cultivated area in hectares. Invalid or absent stored values are
    /// normalized to 0.0 by the store adapter.
    pub area: f64,
    /// ISO calendar dates kept as entered. Parsing happens at estimation
    /// time so malformed input degrades to the default growth duration
    /// instead of failing the record.
    pub sow_date: Option<String>,
    pub harvest_date: Option<String>,
    pub fertilizer: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Username of the owning account.
    pub user: String,
    /// Total yield in tons. Absent until entered or computed; never a
    /// zero sentinel.
    pub actual_yield: Option<f64>,
    pub yield_calculated_at: Option<DateTime<Utc>>,
    pub yield_source: Option<YieldSource>,
}

impl Season {
    /// Crop name normalized for table lookups and grouping.
    pub fn normalized_crop(&self) -> String {
        self.crop.trim().to_lowercase()
    }
}

/// Where an `actual_yield` value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum YieldSource {
    /// Entered by the user.
    Manual,
    /// Computed on request for a single season.
    Auto,
    /// Backfilled during an overview read.
    AutoOverview,
}

impl YieldSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            YieldSource::Manual => "manual",
            YieldSource::Auto => "auto",
            YieldSource::AutoOverview => "auto_overview",
        }
    }

    /// Parse a stored tag; unknown tags map to `None` rather than an error.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "manual" => Some(YieldSource::Manual),
            "auto" => Some(YieldSource::Auto),
            "auto_overview" => Some(YieldSource::AutoOverview),
            _ => None,
        }
    }
}
