//! Season record management service

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::store::{NewSeason, RecordStore, SeasonPatch, MANAGEMENT_PAGE_SIZE};
use shared::models::{Season, YieldSource};
use shared::{
    estimate_total_yield, generate_advisory, round2, validate_area, validate_farmer_name,
    validate_yield, AdvisoryReport,
};

/// Season service for registering and maintaining season records
#[derive(Clone)]
pub struct SeasonService {
    store: Arc<dyn RecordStore>,
}

/// Input for registering a season
#[derive(Debug, Deserialize)]
pub struct CreateSeasonInput {
    pub farmer_name: String,
    pub province: String,
    pub crop: String,
    #[serde(default)]
    pub area: f64,
    pub sow_date: Option<String>,
    pub harvest_date: Option<String>,
    pub fertilizer: Option<String>,
    pub notes: Option<String>,
}

/// Input for editing a season
#[derive(Debug, Default, Deserialize)]
pub struct UpdateSeasonInput {
    pub farmer_name: Option<String>,
    pub province: Option<String>,
    pub crop: Option<String>,
    pub area: Option<f64>,
    pub sow_date: Option<String>,
    pub harvest_date: Option<String>,
    pub fertilizer: Option<String>,
    pub notes: Option<String>,
}

/// Input for recording a yield value. An absent value asks the service
/// to compute the heuristic estimate instead.
#[derive(Debug, Default, Deserialize)]
pub struct RecordYieldInput {
    pub actual_yield: Option<f64>,
}

/// Estimate plus advisory for one season, computed without persisting.
#[derive(Debug, Serialize)]
pub struct YieldReview {
    pub season: Season,
    pub predicted_yield: Option<f64>,
    pub decision_support: Option<AdvisoryReport>,
}

impl SeasonService {
    /// Create a new SeasonService instance
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Register a new season for the given account
    pub async fn create_season(&self, user: &str, input: CreateSeasonInput) -> AppResult<Season> {
        validate_farmer_name(&input.farmer_name).map_err(|msg| AppError::Validation {
            field: "farmer_name".to_string(),
            message: msg.to_string(),
            message_vi: "Vui lòng nhập tên nông dân.".to_string(),
        })?;
        validate_area(input.area).map_err(|msg| AppError::Validation {
            field: "area".to_string(),
            message: msg.to_string(),
            message_vi: "Diện tích không hợp lệ.".to_string(),
        })?;

        let season = NewSeason {
            farmer_name: input.farmer_name,
            province: input.province,
            crop: input.crop,
            area: input.area,
            sow_date: input.sow_date,
            harvest_date: input.harvest_date,
            fertilizer: input.fertilizer,
            notes: input.notes,
            created_at: Utc::now(),
            user: user.to_string(),
        };

        let id = self.store.create_season(&season).await?;
        self.store.get_season(&id).await
    }

    /// Newest seasons for the management view, capped at one page
    pub async fn list_seasons(&self) -> AppResult<Vec<Season>> {
        self.store.list_seasons(Some(MANAGEMENT_PAGE_SIZE)).await
    }

    pub async fn get_season(&self, id: &str) -> AppResult<Season> {
        self.store.get_season(id).await
    }

    /// Edit season fields; yield fields are managed by `record_yield`
    pub async fn update_season(&self, id: &str, input: UpdateSeasonInput) -> AppResult<Season> {
        if let Some(area) = input.area {
            validate_area(area).map_err(|msg| AppError::Validation {
                field: "area".to_string(),
                message: msg.to_string(),
                message_vi: "Diện tích không hợp lệ.".to_string(),
            })?;
        }

        let patch = SeasonPatch {
            farmer_name: input.farmer_name,
            province: input.province,
            crop: input.crop,
            area: input.area,
            sow_date: input.sow_date,
            harvest_date: input.harvest_date,
            fertilizer: input.fertilizer,
            notes: input.notes,
            ..Default::default()
        };

        self.store.update_season(id, &patch).await?;
        self.store.get_season(id).await
    }

    pub async fn delete_season(&self, id: &str) -> AppResult<()> {
        self.store.delete_season(id).await
    }

    /// Estimate and advisory for one season, without persisting anything
    pub async fn yield_review(&self, id: &str) -> AppResult<YieldReview> {
        let season = self.store.get_season(id).await?;
        let predicted_yield = estimate_total_yield(&season);
        let decision_support =
            predicted_yield.and_then(|total| generate_advisory(&season, total));
        Ok(YieldReview {
            season,
            predicted_yield,
            decision_support,
        })
    }

    /// Record a yield value: the caller's own figure, or the heuristic
    /// estimate when none is supplied. Source and timestamp are written
    /// together with the value so they are never stale.
    pub async fn record_yield(&self, id: &str, input: RecordYieldInput) -> AppResult<Season> {
        let season = self.store.get_season(id).await?;

        let (value, source) = match input.actual_yield {
            Some(value) => {
                validate_yield(value).map_err(|msg| AppError::Validation {
                    field: "actual_yield".to_string(),
                    message: msg.to_string(),
                    message_vi: "Năng suất không hợp lệ.".to_string(),
                })?;
                (round2(value), YieldSource::Manual)
            }
            None => {
                let estimate = estimate_total_yield(&season)
                    .ok_or_else(|| AppError::Unavailable("yield estimate".to_string()))?;
                (estimate, YieldSource::Auto)
            }
        };

        let patch = SeasonPatch {
            actual_yield: Some(value),
            yield_calculated_at: Some(Utc::now()),
            yield_source: Some(source),
            ..Default::default()
        };
        self.store.update_season(id, &patch).await?;

        tracing::info!(season = %id, value, source = source.as_str(), "recorded yield");
        self.store.get_season(id).await
    }
}
