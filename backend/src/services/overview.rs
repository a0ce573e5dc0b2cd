//! Overview statistics with opportunistic yield backfill
//!
//! Folds the full season collection into province/crop statistics. Before
//! folding, seasons that lack a yield but carry enough information are
//! estimated and the estimate written back to storage — a read that
//! triggers a limited write, kept for behavioral parity with the data
//! entry workflow this replaces. Statistics for the current request are
//! computed from the values already in hand; the next read observes the
//! stored estimates.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;

use crate::error::AppResult;
use crate::store::{RecordStore, SeasonPatch};
use shared::estimate_total_yield;
use shared::models::{Season, YieldSource};

/// Number of provinces reported in the area ranking.
const TOP_PROVINCES: usize = 5;

/// Number of provinces reported per crop in the productivity ranking.
const TOP_PROVINCES_PER_CROP: usize = 3;

/// Grouping label for records without a province or crop.
const UNSPECIFIED: &str = "Chưa xác định";

/// Overview service computing aggregate statistics on demand
#[derive(Clone)]
pub struct OverviewService {
    store: Arc<dyn RecordStore>,
}

/// Aggregated statistics over all season records. Recomputed fully on
/// each request, never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct OverviewStats {
    pub total_seasons: usize,
    pub total_area: f64,
    pub top_provinces: Vec<ProvinceArea>,
    pub crop_distribution: BTreeMap<String, u64>,
    pub top_provinces_by_crop: Vec<CropProvinces>,
    /// Seasons whose yield was estimated and stored during this read.
    pub auto_calculated: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProvinceArea {
    pub province: String,
    pub area: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CropProvinces {
    pub crop: String,
    pub provinces: Vec<ProvinceProductivity>,
}

/// Per-(crop, province) accumulator. Productivity is the ratio of the
/// running totals — an area-weighted average, not a mean of per-record
/// productivities.
#[derive(Debug, Clone, Serialize)]
pub struct ProvinceProductivity {
    pub province: String,
    pub total_area: f64,
    pub total_yield: f64,
    pub productivity: f64,
}

impl OverviewService {
    /// Create a new OverviewService instance
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    pub async fn overview(&self) -> AppResult<OverviewStats> {
        let seasons = self.store.list_seasons(None).await?;
        let auto_calculated = self.backfill(&seasons).await;
        let mut stats = fold_seasons(&seasons);
        stats.auto_calculated = auto_calculated;
        Ok(stats)
    }

    /// Estimate and persist yields for seasons that lack one.
    ///
    /// At-least-once: a crash between estimate and write just means the
    /// next read recomputes and retries. Concurrent overview reads may
    /// race on the same record; the last write wins. A failed write is
    /// logged and skipped, never fatal.
    async fn backfill(&self, seasons: &[Season]) -> usize {
        let mut written = 0;
        for season in seasons {
            if season.actual_yield.is_some()
                || season.normalized_crop().is_empty()
                || season.area <= 0.0
            {
                continue;
            }
            let Some(estimate) = estimate_total_yield(season) else {
                continue;
            };

            let patch = SeasonPatch {
                actual_yield: Some(estimate),
                yield_calculated_at: Some(Utc::now()),
                yield_source: Some(YieldSource::AutoOverview),
                ..Default::default()
            };
            match self.store.update_season(&season.id, &patch).await {
                Ok(()) => {
                    written += 1;
                    tracing::info!(season = %season.id, estimate, "backfilled yield estimate");
                }
                Err(e) => {
                    tracing::warn!(season = %season.id, error = %e, "yield backfill write failed");
                }
            }
        }
        written
    }
}

/// Single-pass fold of season records into overview statistics.
///
/// A record that cannot contribute to the productivity ranking (no
/// positive yield, no area) still counts toward the totals it can feed.
pub fn fold_seasons(seasons: &[Season]) -> OverviewStats {
    let mut total_area = 0.0;
    // Insertion-ordered pairs so exact ranking ties resolve to
    // first-seen order.
    let mut area_by_province: Vec<(String, f64)> = Vec::new();
    let mut crop_distribution: BTreeMap<String, u64> = BTreeMap::new();
    let mut productivity: Vec<(String, Vec<ProvinceProductivity>)> = Vec::new();

    for season in seasons {
        let area = if season.area.is_finite() { season.area } else { 0.0 };
        let province = province_label(&season.province);
        let crop = crop_label(season);

        total_area += area;

        match area_by_province.iter().position(|(p, _)| *p == province) {
            Some(i) => area_by_province[i].1 += area,
            None => area_by_province.push((province.clone(), area)),
        }

        *crop_distribution.entry(crop.clone()).or_insert(0) += 1;

        let Some(yield_value) = season.actual_yield else {
            continue;
        };
        if yield_value <= 0.0 || area <= 0.0 {
            continue;
        }

        let crop_idx = match productivity.iter().position(|(c, _)| *c == crop) {
            Some(i) => i,
            None => {
                productivity.push((crop.clone(), Vec::new()));
                productivity.len() - 1
            }
        };
        let provinces = &mut productivity[crop_idx].1;
        match provinces.iter().position(|p| p.province == province) {
            Some(i) => {
                let entry = &mut provinces[i];
                entry.total_area += area;
                entry.total_yield += yield_value;
                entry.productivity = entry.total_yield / entry.total_area;
            }
            None => provinces.push(ProvinceProductivity {
                province: province.clone(),
                total_area: area,
                total_yield: yield_value,
                productivity: yield_value / area,
            }),
        }
    }

    let mut top_provinces: Vec<ProvinceArea> = area_by_province
        .into_iter()
        .map(|(province, area)| ProvinceArea { province, area })
        .collect();
    // Stable sort: ties keep first-seen order.
    top_provinces.sort_by(|a, b| b.area.partial_cmp(&a.area).unwrap_or(Ordering::Equal));
    top_provinces.truncate(TOP_PROVINCES);

    let top_provinces_by_crop = productivity
        .into_iter()
        .map(|(crop, mut provinces)| {
            provinces.sort_by(|a, b| {
                b.productivity
                    .partial_cmp(&a.productivity)
                    .unwrap_or(Ordering::Equal)
            });
            provinces.truncate(TOP_PROVINCES_PER_CROP);
            CropProvinces { crop, provinces }
        })
        .collect();

    OverviewStats {
        total_seasons: seasons.len(),
        total_area,
        top_provinces,
        crop_distribution,
        top_provinces_by_crop,
        auto_calculated: 0,
    }
}

fn province_label(province: &str) -> String {
    let province = province.trim();
    if province.is_empty() {
        UNSPECIFIED.to_string()
    } else {
        province.to_string()
    }
}

fn crop_label(season: &Season) -> String {
    let crop = season.normalized_crop();
    if crop.is_empty() {
        UNSPECIFIED.to_lowercase()
    } else {
        crop
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use tokio::sync::Mutex;

    use crate::error::AppError;
    use crate::store::{NewSeason, NewUser, RecordStore};
    use shared::models::User;

    use super::*;

    fn season(id: &str, province: &str, crop: &str, area: f64, actual_yield: Option<f64>) -> Season {
        Season {
            id: id.to_string(),
            farmer_name: "Người trồng".to_string(),
            province: province.to_string(),
            crop: crop.to_string(),
            area,
            sow_date: None,
            harvest_date: None,
            fertilizer: None,
            notes: None,
            created_at: Utc::now(),
            user: "tester".to_string(),
            actual_yield,
            yield_calculated_at: None,
            yield_source: None,
        }
    }

    #[test]
    fn productivity_is_area_weighted_not_mean_of_ratios() {
        let seasons = vec![
            season("a", "An Giang", "lúa", 1.0, Some(2.0)),
            season("b", "An Giang", "lúa", 3.0, Some(3.0)),
        ];
        let stats = fold_seasons(&seasons);
        let entry = &stats.top_provinces_by_crop[0].provinces[0];
        // (2 + 3) / (1 + 3), not (2.0 + 1.0) / 2.
        assert_eq!(entry.productivity, 1.25);
        assert_eq!(entry.total_area, 4.0);
        assert_eq!(entry.total_yield, 5.0);
    }

    #[test]
    fn totals_count_records_that_cannot_rank() {
        let seasons = vec![
            season("a", "Long An", "lúa", 2.0, None),
            season("b", "Long An", "ngô", 0.0, Some(4.0)),
            season("c", "Hà Nội", "lúa", 1.5, Some(0.0)),
        ];
        let stats = fold_seasons(&seasons);
        assert_eq!(stats.total_seasons, 3);
        assert_eq!(stats.total_area, 3.5);
        assert_eq!(stats.crop_distribution["lúa"], 2);
        assert_eq!(stats.crop_distribution["ngô"], 1);
        // None of the three qualifies for the productivity ranking.
        assert!(stats.top_provinces_by_crop.is_empty());
    }

    #[test]
    fn top_provinces_are_sorted_descending_and_capped_at_five() {
        let provinces = ["A", "B", "C", "D", "E", "F"];
        let seasons: Vec<Season> = provinces
            .iter()
            .enumerate()
            .map(|(i, p)| season(p, p, "lúa", (i + 1) as f64, None))
            .collect();
        let stats = fold_seasons(&seasons);
        assert_eq!(stats.top_provinces.len(), 5);
        assert_eq!(stats.top_provinces[0].province, "F");
        assert_eq!(stats.top_provinces[4].province, "B");
    }

    #[test]
    fn exact_ties_keep_first_seen_order() {
        let seasons = vec![
            season("a", "Bắc Ninh", "lúa", 2.0, Some(4.0)),
            season("b", "Hưng Yên", "lúa", 2.0, Some(4.0)),
            season("c", "Hà Nội", "lúa", 2.0, Some(4.0)),
        ];
        let stats = fold_seasons(&seasons);
        let order: Vec<&str> = stats.top_provinces_by_crop[0]
            .provinces
            .iter()
            .map(|p| p.province.as_str())
            .collect();
        assert_eq!(order, ["Bắc Ninh", "Hưng Yên", "Hà Nội"]);

        let area_order: Vec<&str> = stats
            .top_provinces
            .iter()
            .map(|p| p.province.as_str())
            .collect();
        assert_eq!(area_order, ["Bắc Ninh", "Hưng Yên", "Hà Nội"]);
    }

    #[test]
    fn per_crop_ranking_caps_at_three() {
        let seasons = vec![
            season("a", "P1", "chè", 1.0, Some(1.0)),
            season("b", "P2", "chè", 1.0, Some(2.0)),
            season("c", "P3", "chè", 1.0, Some(3.0)),
            season("d", "P4", "chè", 1.0, Some(4.0)),
        ];
        let stats = fold_seasons(&seasons);
        let provinces = &stats.top_provinces_by_crop[0].provinces;
        assert_eq!(provinces.len(), 3);
        assert_eq!(provinces[0].province, "P4");
        assert_eq!(provinces[2].province, "P2");
    }

    #[test]
    fn crop_names_are_normalized_for_grouping() {
        let seasons = vec![
            season("a", "An Giang", "Lúa", 1.0, Some(5.0)),
            season("b", "An Giang", "  lúa ", 1.0, Some(5.0)),
        ];
        let stats = fold_seasons(&seasons);
        assert_eq!(stats.crop_distribution["lúa"], 2);
        assert_eq!(stats.top_provinces_by_crop.len(), 1);
    }

    #[test]
    fn blank_province_and_crop_group_under_unspecified() {
        let seasons = vec![season("a", "  ", "", 1.0, None)];
        let stats = fold_seasons(&seasons);
        assert_eq!(stats.top_provinces[0].province, "Chưa xác định");
        assert_eq!(stats.crop_distribution["chưa xác định"], 1);
    }

    #[test]
    fn fold_is_idempotent_on_fully_populated_input() {
        let seasons = vec![
            season("a", "An Giang", "lúa", 2.0, Some(11.0)),
            season("b", "Đồng Tháp", "lúa", 1.0, Some(6.0)),
            season("c", "Gia Lai", "cà phê", 3.0, Some(5.4)),
        ];
        let first = fold_seasons(&seasons);
        let second = fold_seasons(&seasons);
        assert_eq!(
            serde_json::to_value(&first).unwrap(),
            serde_json::to_value(&second).unwrap()
        );
    }

    // ------------------------------------------------------------------
    // Backfill behavior against an in-memory store
    // ------------------------------------------------------------------

    struct MemoryStore {
        seasons: Mutex<Vec<Season>>,
        fail_updates: bool,
    }

    impl MemoryStore {
        fn with(seasons: Vec<Season>) -> Arc<Self> {
            Arc::new(Self {
                seasons: Mutex::new(seasons),
                fail_updates: false,
            })
        }

        fn failing(seasons: Vec<Season>) -> Arc<Self> {
            Arc::new(Self {
                seasons: Mutex::new(seasons),
                fail_updates: true,
            })
        }
    }

    #[async_trait::async_trait]
    impl RecordStore for MemoryStore {
        async fn create_season(&self, _season: &NewSeason) -> Result<String, AppError> {
            unimplemented!("not exercised by overview tests")
        }

        async fn get_season(&self, id: &str) -> Result<Season, AppError> {
            self.seasons
                .lock()
                .await
                .iter()
                .find(|s| s.id == id)
                .cloned()
                .ok_or_else(|| AppError::NotFound("Season".to_string()))
        }

        async fn list_seasons(&self, limit: Option<usize>) -> Result<Vec<Season>, AppError> {
            let mut seasons = self.seasons.lock().await.clone();
            if let Some(limit) = limit {
                seasons.truncate(limit);
            }
            Ok(seasons)
        }

        async fn update_season(&self, id: &str, patch: &SeasonPatch) -> Result<(), AppError> {
            if self.fail_updates {
                return Err(AppError::StoreError("write refused".to_string()));
            }
            let mut seasons = self.seasons.lock().await;
            let season = seasons
                .iter_mut()
                .find(|s| s.id == id)
                .ok_or_else(|| AppError::NotFound("Season".to_string()))?;
            if let Some(v) = patch.actual_yield {
                season.actual_yield = Some(v);
            }
            if let Some(v) = patch.yield_calculated_at {
                season.yield_calculated_at = Some(v);
            }
            if let Some(v) = patch.yield_source {
                season.yield_source = Some(v);
            }
            Ok(())
        }

        async fn delete_season(&self, _id: &str) -> Result<(), AppError> {
            unimplemented!("not exercised by overview tests")
        }

        async fn create_user(&self, _user: &NewUser) -> Result<String, AppError> {
            unimplemented!("not exercised by overview tests")
        }

        async fn find_user(&self, _username: &str) -> Result<Option<User>, AppError> {
            Ok(None)
        }

        async fn ping(&self) -> Result<(), AppError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn backfill_writes_only_eligible_seasons() {
        let store = MemoryStore::with(vec![
            season("has-yield", "An Giang", "lúa", 2.0, Some(9.0)),
            season("no-crop", "An Giang", "", 2.0, None),
            season("zero-area", "An Giang", "lúa", 0.0, None),
            season("eligible", "An Giang", "lúa", 2.0, None),
        ]);
        let service = OverviewService::new(store.clone());

        let stats = service.overview().await.unwrap();
        assert_eq!(stats.auto_calculated, 1);

        let updated = store.get_season("eligible").await.unwrap();
        // 5.5 × 0.9 × 1.0 × 1.3 × 2 = 12.87
        assert_eq!(updated.actual_yield, Some(12.87));
        assert_eq!(updated.yield_source, Some(YieldSource::AutoOverview));
        assert!(updated.yield_calculated_at.is_some());

        let untouched = store.get_season("zero-area").await.unwrap();
        assert_eq!(untouched.actual_yield, None);
    }

    #[tokio::test]
    async fn stats_reflect_pre_backfill_values() {
        let store = MemoryStore::with(vec![
            season("a", "An Giang", "lúa", 2.0, None),
        ]);
        let service = OverviewService::new(store.clone());

        // First read backfills but folds the values it had in hand.
        let first = service.overview().await.unwrap();
        assert_eq!(first.auto_calculated, 1);
        assert!(first.top_provinces_by_crop.is_empty());

        // The next read observes the stored estimate.
        let second = service.overview().await.unwrap();
        assert_eq!(second.auto_calculated, 0);
        assert_eq!(second.top_provinces_by_crop.len(), 1);
    }

    #[tokio::test]
    async fn failed_backfill_write_never_aborts_the_read() {
        let store = MemoryStore::failing(vec![
            season("a", "An Giang", "lúa", 2.0, None),
            season("b", "Đồng Tháp", "ngô", 1.0, Some(4.0)),
        ]);
        let service = OverviewService::new(store);

        let stats = service.overview().await.unwrap();
        assert_eq!(stats.auto_calculated, 0);
        assert_eq!(stats.total_seasons, 2);
    }
}
