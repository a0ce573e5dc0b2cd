//! Flat-file record store backend
//!
//! Seasons and users live in `seasons.csv` / `users.csv` inside the data
//! directory. Every cell is stored as text and coerced on read; updates
//! and deletes rewrite the whole file, so concurrent writers resolve as
//! last-write-wins.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::models::{Season, User, YieldSource};

use super::{parse_f64_field, NewSeason, NewUser, RecordStore, SeasonPatch};

const SEASONS_FILE: &str = "seasons.csv";
const USERS_FILE: &str = "users.csv";

/// CSV-backed record store rooted at a data directory.
#[derive(Clone)]
pub struct FlatFileStore {
    data_dir: PathBuf,
}

/// One row of `seasons.csv`. Everything is text; empty means absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SeasonRow {
    id: String,
    farmer_name: String,
    province: String,
    crop: String,
    area: String,
    sow_date: String,
    harvest_date: String,
    fertilizer: String,
    notes: String,
    created_at: String,
    user: String,
    actual_yield: String,
    yield_calculated_at: String,
    yield_source: String,
}

/// One row of `users.csv`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct UserRow {
    id: String,
    username: String,
    password_hash: String,
    fullname: String,
    role: String,
    created_at: String,
}

impl FlatFileStore {
    pub fn new(data_dir: &str) -> AppResult<Self> {
        let data_dir = PathBuf::from(data_dir);
        std::fs::create_dir_all(&data_dir)
            .map_err(|e| AppError::Configuration(format!("data dir: {}", e)))?;
        Ok(Self { data_dir })
    }

    fn seasons_path(&self) -> PathBuf {
        self.data_dir.join(SEASONS_FILE)
    }

    fn users_path(&self) -> PathBuf {
        self.data_dir.join(USERS_FILE)
    }

    async fn read_seasons(&self) -> AppResult<Vec<SeasonRow>> {
        read_rows(&self.seasons_path()).await
    }

    async fn write_seasons(&self, rows: &[SeasonRow]) -> AppResult<()> {
        write_rows(&self.seasons_path(), rows).await
    }
}

#[async_trait]
impl RecordStore for FlatFileStore {
    async fn create_season(&self, season: &NewSeason) -> AppResult<String> {
        let mut rows = self.read_seasons().await?;
        let id = Uuid::new_v4().to_string();
        rows.push(season_row(&id, season));
        self.write_seasons(&rows).await?;
        Ok(id)
    }

    async fn get_season(&self, id: &str) -> AppResult<Season> {
        let rows = self.read_seasons().await?;
        rows.iter()
            .find(|row| row.id == id)
            .map(season_from_row)
            .ok_or_else(|| AppError::NotFound("Season".to_string()))
    }

    async fn list_seasons(&self, limit: Option<usize>) -> AppResult<Vec<Season>> {
        let rows = self.read_seasons().await?;
        let mut seasons: Vec<Season> = rows.iter().map(season_from_row).collect();
        if let Some(limit) = limit {
            seasons.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            seasons.truncate(limit);
        }
        Ok(seasons)
    }

    async fn update_season(&self, id: &str, patch: &SeasonPatch) -> AppResult<()> {
        let mut rows = self.read_seasons().await?;
        let row = rows
            .iter_mut()
            .find(|row| row.id == id)
            .ok_or_else(|| AppError::NotFound("Season".to_string()))?;
        apply_patch(row, patch);
        self.write_seasons(&rows).await
    }

    async fn delete_season(&self, id: &str) -> AppResult<()> {
        let mut rows = self.read_seasons().await?;
        let before = rows.len();
        rows.retain(|row| row.id != id);
        if rows.len() == before {
            return Err(AppError::NotFound("Season".to_string()));
        }
        self.write_seasons(&rows).await
    }

    async fn create_user(&self, user: &NewUser) -> AppResult<String> {
        let mut rows: Vec<UserRow> = read_rows(&self.users_path()).await?;
        let id = Uuid::new_v4().to_string();
        rows.push(UserRow {
            id: id.clone(),
            username: user.username.clone(),
            password_hash: user.password_hash.clone(),
            fullname: user.fullname.clone().unwrap_or_default(),
            role: user.role.clone(),
            created_at: user.created_at.to_rfc3339(),
        });
        write_rows(&self.users_path(), &rows).await?;
        Ok(id)
    }

    async fn find_user(&self, username: &str) -> AppResult<Option<User>> {
        let rows: Vec<UserRow> = read_rows(&self.users_path()).await?;
        Ok(rows
            .iter()
            .find(|row| row.username == username)
            .map(user_from_row))
    }

    async fn ping(&self) -> AppResult<()> {
        if self.data_dir.is_dir() {
            Ok(())
        } else {
            Err(AppError::StoreError(format!(
                "data directory missing: {}",
                self.data_dir.display()
            )))
        }
    }
}

async fn read_rows<T: DeserializeOwned>(path: &Path) -> AppResult<Vec<T>> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(AppError::StoreError(format!("read {}: {}", path.display(), e))),
    };

    let mut reader = csv::Reader::from_reader(bytes.as_slice());
    let mut rows = Vec::new();
    for record in reader.deserialize() {
        match record {
            Ok(row) => rows.push(row),
            // One malformed line never poisons the whole file.
            Err(e) => tracing::warn!(file = %path.display(), error = %e, "skipping malformed row"),
        }
    }
    Ok(rows)
}

async fn write_rows<T: Serialize>(path: &Path, rows: &[T]) -> AppResult<()> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in rows {
        writer
            .serialize(row)
            .map_err(|e| AppError::StoreError(format!("encode {}: {}", path.display(), e)))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| AppError::StoreError(format!("encode {}: {}", path.display(), e)))?;
    tokio::fs::write(path, bytes)
        .await
        .map_err(|e| AppError::StoreError(format!("write {}: {}", path.display(), e)))
}

fn season_row(id: &str, season: &NewSeason) -> SeasonRow {
    SeasonRow {
        id: id.to_string(),
        farmer_name: season.farmer_name.clone(),
        province: season.province.clone(),
        crop: season.crop.clone(),
        area: season.area.to_string(),
        sow_date: season.sow_date.clone().unwrap_or_default(),
        harvest_date: season.harvest_date.clone().unwrap_or_default(),
        fertilizer: season.fertilizer.clone().unwrap_or_default(),
        notes: season.notes.clone().unwrap_or_default(),
        created_at: season.created_at.to_rfc3339(),
        user: season.user.clone(),
        actual_yield: String::new(),
        yield_calculated_at: String::new(),
        yield_source: String::new(),
    }
}

fn apply_patch(row: &mut SeasonRow, patch: &SeasonPatch) {
    if let Some(v) = &patch.farmer_name {
        row.farmer_name = v.clone();
    }
    if let Some(v) = &patch.province {
        row.province = v.clone();
    }
    if let Some(v) = &patch.crop {
        row.crop = v.clone();
    }
    if let Some(v) = patch.area {
        row.area = v.to_string();
    }
    if let Some(v) = &patch.sow_date {
        row.sow_date = v.clone();
    }
    if let Some(v) = &patch.harvest_date {
        row.harvest_date = v.clone();
    }
    if let Some(v) = &patch.fertilizer {
        row.fertilizer = v.clone();
    }
    if let Some(v) = &patch.notes {
        row.notes = v.clone();
    }
    if let Some(v) = patch.actual_yield {
        row.actual_yield = v.to_string();
    }
    if let Some(v) = patch.yield_calculated_at {
        row.yield_calculated_at = v.to_rfc3339();
    }
    if let Some(v) = patch.yield_source {
        row.yield_source = v.as_str().to_string();
    }
}

fn season_from_row(row: &SeasonRow) -> Season {
    Season {
        id: row.id.clone(),
        farmer_name: row.farmer_name.clone(),
        province: row.province.clone(),
        crop: row.crop.clone(),
        area: parse_f64_field(&row.area).unwrap_or(0.0),
        sow_date: non_empty(&row.sow_date),
        harvest_date: non_empty(&row.harvest_date),
        fertilizer: non_empty(&row.fertilizer),
        notes: non_empty(&row.notes),
        created_at: parse_timestamp(&row.created_at),
        user: row.user.clone(),
        actual_yield: parse_f64_field(&row.actual_yield),
        yield_calculated_at: non_empty(&row.yield_calculated_at)
            .map(|s| parse_timestamp(&s)),
        yield_source: YieldSource::parse(&row.yield_source),
    }
}

fn user_from_row(row: &UserRow) -> User {
    User {
        id: row.id.clone(),
        username: row.username.clone(),
        password_hash: row.password_hash.clone(),
        fullname: non_empty(&row.fullname),
        role: row.role.clone(),
        created_at: parse_timestamp(&row.created_at),
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn parse_timestamp(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> FlatFileStore {
        let dir = std::env::temp_dir().join(format!("agri-store-{}", Uuid::new_v4()));
        FlatFileStore::new(dir.to_str().unwrap()).unwrap()
    }

    fn new_season(crop: &str, area: f64) -> NewSeason {
        NewSeason {
            farmer_name: "Phạm Văn D".to_string(),
            province: "Long An".to_string(),
            crop: crop.to_string(),
            area,
            sow_date: Some("2024-01-15".to_string()),
            harvest_date: Some("2024-05-20".to_string()),
            fertilizer: Some("NPK".to_string()),
            notes: None,
            created_at: Utc::now(),
            user: "tester".to_string(),
        }
    }

    #[tokio::test]
    async fn create_get_update_delete_round_trip() {
        let store = temp_store();

        let id = store.create_season(&new_season("lúa", 2.0)).await.unwrap();
        let season = store.get_season(&id).await.unwrap();
        assert_eq!(season.crop, "lúa");
        assert_eq!(season.area, 2.0);
        assert_eq!(season.actual_yield, None);

        let patch = SeasonPatch {
            actual_yield: Some(9.9),
            yield_calculated_at: Some(Utc::now()),
            yield_source: Some(YieldSource::Auto),
            ..Default::default()
        };
        store.update_season(&id, &patch).await.unwrap();

        let season = store.get_season(&id).await.unwrap();
        assert_eq!(season.actual_yield, Some(9.9));
        assert_eq!(season.yield_source, Some(YieldSource::Auto));

        store.delete_season(&id).await.unwrap();
        assert!(matches!(
            store.get_season(&id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn missing_file_lists_empty() {
        let store = temp_store();
        assert!(store.list_seasons(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn limited_list_is_newest_first_and_capped() {
        let store = temp_store();
        for i in 0..4 {
            let mut season = new_season("ngô", 1.0);
            season.created_at = Utc::now() + chrono::Duration::seconds(i);
            season.notes = Some(format!("season {}", i));
            store.create_season(&season).await.unwrap();
        }

        let limited = store.list_seasons(Some(2)).await.unwrap();
        assert_eq!(limited.len(), 2);
        assert_eq!(limited[0].notes.as_deref(), Some("season 3"));

        let full = store.list_seasons(None).await.unwrap();
        assert_eq!(full.len(), 4);
        // Full scan keeps storage order.
        assert_eq!(full[0].notes.as_deref(), Some("season 0"));
    }

    #[tokio::test]
    async fn numeric_fields_are_normalized_on_read() {
        let store = temp_store();
        let id = store.create_season(&new_season("lúa", 1.0)).await.unwrap();

        // Corrupt the stored numbers directly.
        let mut rows = store.read_seasons().await.unwrap();
        if let Some(row) = rows.iter_mut().find(|r| r.id == id) {
            row.area = "not-a-number".to_string();
            row.actual_yield = "also bad".to_string();
        }
        store.write_seasons(&rows).await.unwrap();

        let season = store.get_season(&id).await.unwrap();
        assert_eq!(season.area, 0.0);
        assert_eq!(season.actual_yield, None);
    }

    #[tokio::test]
    async fn update_missing_season_is_not_found() {
        let store = temp_store();
        let result = store
            .update_season("no-such-id", &SeasonPatch::default())
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn users_round_trip_by_username() {
        let store = temp_store();
        let user = NewUser {
            username: "farmer01".to_string(),
            password_hash: "$2b$12$hash".to_string(),
            fullname: Some("Nguyễn Văn A".to_string()),
            role: "user".to_string(),
            created_at: Utc::now(),
        };
        store.create_user(&user).await.unwrap();

        let found = store.find_user("farmer01").await.unwrap().unwrap();
        assert_eq!(found.username, "farmer01");
        assert_eq!(found.fullname.as_deref(), Some("Nguyễn Văn A"));
        assert!(store.find_user("nobody").await.unwrap().is_none());
    }
}
