//! Firestore record store backend
//!
//! Talks to the Firestore REST v1 API with `reqwest`. Documents carry
//! typed values (`stringValue`, `doubleValue`, ...) which are mapped
//! leniently onto the season and user models: a mis-typed numeric field
//! degrades to the adapter default instead of failing the record.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::config::FirestoreConfig;
use crate::error::{AppError, AppResult};
use shared::models::{Season, User, YieldSource};

use super::{
    normalize_area, normalize_yield, NewSeason, NewUser, RecordStore, SeasonPatch,
};

/// All outbound calls share this timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Page size used when scanning a collection.
const SCAN_PAGE_SIZE: usize = 300;

const SEASONS: &str = "seasons";
const USERS: &str = "users";

/// Firestore REST client for the season and user collections.
#[derive(Clone)]
pub struct FirestoreStore {
    client: Client,
    base_url: String,
    api_key: String,
}

/// A Firestore document: typed field map plus the server-assigned name.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Document {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default)]
    fields: BTreeMap<String, FireValue>,
}

/// Subset of Firestore's typed values used by this system.
#[derive(Debug, Clone, Serialize, Deserialize)]
enum FireValue {
    #[serde(rename = "stringValue")]
    String(String),
    #[serde(rename = "doubleValue")]
    Double(f64),
    /// Firestore encodes 64-bit integers as strings on the wire.
    #[serde(rename = "integerValue")]
    Integer(String),
    #[serde(rename = "booleanValue")]
    Bool(bool),
    #[serde(rename = "timestampValue")]
    Timestamp(String),
    #[serde(rename = "nullValue")]
    Null(()),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    #[serde(default)]
    documents: Vec<Document>,
    next_page_token: Option<String>,
}

impl FirestoreStore {
    pub fn new(config: &FirestoreConfig) -> AppResult<Self> {
        if config.project_id.is_empty() {
            return Err(AppError::Configuration(
                "firestore project_id is not set".to_string(),
            ));
        }
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AppError::Configuration(format!("http client: {}", e)))?;
        Ok(Self {
            client,
            base_url: format!(
                "https://firestore.googleapis.com/v1/projects/{}/databases/(default)/documents",
                config.project_id
            ),
            api_key: config.api_key.clone(),
        })
    }

    /// Create with a custom base URL (for testing against an emulator).
    pub fn with_base_url(config: &FirestoreConfig, base_url: String) -> AppResult<Self> {
        let mut store = Self::new(config)?;
        store.base_url = base_url;
        Ok(store)
    }

    async fn create_document(&self, collection: &str, doc: &Document) -> AppResult<String> {
        let url = format!("{}/{}", self.base_url, collection);
        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(doc)
            .send()
            .await
            .map_err(request_error)?;

        let created: Document = check_status(response, collection).await?.json().await
            .map_err(|e| AppError::StoreError(format!("malformed response: {}", e)))?;
        created
            .name
            .as_deref()
            .map(document_id)
            .ok_or_else(|| AppError::StoreError("created document has no name".to_string()))
    }

    async fn get_document(&self, collection: &str, id: &str) -> AppResult<Document> {
        let url = format!("{}/{}/{}", self.base_url, collection, id);
        let response = self
            .client
            .get(&url)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await
            .map_err(request_error)?;

        check_status(response, collection)
            .await?
            .json()
            .await
            .map_err(|e| AppError::StoreError(format!("malformed response: {}", e)))
    }

    async fn list_documents(
        &self,
        collection: &str,
        limit: Option<usize>,
        order_by: Option<&str>,
    ) -> AppResult<Vec<Document>> {
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let page_size = limit.unwrap_or(SCAN_PAGE_SIZE).min(SCAN_PAGE_SIZE);
            let mut query: Vec<(&str, String)> = vec![
                ("key", self.api_key.clone()),
                ("pageSize", page_size.to_string()),
            ];
            if let Some(order) = order_by {
                query.push(("orderBy", order.to_string()));
            }
            if let Some(token) = page_token.take() {
                query.push(("pageToken", token));
            }

            let url = format!("{}/{}", self.base_url, collection);
            let response = self
                .client
                .get(&url)
                .query(&query)
                .send()
                .await
                .map_err(request_error)?;

            let page: ListResponse = check_status(response, collection)
                .await?
                .json()
                .await
                .map_err(|e| AppError::StoreError(format!("malformed response: {}", e)))?;

            documents.extend(page.documents);

            if let Some(limit) = limit {
                if documents.len() >= limit {
                    documents.truncate(limit);
                    break;
                }
            }
            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(documents)
    }

    async fn patch_document(
        &self,
        collection: &str,
        id: &str,
        fields: BTreeMap<String, FireValue>,
    ) -> AppResult<()> {
        let mut query: Vec<(&str, String)> = vec![("key", self.api_key.clone())];
        for path in fields.keys() {
            query.push(("updateMask.fieldPaths", path.clone()));
        }
        // Reject the patch when the document is missing instead of
        // upserting it.
        query.push(("currentDocument.exists", "true".to_string()));

        let url = format!("{}/{}/{}", self.base_url, collection, id);
        let response = self
            .client
            .patch(&url)
            .query(&query)
            .json(&Document { name: None, fields })
            .send()
            .await
            .map_err(request_error)?;

        check_status(response, collection).await?;
        Ok(())
    }
}

#[async_trait]
impl RecordStore for FirestoreStore {
    async fn create_season(&self, season: &NewSeason) -> AppResult<String> {
        self.create_document(SEASONS, &season_document(season)).await
    }

    async fn get_season(&self, id: &str) -> AppResult<Season> {
        let doc = self.get_document(SEASONS, id).await?;
        Ok(season_from_document(&doc))
    }

    async fn list_seasons(&self, limit: Option<usize>) -> AppResult<Vec<Season>> {
        let order_by = limit.map(|_| "created_at desc");
        let docs = self.list_documents(SEASONS, limit, order_by).await?;
        Ok(docs.iter().map(season_from_document).collect())
    }

    async fn update_season(&self, id: &str, patch: &SeasonPatch) -> AppResult<()> {
        let fields = patch_fields(patch);
        if fields.is_empty() {
            return Ok(());
        }
        self.patch_document(SEASONS, id, fields).await
    }

    async fn delete_season(&self, id: &str) -> AppResult<()> {
        let url = format!("{}/{}/{}", self.base_url, SEASONS, id);
        let response = self
            .client
            .delete(&url)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await
            .map_err(request_error)?;
        check_status(response, SEASONS).await?;
        Ok(())
    }

    async fn create_user(&self, user: &NewUser) -> AppResult<String> {
        self.create_document(USERS, &user_document(user)).await
    }

    async fn find_user(&self, username: &str) -> AppResult<Option<User>> {
        let body = serde_json::json!({
            "structuredQuery": {
                "from": [{ "collectionId": USERS }],
                "where": {
                    "fieldFilter": {
                        "field": { "fieldPath": "username" },
                        "op": "EQUAL",
                        "value": { "stringValue": username }
                    }
                },
                "limit": 1
            }
        });

        let url = format!("{}:runQuery", self.base_url);
        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(request_error)?;

        let results: Vec<serde_json::Value> = check_status(response, USERS)
            .await?
            .json()
            .await
            .map_err(|e| AppError::StoreError(format!("malformed response: {}", e)))?;

        for result in results {
            if let Some(raw) = result.get("document") {
                let doc: Document = serde_json::from_value(raw.clone())
                    .map_err(|e| AppError::StoreError(format!("malformed document: {}", e)))?;
                return Ok(Some(user_from_document(&doc)));
            }
        }
        Ok(None)
    }

    async fn ping(&self) -> AppResult<()> {
        self.list_documents(SEASONS, Some(1), None).await?;
        Ok(())
    }
}

fn request_error(e: reqwest::Error) -> AppError {
    if e.is_timeout() {
        AppError::StoreError("request timed out".to_string())
    } else {
        AppError::StoreError(format!("request failed: {}", e))
    }
}

async fn check_status(
    response: reqwest::Response,
    collection: &str,
) -> AppResult<reqwest::Response> {
    match response.status() {
        status if status.is_success() => Ok(response),
        StatusCode::NOT_FOUND => Err(AppError::NotFound(resource_name(collection).to_string())),
        status => {
            let body = response.text().await.unwrap_or_default();
            Err(AppError::StoreError(format!(
                "firestore returned {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )))
        }
    }
}

fn resource_name(collection: &str) -> &'static str {
    match collection {
        SEASONS => "Season",
        _ => "User",
    }
}

/// Last path segment of a document name.
fn document_id(name: &str) -> String {
    name.rsplit('/').next().unwrap_or(name).to_string()
}

fn season_document(season: &NewSeason) -> Document {
    let mut fields = BTreeMap::new();
    fields.insert(
        "farmer_name".to_string(),
        FireValue::String(season.farmer_name.clone()),
    );
    fields.insert(
        "province".to_string(),
        FireValue::String(season.province.clone()),
    );
    fields.insert("crop".to_string(), FireValue::String(season.crop.clone()));
    fields.insert("area".to_string(), FireValue::Double(season.area));
    fields.insert(
        "sow_date".to_string(),
        FireValue::String(season.sow_date.clone().unwrap_or_default()),
    );
    fields.insert(
        "harvest_date".to_string(),
        FireValue::String(season.harvest_date.clone().unwrap_or_default()),
    );
    fields.insert(
        "fertilizer".to_string(),
        FireValue::String(season.fertilizer.clone().unwrap_or_default()),
    );
    fields.insert(
        "notes".to_string(),
        FireValue::String(season.notes.clone().unwrap_or_default()),
    );
    fields.insert(
        "created_at".to_string(),
        FireValue::Timestamp(season.created_at.to_rfc3339()),
    );
    fields.insert("user".to_string(), FireValue::String(season.user.clone()));
    Document { name: None, fields }
}

fn patch_fields(patch: &SeasonPatch) -> BTreeMap<String, FireValue> {
    let mut fields = BTreeMap::new();
    if let Some(v) = &patch.farmer_name {
        fields.insert("farmer_name".to_string(), FireValue::String(v.clone()));
    }
    if let Some(v) = &patch.province {
        fields.insert("province".to_string(), FireValue::String(v.clone()));
    }
    if let Some(v) = &patch.crop {
        fields.insert("crop".to_string(), FireValue::String(v.clone()));
    }
    if let Some(v) = patch.area {
        fields.insert("area".to_string(), FireValue::Double(v));
    }
    if let Some(v) = &patch.sow_date {
        fields.insert("sow_date".to_string(), FireValue::String(v.clone()));
    }
    if let Some(v) = &patch.harvest_date {
        fields.insert("harvest_date".to_string(), FireValue::String(v.clone()));
    }
    if let Some(v) = &patch.fertilizer {
        fields.insert("fertilizer".to_string(), FireValue::String(v.clone()));
    }
    if let Some(v) = &patch.notes {
        fields.insert("notes".to_string(), FireValue::String(v.clone()));
    }
    if let Some(v) = patch.actual_yield {
        fields.insert("actual_yield".to_string(), FireValue::Double(v));
    }
    if let Some(v) = patch.yield_calculated_at {
        fields.insert(
            "yield_calculated_at".to_string(),
            FireValue::Timestamp(v.to_rfc3339()),
        );
    }
    if let Some(v) = patch.yield_source {
        fields.insert(
            "yield_source".to_string(),
            FireValue::String(v.as_str().to_string()),
        );
    }
    fields
}

fn season_from_document(doc: &Document) -> Season {
    let fields = &doc.fields;
    Season {
        id: doc.name.as_deref().map(document_id).unwrap_or_default(),
        farmer_name: get_string(fields, "farmer_name").unwrap_or_default(),
        province: get_string(fields, "province").unwrap_or_default(),
        crop: get_string(fields, "crop").unwrap_or_default(),
        area: normalize_area(get_f64(fields, "area")),
        sow_date: get_string(fields, "sow_date").filter(|s| !s.is_empty()),
        harvest_date: get_string(fields, "harvest_date").filter(|s| !s.is_empty()),
        fertilizer: get_string(fields, "fertilizer").filter(|s| !s.is_empty()),
        notes: get_string(fields, "notes").filter(|s| !s.is_empty()),
        created_at: get_timestamp(fields, "created_at").unwrap_or_else(Utc::now),
        user: get_string(fields, "user").unwrap_or_default(),
        actual_yield: normalize_yield(get_f64(fields, "actual_yield")),
        yield_calculated_at: get_timestamp(fields, "yield_calculated_at"),
        yield_source: get_string(fields, "yield_source")
            .and_then(|s| YieldSource::parse(&s)),
    }
}

fn user_document(user: &NewUser) -> Document {
    let mut fields = BTreeMap::new();
    fields.insert(
        "username".to_string(),
        FireValue::String(user.username.clone()),
    );
    fields.insert(
        "password_hash".to_string(),
        FireValue::String(user.password_hash.clone()),
    );
    fields.insert(
        "fullname".to_string(),
        FireValue::String(user.fullname.clone().unwrap_or_default()),
    );
    fields.insert("role".to_string(), FireValue::String(user.role.clone()));
    fields.insert(
        "created_at".to_string(),
        FireValue::Timestamp(user.created_at.to_rfc3339()),
    );
    Document { name: None, fields }
}

fn user_from_document(doc: &Document) -> User {
    let fields = &doc.fields;
    User {
        id: doc.name.as_deref().map(document_id).unwrap_or_default(),
        username: get_string(fields, "username").unwrap_or_default(),
        password_hash: get_string(fields, "password_hash").unwrap_or_default(),
        fullname: get_string(fields, "fullname").filter(|s| !s.is_empty()),
        role: get_string(fields, "role").unwrap_or_else(|| "user".to_string()),
        created_at: get_timestamp(fields, "created_at").unwrap_or_else(Utc::now),
    }
}

fn get_string(fields: &BTreeMap<String, FireValue>, key: &str) -> Option<String> {
    match fields.get(key)? {
        FireValue::String(s) => Some(s.clone()),
        FireValue::Integer(s) => Some(s.clone()),
        FireValue::Double(d) => Some(d.to_string()),
        FireValue::Bool(b) => Some(b.to_string()),
        FireValue::Timestamp(t) => Some(t.clone()),
        FireValue::Null(()) => None,
    }
}

fn get_f64(fields: &BTreeMap<String, FireValue>, key: &str) -> Option<f64> {
    match fields.get(key)? {
        FireValue::Double(d) => Some(*d),
        FireValue::Integer(s) => s.parse().ok(),
        FireValue::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn get_timestamp(fields: &BTreeMap<String, FireValue>, key: &str) -> Option<DateTime<Utc>> {
    match fields.get(key)? {
        FireValue::Timestamp(t) | FireValue::String(t) => DateTime::parse_from_rfc3339(t)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        _ => None,
    }
}
