//! Historical weather series
//!
//! Reads the headerless annual weather CSV
//! (`Year, TempAvg, RainfallAnnual, HumidityAvg`) bundled with the
//! deployment. Malformed lines are skipped, never fatal.

use std::path::PathBuf;

use serde::Serialize;

use crate::error::{AppError, AppResult};
use shared::models::AnnualWeather;

/// Newest rows returned by the history view.
const HISTORY_ROWS: usize = 20;

/// Newest rows returned by the chart series.
const CHART_ROWS: usize = 10;

/// Weather history service backed by a flat annual series
#[derive(Clone)]
pub struct WeatherHistoryService {
    path: PathBuf,
}

/// Column-oriented series for the weather chart.
#[derive(Debug, Serialize)]
pub struct WeatherChart {
    pub years: Vec<i32>,
    pub temp: Vec<f64>,
    pub rain: Vec<f64>,
    pub humidity: Vec<f64>,
}

impl WeatherHistoryService {
    pub fn new(path: &str) -> Self {
        Self {
            path: PathBuf::from(path),
        }
    }

    /// Newest rows of the series, most recent last as stored.
    pub async fn history(&self) -> AppResult<Vec<AnnualWeather>> {
        let mut rows = self.read_rows().await?;
        if rows.len() > HISTORY_ROWS {
            rows.drain(..rows.len() - HISTORY_ROWS);
        }
        Ok(rows)
    }

    /// Chart series over the newest rows, sorted by year ascending.
    pub async fn chart(&self) -> AppResult<WeatherChart> {
        let mut rows = self.read_rows().await?;
        if rows.len() > CHART_ROWS {
            rows.drain(..rows.len() - CHART_ROWS);
        }
        rows.sort_by_key(|row| row.year);

        Ok(WeatherChart {
            years: rows.iter().map(|r| r.year).collect(),
            temp: rows.iter().map(|r| r.temp_avg).collect(),
            rain: rows.iter().map(|r| r.rainfall_annual).collect(),
            humidity: rows.iter().map(|r| r.humidity_avg).collect(),
        })
    }

    async fn read_rows(&self) -> AppResult<Vec<AnnualWeather>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(AppError::NotFound("Weather data".to_string()))
            }
            Err(e) => {
                return Err(AppError::Internal(format!(
                    "read {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(bytes.as_slice());

        let mut rows = Vec::new();
        for record in reader.deserialize::<(i32, f64, f64, f64)>() {
            match record {
                Ok((year, temp_avg, rainfall_annual, humidity_avg)) => rows.push(AnnualWeather {
                    year,
                    temp_avg,
                    rainfall_annual,
                    humidity_avg,
                }),
                Err(e) => {
                    tracing::warn!(file = %self.path.display(), error = %e, "skipping weather row")
                }
            }
        }
        Ok(rows)
    }
}
