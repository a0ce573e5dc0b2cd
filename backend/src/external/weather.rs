//! Weather API client for fetching current conditions
//!
//! Integrates with OpenWeatherMap, resolving a place name to current
//! conditions (metric units, Vietnamese descriptions).

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use shared::models::CurrentConditions;
use shared::round1;

/// All outbound calls share this timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Weather API client
#[derive(Clone)]
pub struct WeatherClient {
    client: Client,
    base_url: String,
    api_key: String,
}

/// OpenWeatherMap current-conditions response
#[derive(Debug, Deserialize)]
struct OwmCurrentResponse {
    name: String,
    main: OwmMain,
    weather: Vec<OwmWeather>,
    wind: OwmWind,
}

#[derive(Debug, Deserialize)]
struct OwmMain {
    temp: f64,
    humidity: i64,
}

#[derive(Debug, Deserialize)]
struct OwmWeather {
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwmWind {
    speed: f64,
}

impl WeatherClient {
    /// Create a new WeatherClient
    pub fn new(base_url: String, api_key: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
            api_key,
        }
    }

    /// Fetch current conditions by place name.
    ///
    /// An unknown place maps to `NotFound`; connection problems and
    /// timeouts surface as the weather service being unavailable.
    pub async fn current_by_city(&self, city: &str) -> AppResult<CurrentConditions> {
        let url = format!("{}/weather", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("q", city),
                ("appid", self.api_key.as_str()),
                ("units", "metric"),
                ("lang", "vi"),
            ])
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|_| AppError::WeatherServiceUnavailable)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(AppError::NotFound("City".to_string()));
        }
        if !response.status().is_success() {
            return Err(AppError::ExternalService(format!(
                "weather API returned {}",
                response.status()
            )));
        }

        let data: OwmCurrentResponse = response
            .json()
            .await
            .map_err(|e| AppError::ExternalService(format!("weather response: {}", e)))?;

        Ok(convert_current(data))
    }
}

/// Map the provider response onto our model; wind arrives in m/s and is
/// reported in km/h.
fn convert_current(data: OwmCurrentResponse) -> CurrentConditions {
    let weather = data.weather.first();
    CurrentConditions {
        name: data.name,
        temperature_celsius: data.main.temp,
        humidity_percent: data.main.humidity,
        wind_speed_kmh: round1(data.wind.speed * 3.6),
        description: weather.map(|w| w.description.clone()).unwrap_or_default(),
        icon: weather.map(|w| w.icon.clone()).unwrap_or_default(),
    }
}
