//! Weather observation models

use serde::{Deserialize, Serialize};

/// Current conditions for a place, as resolved by the weather service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentConditions {
    /// Resolved place name.
    pub name: String,
    pub temperature_celsius: f64,
    pub humidity_percent: i64,
    /// Wind speed converted to km/h, rounded to one decimal.
    pub wind_speed_kmh: f64,
    pub description: String,
    pub icon: String,
}

/// One row of the annual historical weather series.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AnnualWeather {
    pub year: i32,
    pub temp_avg: f64,
    pub rainfall_annual: f64,
    pub humidity_avg: f64,
}
