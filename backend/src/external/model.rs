//! Pre-trained yield regression model
//!
//! The regressor is trained offline on historical weather and yield
//! series and exported as a JSON coefficient file. This loader treats it
//! as an opaque function from a weather triple to an estimated yield.

use serde::Deserialize;

use shared::round2;

/// Linear regression coefficients exported by the training pipeline.
#[derive(Debug, Clone, Deserialize)]
pub struct YieldModel {
    intercept: f64,
    /// Weights for temperature, rainfall and humidity, in that order.
    coefficients: [f64; 3],
}

impl YieldModel {
    /// Load the exported model. A missing or malformed file leaves the
    /// predictor unavailable; the caller decides how to surface that.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let model: YieldModel = serde_json::from_str(&text)?;
        Ok(model)
    }

    /// Predict yield (tons/ha) from average temperature (°C), annual
    /// rainfall (mm) and average humidity (%).
    pub fn predict(&self, temperature: f64, rainfall: f64, humidity: f64) -> f64 {
        let raw = self.intercept
            + self.coefficients[0] * temperature
            + self.coefficients[1] * rainfall
            + self.coefficients[2] * humidity;
        round2(raw)
    }
}
