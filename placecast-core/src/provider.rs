use async_trait::async_trait;
use std::fmt::Debug;
use thiserror::Error;

use crate::model::WeatherRecord;

pub mod openweather;

pub use openweather::OpenWeatherClient;

/// Classified weather lookup failure. The display text is what the user sees.
#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("Invalid API key. Please check your OpenWeatherMap API key.")]
    InvalidCredentials,

    #[error("Location not found.")]
    LocationNotFound,

    /// Any other transport, server or decoding failure. The cause is kept for logs only.
    #[error("Failed to fetch weather data. Please try again.")]
    TransientFetchFailure(String),
}

impl WeatherError {
    pub fn transient(cause: impl ToString) -> Self {
        Self::TransientFetchFailure(cause.to_string())
    }
}

#[async_trait]
pub trait WeatherLookup: Send + Sync + Debug {
    /// One independent fetch of current conditions; no caching, no retry.
    async fn fetch_weather(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<WeatherRecord, WeatherError>;
}

/// URL of the 2x PNG for an OpenWeather icon code.
pub fn icon_url(icon: &str) -> String {
    format!("https://openweathermap.org/img/wn/{icon}@2x.png")
}
