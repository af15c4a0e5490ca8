use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use crate::model::WeatherRecord;

use super::{WeatherError, WeatherLookup};

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const UNKNOWN_DESCRIPTION: &str = "Unknown";
const DEFAULT_ICON: &str = "01d";

/// Current-conditions client for the OpenWeather `/weather` endpoint.
#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherClient {
    pub fn new(api_key: String) -> Result<Self> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(api_key: String, base_url: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build HTTP client for OpenWeather")?;

        Ok(Self {
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    async fn fetch_current(&self, latitude: f64, longitude: f64) -> Result<OwCurrentResponse, WeatherError> {
        let url = format!("{}/weather", self.base_url);
        debug!(latitude, longitude, "requesting current weather");

        let res = self
            .http
            .get(&url)
            .query(&[
                ("lat", latitude.to_string()),
                ("lon", longitude.to_string()),
                ("appid", self.api_key.clone()),
                ("units", "metric".to_string()),
            ])
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "OpenWeather request failed");
                WeatherError::transient(e)
            })?;

        let status = res.status();
        let body = res.text().await.map_err(|e| {
            warn!(error = %e, "Failed to read OpenWeather response body");
            WeatherError::transient(e)
        })?;

        match status {
            StatusCode::UNAUTHORIZED => {
                warn!("OpenWeather rejected the API key");
                return Err(WeatherError::InvalidCredentials);
            }
            StatusCode::NOT_FOUND => {
                warn!(latitude, longitude, "OpenWeather has no data for location");
                return Err(WeatherError::LocationNotFound);
            }
            s if !s.is_success() => {
                warn!(status = %s, body = %truncate_body(&body), "OpenWeather request failed");
                return Err(WeatherError::transient(format!("status {s}")));
            }
            _ => {}
        }

        serde_json::from_str(&body).map_err(|e| {
            warn!(error = %e, "Failed to parse OpenWeather current JSON");
            WeatherError::transient(e)
        })
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    feels_like: f64,
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    main: OwMain,
    #[serde(default)]
    weather: Vec<OwWeather>,
    wind: OwWind,
    timezone: i32,
}

impl From<OwCurrentResponse> for WeatherRecord {
    fn from(parsed: OwCurrentResponse) -> Self {
        let first = parsed.weather.into_iter().next();

        let description = first
            .as_ref()
            .map(|w| w.description.clone())
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| UNKNOWN_DESCRIPTION.to_string());
        let icon = first
            .map(|w| w.icon)
            .filter(|i| !i.is_empty())
            .unwrap_or_else(|| DEFAULT_ICON.to_string());

        WeatherRecord {
            temperature: round_half_up(parsed.main.temp),
            feels_like: round_half_up(parsed.main.feels_like),
            description,
            icon,
            humidity: parsed.main.humidity,
            wind_speed: parsed.wind.speed,
            timezone_offset_seconds: parsed.timezone,
        }
    }
}

#[async_trait]
impl WeatherLookup for OpenWeatherClient {
    async fn fetch_weather(&self, latitude: f64, longitude: f64) -> Result<WeatherRecord, WeatherError> {
        self.fetch_current(latitude, longitude).await.map(WeatherRecord::from)
    }
}

// Halves round toward positive infinity: -2.5 becomes -2.
fn round_half_up(value: f64) -> i32 {
    (value + 0.5).floor() as i32
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path, query_param},
    };

    fn paris_body() -> serde_json::Value {
        json!({
            "coord": { "lon": 2.3522, "lat": 48.8566 },
            "weather": [{ "id": 800, "main": "Clear", "description": "clear sky", "icon": "01d" }],
            "main": {
                "temp": 15.4, "feels_like": 14.1, "temp_min": 13.0,
                "temp_max": 17.0, "pressure": 1015, "humidity": 60
            },
            "wind": { "speed": 3.2, "deg": 200 },
            "timezone": 3600,
            "name": "Paris"
        })
    }

    fn client_for(server: &MockServer) -> OpenWeatherClient {
        OpenWeatherClient::with_base_url("KEY".to_string(), server.uri()).expect("client")
    }

    async fn respond_with(status: u16) -> Result<WeatherRecord, WeatherError> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(ResponseTemplate::new(status).set_body_string("{\"message\":\"nope\"}"))
            .mount(&server)
            .await;
        client_for(&server).fetch_weather(0.0, 0.0).await
    }

    #[tokio::test]
    async fn normalizes_successful_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/weather"))
            .and(query_param("lat", "48.8566"))
            .and(query_param("lon", "2.3522"))
            .and(query_param("appid", "KEY"))
            .and(query_param("units", "metric"))
            .respond_with(ResponseTemplate::new(200).set_body_json(paris_body()))
            .expect(1)
            .mount(&server)
            .await;

        let record = client_for(&server)
            .fetch_weather(48.8566, 2.3522)
            .await
            .expect("weather");

        assert_eq!(record.temperature, 15);
        assert_eq!(record.feels_like, 14);
        assert_eq!(record.description, "clear sky");
        assert_eq!(record.icon, "01d");
        assert_eq!(record.humidity, 60);
        assert!((record.wind_speed - 3.2).abs() < f64::EPSILON);
        assert_eq!(record.timezone_offset_seconds, 3600);
    }

    #[tokio::test]
    async fn empty_weather_array_uses_placeholders() {
        let server = MockServer::start().await;
        let mut body = paris_body();
        body["weather"] = json!([]);
        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let record = client_for(&server).fetch_weather(1.0, 1.0).await.expect("weather");
        assert_eq!(record.description, "Unknown");
        assert_eq!(record.icon, "01d");
    }

    #[tokio::test]
    async fn unauthorized_maps_to_invalid_credentials() {
        assert!(matches!(respond_with(401).await, Err(WeatherError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn not_found_maps_to_location_not_found() {
        assert!(matches!(respond_with(404).await, Err(WeatherError::LocationNotFound)));
    }

    #[tokio::test]
    async fn other_statuses_are_transient() {
        for status in [400, 429, 500, 503] {
            assert!(
                matches!(respond_with(status).await, Err(WeatherError::TransientFetchFailure(_))),
                "status {status}"
            );
        }
    }

    #[tokio::test]
    async fn malformed_body_is_transient() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = client_for(&server).fetch_weather(1.0, 1.0).await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to fetch weather data. Please try again.");
    }

    #[tokio::test]
    async fn unreachable_server_is_transient() {
        let client = OpenWeatherClient::with_base_url("KEY".to_string(), "http://127.0.0.1:1").expect("client");
        let err = client.fetch_weather(1.0, 1.0).await.unwrap_err();
        assert!(matches!(err, WeatherError::TransientFetchFailure(_)));
    }

    #[tokio::test]
    async fn every_call_hits_the_network() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(ResponseTemplate::new(200).set_body_json(paris_body()))
            .expect(2)
            .mount(&server)
            .await;

        let client = client_for(&server);
        client.fetch_weather(48.8566, 2.3522).await.expect("first");
        client.fetch_weather(48.8566, 2.3522).await.expect("second");
    }

    #[test]
    fn rounding_is_half_up() {
        assert_eq!(round_half_up(15.4), 15);
        assert_eq!(round_half_up(14.5), 15);
        assert_eq!(round_half_up(-2.5), -2);
        assert_eq!(round_half_up(-2.6), -3);
    }

    #[test]
    fn truncate_body_respects_char_boundaries() {
        let long = "é".repeat(300);
        let cut = truncate_body(&long);
        assert!(cut.ends_with("..."));
        assert_eq!(cut.chars().count(), 203);
    }
}
