//! Place resolution: turns geocoder results into [`Location`]s.
//!
//! [`PlaceSearch`] is the search capability (free text in, ranked suggestions
//! out) and [`PlaceSelector`] is where a chosen suggestion becomes a selection
//! event. Neither decides what happens after a selection.

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use std::{fmt::Debug, time::Duration};
use tokio::sync::broadcast;
use tracing::debug;

use crate::model::Location;

pub const DEFAULT_GEOCODING_BASE_URL: &str = "https://api.mapbox.com";
const PLACE_TYPES: &str = "country,region,place,postcode,locality,neighborhood";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const SELECTION_CAPACITY: usize = 16;

/// One ranked suggestion as emitted by the geocoder.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GeocoderResult {
    /// `[longitude, latitude]`.
    pub center: [f64; 2],
    pub place_name: String,
    pub text: String,
}

impl GeocoderResult {
    pub fn to_location(&self) -> Location {
        let [longitude, latitude] = self.center;
        Location::new(latitude, longitude, self.place_name.clone())
    }

    /// The place name with the first `"{text}, "` removed, for a suggestion's second line.
    pub fn subtitle(&self) -> String {
        self.place_name.replacen(&format!("{}, ", self.text), "", 1)
    }
}

impl From<GeocoderResult> for Location {
    fn from(result: GeocoderResult) -> Self {
        result.to_location()
    }
}

#[async_trait]
pub trait PlaceSearch: Send + Sync + Debug {
    async fn search(&self, query: &str) -> Result<Vec<GeocoderResult>>;
}

/// Mapbox forward geocoding.
#[derive(Debug, Clone)]
pub struct MapboxGeocoder {
    access_token: String,
    base_url: String,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    #[serde(default)]
    features: Vec<GeocoderResult>,
}

impl MapboxGeocoder {
    pub fn new(access_token: String) -> Result<Self> {
        Self::with_base_url(access_token, DEFAULT_GEOCODING_BASE_URL)
    }

    pub fn with_base_url(access_token: String, base_url: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build HTTP client for Mapbox")?;

        Ok(Self {
            access_token,
            base_url: base_url.into(),
            http,
        })
    }

    fn search_url(&self, query: &str) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .with_context(|| format!("Invalid geocoding base URL: {}", self.base_url))?;

        let file = format!("{query}.json");
        url.path_segments_mut()
            .map_err(|_| anyhow!("Geocoding base URL cannot carry a path: {}", self.base_url))?
            .pop_if_empty()
            .extend(["geocoding", "v5", "mapbox.places", file.as_str()]);

        Ok(url)
    }
}

#[async_trait]
impl PlaceSearch for MapboxGeocoder {
    async fn search(&self, query: &str) -> Result<Vec<GeocoderResult>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let url = self.search_url(query)?;
        debug!(query, "geocoding place");

        let res = self
            .http
            .get(url)
            .query(&[
                ("access_token", self.access_token.as_str()),
                ("types", PLACE_TYPES),
            ])
            .send()
            .await
            .context("Failed to send request to Mapbox geocoding")?;

        let status = res.status();
        if !status.is_success() {
            return Err(anyhow!("Mapbox geocoding request failed with status {status}"));
        }

        let parsed: FeatureCollection = res
            .json()
            .await
            .context("Failed to parse Mapbox geocoding JSON")?;

        debug!(query, results = parsed.features.len(), "geocoding finished");
        Ok(parsed.features)
    }
}

/// Source of selection events. Every selection reaches every subscriber once.
#[derive(Debug, Clone)]
pub struct PlaceSelector {
    tx: broadcast::Sender<Location>,
}

impl PlaceSelector {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(SELECTION_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Location> {
        self.tx.subscribe()
    }

    /// Emits the location for `result` and returns it.
    pub fn select(&self, result: &GeocoderResult) -> Location {
        let location = result.to_location();
        if self.tx.send(location.clone()).is_err() {
            debug!(place = %location.name, "selection made with no subscribers");
        }
        location
    }
}

impl Default for PlaceSelector {
    fn default() -> Self {
        Self::new()
    }
}
