use serde::{Deserialize, Serialize};

/// A place the widget can show, as selected by the user or injected as default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    pub name: String,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64, name: impl Into<String>) -> Self {
        Self {
            latitude,
            longitude,
            name: name.into(),
        }
    }

    /// Built-in default: Microsoft Campus, Redmond.
    pub fn redmond_campus() -> Self {
        Self::new(47.6423, -122.1390, "Microsoft Campus, Redmond, WA, USA")
    }
}

/// Normalized current conditions for one location.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherRecord {
    /// Degrees Celsius, rounded.
    pub temperature: i32,
    pub feels_like: i32,
    pub description: String,
    pub icon: String,
    /// Relative humidity in percent.
    pub humidity: u8,
    /// Metres per second.
    pub wind_speed: f64,
    /// Seconds east of UTC.
    pub timezone_offset_seconds: i32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum FetchState {
    #[default]
    Idle,
    Loading,
    Success(WeatherRecord),
    Failure(String),
}

/// Wall-clock projection of "now" at a location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalClock {
    pub date: String,
    pub time: String,
}
