use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fmt, fs, path::PathBuf};

use crate::model::Location;

/// The two remote services that need a secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Service {
    /// OpenWeather current conditions.
    Weather,
    /// Mapbox geocoding and map tiles.
    Map,
}

impl Service {
    pub fn as_str(&self) -> &'static str {
        match self {
            Service::Weather => "weather",
            Service::Map => "map",
        }
    }

    /// Environment variable that overrides the stored secret.
    pub fn env_var(&self) -> &'static str {
        match self {
            Service::Weather => "OPENWEATHER_API_KEY",
            Service::Map => "MAPBOX_ACCESS_TOKEN",
        }
    }

    pub fn secret_label(&self) -> &'static str {
        match self {
            Service::Weather => "OpenWeatherMap API key",
            Service::Map => "Mapbox access token",
        }
    }

    pub const fn all() -> &'static [Service] {
        &[Service::Weather, Service::Map]
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Service {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "weather" | "openweather" => Ok(Service::Weather),
            "map" | "mapbox" => Ok(Service::Map),
            _ => Err(anyhow!("Unknown service '{value}'. Supported services: weather, map.")),
        }
    }
}

/// Credentials and endpoint for a single service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub api_key: String,

    /// Overrides the public endpoint, e.g. for a proxy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// [weather]
/// api_key = "..."
///
/// [map]
/// api_key = "..."
///
/// [default_location]
/// latitude = 48.8566
/// longitude = 2.3522
/// name = "Paris, France"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weather: Option<ServiceConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map: Option<ServiceConfig>,

    /// Where the widget starts. Falls back to [`Location::redmond_campus`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_location: Option<Location>,
}

/// Both secrets, checked to be present.
#[derive(Debug, Clone)]
pub struct Secrets {
    pub weather_api_key: String,
    pub map_access_token: String,
}

impl Config {
    /// Load config from disk (empty if missing), then apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut cfg = Self::load_file()?;
        cfg.apply_overrides(|name| std::env::var(name).ok());
        Ok(cfg)
    }

    /// Load only what is stored on disk.
    pub fn load_file() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("Invalid configuration TOML")
    }

    /// Replace stored secrets with non-empty values returned by `lookup`.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        for &service in Service::all() {
            if let Some(value) = lookup(service.env_var()).filter(|v| !v.trim().is_empty()) {
                self.service_mut(service).api_key = value.trim().to_string();
            }
        }
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "placecast", "placecast")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    pub fn service(&self, service: Service) -> Option<&ServiceConfig> {
        match service {
            Service::Weather => self.weather.as_ref(),
            Service::Map => self.map.as_ref(),
        }
    }

    fn service_mut(&mut self, service: Service) -> &mut ServiceConfig {
        let slot = match service {
            Service::Weather => &mut self.weather,
            Service::Map => &mut self.map,
        };
        slot.get_or_insert_with(ServiceConfig::default)
    }

    /// Set or replace the secret for a service, keeping any base URL override.
    pub fn upsert_api_key(&mut self, service: Service, api_key: String) {
        self.service_mut(service).api_key = api_key;
    }

    /// Returns the secret for a service, if present and non-empty.
    pub fn api_key(&self, service: Service) -> Option<&str> {
        self.service(service)
            .map(|cfg| cfg.api_key.trim())
            .filter(|key| !key.is_empty())
    }

    pub fn base_url(&self, service: Service) -> Option<&str> {
        self.service(service).and_then(|cfg| cfg.base_url.as_deref())
    }

    pub fn is_configured(&self, service: Service) -> bool {
        self.api_key(service).is_some()
    }

    /// Both secrets, or an error naming every missing one.
    pub fn secrets(&self) -> Result<Secrets> {
        let missing: Vec<_> = Service::all()
            .iter()
            .filter(|s| !self.is_configured(**s))
            .map(|s| format!("{} (set {} or run `placecast configure {s}`)", s.secret_label(), s.env_var()))
            .collect();

        match (self.api_key(Service::Weather), self.api_key(Service::Map)) {
            (Some(weather), Some(map)) => Ok(Secrets {
                weather_api_key: weather.to_string(),
                map_access_token: map.to_string(),
            }),
            _ => Err(anyhow!(
                "Missing configuration:\n  - {}\n\
                 Hint: run `placecast configure` to store both secrets.",
                missing.join("\n  - ")
            )),
        }
    }

    pub fn default_location(&self) -> Location {
        self.default_location
            .clone()
            .unwrap_or_else(Location::redmond_campus)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |name| {
            pairs
                .iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn service_as_str_roundtrip() {
        for service in Service::all() {
            let parsed = Service::try_from(service.as_str()).expect("roundtrip should succeed");
            assert_eq!(*service, parsed);
        }
        assert_eq!(Service::try_from("Mapbox").unwrap(), Service::Map);
    }

    #[test]
    fn unknown_service_error() {
        let err = Service::try_from("doesnotexist").unwrap_err();
        assert!(err.to_string().contains("Unknown service"));
    }

    #[test]
    fn secrets_error_names_every_missing_secret() {
        let err = Config::default().secrets().unwrap_err().to_string();
        assert!(err.contains("OpenWeatherMap API key"));
        assert!(err.contains("MAPBOX_ACCESS_TOKEN"));
        assert!(err.contains("Hint: run `placecast configure`"));
    }

    #[test]
    fn blank_secret_counts_as_missing() {
        let mut cfg = Config::default();
        cfg.upsert_api_key(Service::Weather, "   ".into());
        cfg.upsert_api_key(Service::Map, "TOKEN".into());

        assert!(!cfg.is_configured(Service::Weather));
        let err = cfg.secrets().unwrap_err().to_string();
        assert!(err.contains("OPENWEATHER_API_KEY"));
        assert!(!err.contains("Mapbox access token"));
    }

    #[test]
    fn secrets_when_both_present() {
        let mut cfg = Config::default();
        cfg.upsert_api_key(Service::Weather, "OPEN_KEY".into());
        cfg.upsert_api_key(Service::Map, "MAP_TOKEN".into());

        let secrets = cfg.secrets().expect("both configured");
        assert_eq!(secrets.weather_api_key, "OPEN_KEY");
        assert_eq!(secrets.map_access_token, "MAP_TOKEN");
    }

    #[test]
    fn environment_overrides_file_values() {
        let mut cfg = Config::from_toml(
            r#"
            [weather]
            api_key = "FROM_FILE"
            base_url = "http://localhost:9000"
            "#,
        )
        .unwrap();

        cfg.apply_overrides(env(&[("OPENWEATHER_API_KEY", "FROM_ENV"), ("MAPBOX_ACCESS_TOKEN", "")]));

        assert_eq!(cfg.api_key(Service::Weather), Some("FROM_ENV"));
        assert_eq!(cfg.base_url(Service::Weather), Some("http://localhost:9000"));
        assert_eq!(cfg.api_key(Service::Map), None);
    }

    #[test]
    fn default_location_is_injectable() {
        assert_eq!(Config::default().default_location(), Location::redmond_campus());

        let cfg = Config::from_toml(
            r#"
            [default_location]
            latitude = 48.8566
            longitude = 2.3522
            name = "Paris, France"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.default_location().name, "Paris, France");
    }

    #[test]
    fn toml_roundtrip_keeps_secrets() {
        let mut cfg = Config::default();
        cfg.upsert_api_key(Service::Map, "MAP_TOKEN".into());

        let text = toml::to_string_pretty(&cfg).unwrap();
        let back = Config::from_toml(&text).unwrap();
        assert_eq!(back.api_key(Service::Map), Some("MAP_TOKEN"));
        assert!(back.weather.is_none());
    }
}
