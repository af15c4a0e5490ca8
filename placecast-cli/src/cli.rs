use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode, Select};
use placecast_core::{
    Config, GeocoderResult, Location, MapRenderer, MapboxGeocoder, OpenWeatherClient, PlaceSearch,
    PlaceSelector, WeatherDisplay, Widget,
    config::{Secrets, Service},
    display::Frame,
};
use std::{fmt, sync::Arc};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use crate::render::{self, TerminalMap};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "placecast", version, about = "Weather and local time for any place")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the secrets for the weather and map services.
    Configure {
        /// Service to configure, "weather" or "map". Both when omitted.
        service: Option<String>,
    },

    /// Show current weather and local time for a place, then exit.
    Show {
        /// Place to search for. Uses the configured default location if absent.
        query: Option<String>,

        /// Take the best match instead of asking.
        #[arg(long)]
        first: bool,
    },

    /// Keep the overlay live; every line typed on stdin is a new search.
    Watch {
        /// Place to start at. Uses the configured default location if absent.
        query: Option<String>,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Command::Configure { service } => configure(service.as_deref()),
            Command::Show { query, first } => {
                let session = Session::start()?;
                let location = session.initial_location(query.as_deref(), !first).await?;
                session.show(location).await
            }
            Command::Watch { query } => {
                let session = Session::start()?;
                let location = session.initial_location(query.as_deref(), false).await?;
                session.watch(location).await
            }
        }
    }
}

fn configure(service: Option<&str>) -> Result<()> {
    let services = match service {
        Some(name) => vec![Service::try_from(name)?],
        None => Service::all().to_vec(),
    };

    // Only what is on disk is rewritten; environment overrides stay out of the file.
    let mut config = Config::load_file()?;

    for service in services {
        let secret = Password::new(&format!("{}:", service.secret_label()))
            .with_display_mode(PasswordDisplayMode::Masked)
            .without_confirmation()
            .prompt()
            .with_context(|| format!("Failed to read {}", service.secret_label()))?;

        config.upsert_api_key(service, secret.trim().to_string());
    }

    config.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

/// Everything built from a validated configuration.
struct Session {
    config: Config,
    weather: Arc<OpenWeatherClient>,
    geocoder: MapboxGeocoder,
}

impl Session {
    fn start() -> Result<Self> {
        let config = Config::load()?;
        let Secrets {
            weather_api_key,
            map_access_token,
        } = config.secrets()?;

        let weather = match config.base_url(Service::Weather) {
            Some(url) => OpenWeatherClient::with_base_url(weather_api_key, url)?,
            None => OpenWeatherClient::new(weather_api_key)?,
        };
        let geocoder = match config.base_url(Service::Map) {
            Some(url) => MapboxGeocoder::with_base_url(map_access_token, url)?,
            None => MapboxGeocoder::new(map_access_token)?,
        };

        Ok(Self {
            config,
            weather: Arc::new(weather),
            geocoder,
        })
    }

    async fn initial_location(&self, query: Option<&str>, ask: bool) -> Result<Location> {
        match query {
            Some(query) => self.resolve(query, ask).await,
            None => Ok(self.config.default_location()),
        }
    }

    async fn resolve(&self, query: &str, ask: bool) -> Result<Location> {
        let mut results = self.geocoder.search(query).await?;
        if results.is_empty() {
            return Err(anyhow!("No places found for '{query}'"));
        }

        let picked = if ask && results.len() > 1 {
            let options = results.into_iter().map(Suggestion).collect();
            Select::new("Which place?", options)
                .prompt()
                .context("No place selected")?
                .0
        } else {
            results.swap_remove(0)
        };

        Ok(picked.to_location())
    }

    async fn show(self, location: Location) -> Result<()> {
        let widget = Widget::mount(self.weather, location);
        let mut map = MapRenderer::mount(TerminalMap::default(), widget.subscribe());
        map.ready().await;

        let view = widget
            .subscribe()
            .wait_for(|v| !v.is_loading())
            .await
            .context("Widget stopped before the weather arrived")?
            .clone();

        // Let the map catch up before printing the overlay below it.
        tokio::task::yield_now().await;
        println!();
        render::print_frame(&Frame::from_view(&view, chrono::Utc::now()));
        map.unmount();
        Ok(())
    }

    async fn watch(self, location: Location) -> Result<()> {
        let widget = Widget::mount(self.weather.clone(), location);
        let selector = PlaceSelector::new();
        let attachment = widget.attach(selector.subscribe());

        let mut map = MapRenderer::mount(TerminalMap::default(), widget.subscribe());
        map.ready().await;
        let display = WeatherDisplay::mount(widget.subscribe(), render::live_printer());

        info!("type a place and press enter to search; Ctrl-C to quit");
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line.context("Failed to read from stdin")? else {
                        break;
                    };
                    self.search_and_select(&selector, &line).await;
                }
                _ = tokio::signal::ctrl_c() => break,
            }
        }

        display.unmount();
        map.unmount();
        attachment.unsubscribe();
        Ok(())
    }

    async fn search_and_select(&self, selector: &PlaceSelector, query: &str) {
        let query = query.trim();
        if query.is_empty() {
            return;
        }

        match self.geocoder.search(query).await {
            Ok(results) => match results.first() {
                Some(best) => {
                    selector.select(best);
                }
                None => println!("No places found for '{query}'"),
            },
            Err(err) => warn!(error = %err, query, "place search failed"),
        }
    }
}

/// A geocoder result as shown in the picker.
struct Suggestion(GeocoderResult);

impl fmt::Display for Suggestion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let subtitle = self.0.subtitle();
        if subtitle == self.0.place_name {
            f.write_str(&self.0.text)
        } else {
            write!(f, "{} ({})", self.0.text, subtitle)
        }
    }
}
