//! Weather overlay driver.
//!
//! Turns [`WidgetView`] snapshots into [`Frame`]s for a [`DisplaySink`] and,
//! while a weather record is active, re-renders once per [`TICK_INTERVAL`] so
//! the local clock keeps moving. The interval exists only while a record is
//! shown; unmounting stops everything.

use chrono::{DateTime, Utc};
use tokio::{
    sync::watch,
    time::{Instant, Interval, MissedTickBehavior, interval_at},
};
use tracing::trace;

use crate::{
    clock::{TICK_INTERVAL, local_date_time_at},
    model::LocalClock,
    provider::icon_url,
    subscription::Subscription,
    widget::WidgetView,
};

#[derive(Debug, Clone, PartialEq)]
pub struct WeatherOverlay {
    pub location_name: String,
    pub clock: LocalClock,
    pub emoji: &'static str,
    /// Rounded Celsius with a degree sign, e.g. `15°`.
    pub temperature: String,
    pub feels_like: String,
    pub description: String,
    pub humidity: u8,
    pub wind_speed: f64,
    pub icon_url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    /// Nothing to show.
    Hidden,
    Loading,
    Error(String),
    Weather(WeatherOverlay),
}

impl Frame {
    /// Loading wins over error, error over weather.
    pub fn from_view(view: &WidgetView, now: DateTime<Utc>) -> Self {
        if view.is_loading() {
            return Self::Loading;
        }
        if let Some(message) = view.error() {
            return Self::Error(message.to_string());
        }
        let Some(weather) = view.weather() else {
            return Self::Hidden;
        };

        Self::Weather(WeatherOverlay {
            location_name: view.location_name().unwrap_or_default().to_string(),
            clock: local_date_time_at(now, weather.timezone_offset_seconds),
            emoji: condition_emoji(&weather.description),
            temperature: format!("{}°", weather.temperature),
            feels_like: format!("{}°", weather.feels_like),
            description: weather.description.clone(),
            humidity: weather.humidity,
            wind_speed: weather.wind_speed,
            icon_url: icon_url(&weather.icon),
        })
    }
}

/// Picks an emoji for a free-text condition. First match wins.
pub fn condition_emoji(description: &str) -> &'static str {
    let desc = description.to_lowercase();
    let has = |words: &[&str]| words.iter().any(|w| desc.contains(w));

    if has(&["clear"]) {
        "☀️"
    } else if has(&["cloud"]) {
        "☁️"
    } else if has(&["rain", "drizzle"]) {
        "🌧️"
    } else if has(&["thunder", "storm"]) {
        "⛈️"
    } else if has(&["snow"]) {
        "❄️"
    } else if has(&["mist", "fog", "haze"]) {
        "🌫️"
    } else if has(&["wind"]) {
        "💨"
    } else {
        "🌤️"
    }
}

/// Where frames go.
pub trait DisplaySink: Send + 'static {
    fn render(&mut self, frame: &Frame);
}

impl<F> DisplaySink for F
where
    F: FnMut(&Frame) + Send + 'static,
{
    fn render(&mut self, frame: &Frame) {
        self(frame)
    }
}

#[derive(Debug)]
pub struct WeatherDisplay {
    subscription: Subscription,
}

impl WeatherDisplay {
    /// Renders the current view right away, then every change and clock tick.
    pub fn mount<D: DisplaySink>(mut views: watch::Receiver<WidgetView>, mut sink: D) -> Self {
        let task = tokio::spawn(async move {
            let mut view = views.borrow_and_update().clone();
            let mut ticker = clock_ticker(&view);
            sink.render(&Frame::from_view(&view, Utc::now()));

            loop {
                tokio::select! {
                    changed = views.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        view = views.borrow_and_update().clone();
                        ticker = clock_ticker(&view);
                    }
                    _ = next_tick(&mut ticker) => {
                        trace!("clock tick");
                    }
                }
                sink.render(&Frame::from_view(&view, Utc::now()));
            }
        });

        Self {
            subscription: Subscription::new(task),
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.subscription.is_active()
    }

    pub fn unmount(self) {
        self.subscription.unsubscribe();
    }
}

fn clock_ticker(view: &WidgetView) -> Option<Interval> {
    view.weather().map(|_| {
        let mut ticker = interval_at(Instant::now() + TICK_INTERVAL, TICK_INTERVAL);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        ticker
    })
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}
