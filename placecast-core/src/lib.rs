//! Core library for the `placecast` widget.
//!
//! This crate defines:
//! - The location/weather state machine ([`Widget`])
//! - Weather lookup, place search and map surface abstractions
//! - Local clock derivation and the live weather overlay
//! - Configuration & credentials handling
//!
//! It is used by `placecast-cli`, but any front end that can provide a
//! [`MapSurface`] and a [`DisplaySink`] can drive it.

pub mod clock;
pub mod config;
pub mod display;
pub mod map;
pub mod model;
pub mod places;
pub mod provider;
pub mod subscription;
pub mod widget;

#[cfg(test)]
mod testing;

pub use config::Config;
pub use display::{DisplaySink, Frame, WeatherDisplay, WeatherOverlay};
pub use map::{MapRenderer, MapSurface};
pub use model::{FetchState, LocalClock, Location, WeatherRecord};
pub use places::{GeocoderResult, MapboxGeocoder, PlaceSearch, PlaceSelector};
pub use provider::{OpenWeatherClient, WeatherError, WeatherLookup};
pub use subscription::Subscription;
pub use widget::{Widget, WidgetView};
