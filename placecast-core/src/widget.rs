//! The widget orchestrator: single owner of the current location and fetch state.
//!
//! Every selection takes a new ticket. A fetch result is applied only while its
//! ticket is still the current one, so a slow answer for an earlier place can
//! never overwrite the state of a later one.

use std::sync::Arc;
use tokio::{
    sync::{
        broadcast::{self, error::RecvError},
        watch,
    },
    task::JoinHandle,
};
use tracing::{debug, info, warn};

use crate::{
    model::{FetchState, Location, WeatherRecord},
    provider::WeatherLookup,
    subscription::Subscription,
};

/// Read-only projection of the widget published to the map and display.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WidgetView {
    /// Ticket of the current selection; 0 before the first one.
    pub selection: u64,
    pub location: Option<Location>,
    pub fetch: FetchState,
}

impl WidgetView {
    pub fn location_name(&self) -> Option<&str> {
        self.location.as_ref().map(|l| l.name.as_str())
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.fetch, FetchState::Loading)
    }

    pub fn weather(&self) -> Option<&WeatherRecord> {
        match &self.fetch {
            FetchState::Success(record) => Some(record),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.fetch {
            FetchState::Failure(message) => Some(message),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Widget {
    state: Arc<watch::Sender<WidgetView>>,
    weather: Arc<dyn WeatherLookup>,
}

impl Widget {
    /// An idle widget with no location yet.
    pub fn new(weather: Arc<dyn WeatherLookup>) -> Self {
        let (state, _) = watch::channel(WidgetView::default());
        Self {
            state: Arc::new(state),
            weather,
        }
    }

    /// A widget that has already selected `default_location`.
    pub fn mount(weather: Arc<dyn WeatherLookup>, default_location: Location) -> Self {
        let widget = Self::new(weather);
        info!(place = %default_location.name, "mounting widget at default location");
        widget.select_location(default_location);
        widget
    }

    pub fn view(&self) -> WidgetView {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<WidgetView> {
        self.state.subscribe()
    }

    /// Adopts `location`, clears weather and error, and starts its fetch.
    ///
    /// The returned handle completes once the fetch has been applied or discarded.
    pub fn select_location(&self, location: Location) -> JoinHandle<()> {
        let (latitude, longitude) = (location.latitude, location.longitude);
        let mut ticket = 0;

        self.state.send_modify(|view| {
            view.selection += 1;
            ticket = view.selection;
            debug!(ticket, place = %location.name, "location selected");
            view.location = Some(location);
            view.fetch = FetchState::Loading;
        });

        let state = Arc::clone(&self.state);
        let weather = Arc::clone(&self.weather);

        tokio::spawn(async move {
            let outcome = weather.fetch_weather(latitude, longitude).await;

            state.send_if_modified(|view| {
                if view.selection != ticket {
                    debug!(ticket, current = view.selection, "discarding stale weather result");
                    return false;
                }

                view.fetch = match outcome {
                    Ok(record) => FetchState::Success(record),
                    Err(err) => FetchState::Failure(err.to_string()),
                };
                true
            });
        })
    }

    /// Feeds every selection from `selections` into [`Widget::select_location`].
    pub fn attach(&self, mut selections: broadcast::Receiver<Location>) -> Subscription {
        let widget = self.clone();

        Subscription::new(tokio::spawn(async move {
            loop {
                match selections.recv().await {
                    Ok(location) => {
                        widget.select_location(location);
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "selection listener fell behind");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }))
    }
}
