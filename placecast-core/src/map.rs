//! Map projection of the current location.
//!
//! The renderer owns its [`MapSurface`] for as long as it is mounted and is the
//! only thing that moves the camera or touches markers. It listens to the
//! widget's view and never writes back.

use std::time::Duration;
use tokio::sync::{oneshot, watch};
use tracing::debug;

use crate::{model::Location, subscription::Subscription, widget::WidgetView};

/// Default camera when there is nothing to show yet.
pub const WORLD_CENTER: LngLat = LngLat {
    longitude: 0.0,
    latitude: 20.0,
};
pub const WORLD_ZOOM: f64 = 2.0;
pub const STREET_ZOOM: f64 = 14.0;
pub const FLY_DURATION: Duration = Duration::from_millis(2000);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LngLat {
    pub longitude: f64,
    pub latitude: f64,
}

impl From<&Location> for LngLat {
    fn from(location: &Location) -> Self {
        Self {
            longitude: location.longitude,
            latitude: location.latitude,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub center: LngLat,
    pub zoom: f64,
}

impl Camera {
    pub fn world() -> Self {
        Self {
            center: WORLD_CENTER,
            zoom: WORLD_ZOOM,
        }
    }

    pub fn street(center: LngLat) -> Self {
        Self {
            center,
            zoom: STREET_ZOOM,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlyTo {
    pub center: LngLat,
    pub zoom: f64,
    pub duration: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MarkerId(pub u64);

/// The mapping capability. Implementations release their resources on drop.
pub trait MapSurface: Send + 'static {
    /// Creates the map with its initial camera. Called once.
    fn load(&mut self, camera: Camera);
    fn fly_to(&mut self, flight: FlyTo);
    fn add_marker(&mut self, at: LngLat) -> MarkerId;
    fn remove_marker(&mut self, marker: MarkerId);
}

struct Projection<S> {
    surface: S,
    marker: Option<MarkerId>,
    shown: u64,
}

impl<S: MapSurface> Projection<S> {
    fn place_marker(&mut self, at: LngLat) {
        if let Some(old) = self.marker.take() {
            self.surface.remove_marker(old);
        }
        self.marker = Some(self.surface.add_marker(at));
    }

    fn follow(&mut self, selection: u64, location: Option<&Location>) {
        if selection == self.shown {
            return;
        }
        self.shown = selection;

        let Some(location) = location else {
            return;
        };
        let center = LngLat::from(location);
        debug!(place = %location.name, "flying map to new location");

        self.surface.fly_to(FlyTo {
            center,
            zoom: STREET_ZOOM,
            duration: FLY_DURATION,
        });
        self.place_marker(center);
    }
}

#[derive(Debug)]
pub struct MapRenderer {
    ready: Option<oneshot::Receiver<()>>,
    loaded: bool,
    subscription: Subscription,
}

impl MapRenderer {
    /// Loads `surface` at the view's current location (or the world view) and
    /// keeps it following location changes until unmounted.
    pub fn mount<S: MapSurface>(surface: S, mut views: watch::Receiver<WidgetView>) -> Self {
        let (ready_tx, ready_rx) = oneshot::channel();

        let task = tokio::spawn(async move {
            let (selection, initial) = {
                let view = views.borrow_and_update();
                (view.selection, view.location.clone())
            };

            let mut map = Projection {
                surface,
                marker: None,
                shown: selection,
            };

            let camera = initial
                .as_ref()
                .map_or_else(Camera::world, |l| Camera::street(l.into()));
            map.surface.load(camera);
            let _ = ready_tx.send(());

            if let Some(location) = &initial {
                map.place_marker(location.into());
            }

            while views.changed().await.is_ok() {
                let (selection, location) = {
                    let view = views.borrow_and_update();
                    (view.selection, view.location.clone())
                };
                map.follow(selection, location.as_ref());
            }
        });

        Self {
            ready: Some(ready_rx),
            loaded: false,
            subscription: Subscription::new(task),
        }
    }

    /// Resolves once the surface has loaded. Returns false if the map was torn
    /// down before that happened.
    pub async fn ready(&mut self) -> bool {
        if let Some(rx) = self.ready.take() {
            self.loaded = rx.await.is_ok();
        }
        self.loaded
    }

    pub fn is_mounted(&self) -> bool {
        self.subscription.is_active()
    }

    /// Stops following the widget and releases the surface.
    pub fn unmount(self) {
        self.subscription.unsubscribe();
    }
}
