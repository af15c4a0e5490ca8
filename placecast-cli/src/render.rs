//! Terminal stand-ins for the map widget and the weather overlay.

use placecast_core::{
    Frame, MapSurface,
    map::{Camera, FlyTo, LngLat, MarkerId},
};

/// Prints camera moves and marker changes instead of drawing tiles.
#[derive(Debug, Default)]
pub struct TerminalMap {
    next_marker: u64,
}

impl MapSurface for TerminalMap {
    fn load(&mut self, camera: Camera) {
        println!("map | view {} at zoom {}", lng_lat(camera.center), camera.zoom);
    }

    fn fly_to(&mut self, flight: FlyTo) {
        println!(
            "map | flying to {} at zoom {} over {:.1}s",
            lng_lat(flight.center),
            flight.zoom,
            flight.duration.as_secs_f64()
        );
    }

    fn add_marker(&mut self, at: LngLat) -> MarkerId {
        self.next_marker += 1;
        println!("map | marker #{} at {}", self.next_marker, lng_lat(at));
        MarkerId(self.next_marker)
    }

    fn remove_marker(&mut self, marker: MarkerId) {
        println!("map | marker #{} removed", marker.0);
    }
}

fn lng_lat(at: LngLat) -> String {
    format!("{:.4}, {:.4}", at.latitude, at.longitude)
}

pub fn frame_lines(frame: &Frame) -> Vec<String> {
    match frame {
        Frame::Hidden => Vec::new(),
        Frame::Loading => vec!["Loading weather data...".to_string()],
        Frame::Error(message) => vec![format!("error: {message}")],
        Frame::Weather(overlay) => vec![
            overlay.location_name.clone(),
            format!("{}  ·  {}", overlay.clock.time, overlay.clock.date),
            format!("{} {}  {}", overlay.emoji, overlay.temperature, overlay.description),
            format!(
                "feels like {} · humidity {}% · wind {:.1} m/s",
                overlay.feels_like, overlay.humidity, overlay.wind_speed
            ),
        ],
    }
}

pub fn print_frame(frame: &Frame) {
    for line in frame_lines(frame) {
        println!("{line}");
    }
}

/// Display sink for live mode: prints a frame only when it differs from the last.
pub fn live_printer() -> impl FnMut(&Frame) + Send + 'static {
    let mut last: Option<Frame> = None;
    move |frame: &Frame| {
        if last.as_ref() == Some(frame) {
            return;
        }
        if !matches!(frame, Frame::Hidden) {
            println!();
        }
        print_frame(frame);
        last = Some(frame.clone());
    }
}
