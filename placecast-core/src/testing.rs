//! Test doubles shared by the module tests.

use async_trait::async_trait;
use std::{
    collections::{HashMap, VecDeque},
    sync::Mutex,
};
use tokio::sync::oneshot;

use crate::{
    model::WeatherRecord,
    provider::{WeatherError, WeatherLookup},
};

type Outcome = Result<WeatherRecord, WeatherError>;

/// A lookup whose answers are released by hand, queued per latitude.
#[derive(Debug, Default)]
pub(crate) struct GatedLookup {
    gates: Mutex<HashMap<u64, VecDeque<oneshot::Receiver<Outcome>>>>,
}

impl GatedLookup {
    /// Queues a pending answer for the next fetch at `latitude`.
    pub(crate) fn gate(&self, latitude: f64) -> oneshot::Sender<Outcome> {
        let (tx, rx) = oneshot::channel();
        self.gates
            .lock()
            .unwrap()
            .entry(latitude.to_bits())
            .or_default()
            .push_back(rx);
        tx
    }
}

#[async_trait]
impl WeatherLookup for GatedLookup {
    async fn fetch_weather(&self, latitude: f64, _longitude: f64) -> Outcome {
        let gate = self
            .gates
            .lock()
            .unwrap()
            .get_mut(&latitude.to_bits())
            .and_then(VecDeque::pop_front);
        match gate {
            Some(rx) => rx
                .await
                .unwrap_or_else(|_| Err(WeatherError::transient("gate dropped"))),
            None => Err(WeatherError::transient("no gate registered")),
        }
    }
}

/// Always answers with the same record.
#[derive(Debug)]
pub(crate) struct FixedLookup(pub(crate) WeatherRecord);

#[async_trait]
impl WeatherLookup for FixedLookup {
    async fn fetch_weather(&self, _latitude: f64, _longitude: f64) -> Outcome {
        Ok(self.0.clone())
    }
}

pub(crate) fn record(temperature: i32, description: &str, offset: i32) -> WeatherRecord {
    WeatherRecord {
        temperature,
        feels_like: temperature - 1,
        description: description.to_string(),
        icon: "01d".to_string(),
        humidity: 50,
        wind_speed: 2.0,
        timezone_offset_seconds: offset,
    }
}
