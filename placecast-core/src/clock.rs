//! Local wall-clock derivation from a UTC offset.
//!
//! The offset comes from the active [`WeatherRecord`](crate::WeatherRecord);
//! the host's own timezone never takes part, since `Utc::now` carries no bias.

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use std::time;

use crate::model::LocalClock;

/// How often a live display recomputes the clock.
pub const TICK_INTERVAL: time::Duration = time::Duration::from_secs(1);

const DATE_FORMAT: &str = "%B %-d, %Y";
const TIME_FORMAT: &str = "%-I:%M %p";
const SHORT_TIME_FORMAT: &str = "%H:%M:%S";
const FULL_FORMAT: &str = "%b %-d, %Y, %-I:%M:%S %p";

/// Date and 12-hour time at a place `offset_seconds` east of UTC, right now.
pub fn local_date_time(offset_seconds: i32) -> LocalClock {
    local_date_time_at(Utc::now(), offset_seconds)
}

/// Same as [`local_date_time`] for an explicit instant.
pub fn local_date_time_at(now: DateTime<Utc>, offset_seconds: i32) -> LocalClock {
    let local = shift(now, offset_seconds);
    LocalClock {
        date: local.format(DATE_FORMAT).to_string(),
        time: local.format(TIME_FORMAT).to_string(),
    }
}

/// 24-hour `HH:MM:SS` at the given offset.
pub fn local_time_short(offset_seconds: i32) -> String {
    local_time_short_at(Utc::now(), offset_seconds)
}

pub fn local_time_short_at(now: DateTime<Utc>, offset_seconds: i32) -> String {
    shift(now, offset_seconds).format(SHORT_TIME_FORMAT).to_string()
}

/// Long form, e.g. `Jan 19, 2026, 3:45:00 PM`.
pub fn local_time_full(offset_seconds: i32) -> String {
    local_time_full_at(Utc::now(), offset_seconds)
}

pub fn local_time_full_at(now: DateTime<Utc>, offset_seconds: i32) -> String {
    shift(now, offset_seconds).format(FULL_FORMAT).to_string()
}

// Falls back to the unshifted instant at the edges of chrono's range.
fn shift(now: DateTime<Utc>, offset_seconds: i32) -> NaiveDateTime {
    let utc = now.naive_utc();
    utc.checked_add_signed(Duration::seconds(i64::from(offset_seconds)))
        .unwrap_or(utc)
}
