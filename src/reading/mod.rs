//! Records produced by ingestion: station metadata, daily telemetry and decoded forecasts.

pub mod daily;
pub mod forecast;
pub mod station;

use chrono::NaiveDate;

pub use daily::{pivot_station_data, DailyRow, Element, StationData};
pub use forecast::{ForecastListing, ForecastRecord};
pub use station::Station;

/// A dated record keyed by a station or region identifier.
pub trait Reading {
    fn date(&self) -> NaiveDate;
    /// Secondary sort key and, with the date, the dedupe key.
    fn key(&self) -> (String, String);
}

/// Latest date across `readings`, used to resume incremental fetches.
pub fn latest_date<R: Reading>(readings: &[R]) -> Option<NaiveDate> {
    readings.iter().map(Reading::date).max()
}

/// Appends `new` to `existing`, keeping the first record seen for each
/// (date, key), then sorts by date and key.
pub fn merge<R: Reading>(existing: Vec<R>, new: Vec<R>) -> Vec<R> {
    let mut seen = std::collections::HashSet::new();
    let mut merged: Vec<R> = existing
        .into_iter()
        .chain(new)
        .filter(|r| seen.insert((r.date(), r.key())))
        .collect();
    merged.sort_by(|a, b| (a.date(), a.key()).cmp(&(b.date(), b.key())));

    merged
}

// -- Tests -------------------------------------------------------------------
