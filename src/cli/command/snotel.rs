//! Download daily SNOTEL series and extend the tidy dataset.

use anyhow::{anyhow, Result};
use chrono::{Days, Local, NaiveDate};
use tracing::info;

use super::{stations::fetch_stations, DAILY_FILE};
use crate::{
    batch,
    config::Settings,
    parquet,
    reading::{latest_date, merge, pivot_station_data, DailyRow},
    region::assign_stations,
};

pub async fn snotel(
    settings: &Settings,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<String> {
    let parquet_file_name = settings.output_path(DAILY_FILE)?;
    let end = end.unwrap_or_else(|| Local::now().date_naive());

    let existing = if parquet_file_name.exists() {
        parquet::load_daily(&parquet_file_name)?
    } else {
        Vec::new()
    };
    let latest = latest_date(&existing);
    let start = resolve_start(start, latest, end, settings.lookback_days);

    if start >= end {
        if parquet_file_name.exists() {
            info!(%start, %end, "dataset is up to date");
            return Ok(parquet_file_name.to_string_lossy().to_string());
        }
        return Err(anyhow!("start {} is not before end {}", start, end));
    }
    info!(%start, %end, existing = existing.len(), "fetching daily data");

    let fetcher = settings.fetcher()?;
    let index = settings.region_index()?;
    let stations = fetch_stations(&fetcher, &settings.state).await?;
    let roster = assign_stations(&index, &stations);

    let units: Vec<_> = stations
        .into_iter()
        .filter_map(|station| {
            let placements = roster.by_station.get(&station.triplet())?.clone();
            (!placements.is_empty()).then_some((station, placements))
        })
        .collect();

    let outcome = batch::run(
        units,
        settings.max_workers,
        "Downloading station data...",
        |(station, _)| station.triplet(),
        |(station, placements)| {
            let fetcher = fetcher.clone();
            async move {
                let data = fetcher.station_data(&station.triplet(), start, end).await?;
                Ok(pivot_station_data(&station, &placements, &data))
            }
        },
    )
    .await;

    let summary = outcome.summary();
    let new_rows: Vec<DailyRow> = outcome.items.into_iter().flatten().collect();
    info!(rows = new_rows.len(), "{}", summary);
    let rows = merge(existing, new_rows);
    parquet::save_daily(&rows, &parquet_file_name)?;

    Ok(parquet_file_name.to_string_lossy().to_string())
}

/// First day to fetch: the explicit start, else the day after the latest
/// stored row, else `lookback_days` before `end`.
pub fn resolve_start(
    explicit: Option<NaiveDate>,
    latest: Option<NaiveDate>,
    end: NaiveDate,
    lookback_days: u64,
) -> NaiveDate {
    explicit
        .or_else(|| latest.and_then(|d| d.succ_opt()))
        .unwrap_or_else(|| end.checked_sub_days(Days::new(lookback_days)).unwrap_or(end))
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn day(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    #[test]
    fn should_prefer_explicit_start() {
        assert_eq!(
            resolve_start(Some(day(1, 5)), Some(day(1, 20)), day(2, 1), 30),
            day(1, 5)
        );
    }

    #[test]
    fn should_resume_after_latest() {
        assert_eq!(resolve_start(None, Some(day(1, 31)), day(2, 10), 30), day(2, 1));
    }

    #[test]
    fn should_look_back_on_first_run() {
        assert_eq!(resolve_start(None, None, day(3, 1), 30), day(1, 31));
    }

    #[test]
    fn should_report_nothing_to_fetch_when_current() {
        let start = resolve_start(None, Some(day(2, 10)), day(2, 10), 30);
        assert!(start >= day(2, 10));
    }
}
