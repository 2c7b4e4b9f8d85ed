//! Download SNOTEL station metadata and place each station in its regions.

use std::path::Path;

use anyhow::Result;
use tracing::info;

use super::{write_text_atomically, ROSTER_FILE, STATIONS_FILE};
use crate::{
    cli::create_spinner,
    config::Settings,
    download::Fetcher,
    parquet,
    reading::Station,
    region::{assign_stations, Roster},
};

pub async fn stations(settings: &Settings) -> Result<String> {
    let fetcher = settings.fetcher()?;
    let index = settings.region_index()?;

    let stations = fetch_stations(&fetcher, &settings.state).await?;
    let roster = assign_stations(&index, &stations);
    for line in region_counts(&roster) {
        println!("{}", line);
    }

    let parquet_file_name = settings.output_path(STATIONS_FILE)?;
    parquet::save_stations(&stations, &roster, &parquet_file_name)?;
    save_roster(&roster, &settings.output_path(ROSTER_FILE)?)?;

    Ok(parquet_file_name.to_string_lossy().to_string())
}

pub async fn fetch_stations(fetcher: &Fetcher, state: &str) -> Result<Vec<Station>> {
    let bar = create_spinner(format!("Downloading {} station metadata...", state));
    let stations = fetcher.stations(state).await?;
    bar.finish_with_message(format!("{} stations downloaded", stations.len()));

    Ok(stations)
}

fn region_counts(roster: &Roster<Station>) -> Vec<String> {
    let mut lines: Vec<String> = roster
        .by_region
        .iter()
        .map(|r| format!("{}: {} stations", r.region, r.stations.len()))
        .collect();

    let unplaced: Vec<&str> = roster.unplaced().collect();
    if !unplaced.is_empty() {
        info!(stations = ?unplaced, "stations outside every region");
        lines.push(format!("Unassigned: {} stations", unplaced.len()));
    }

    lines
}

fn save_roster(roster: &Roster<Station>, file_path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(&roster.by_region)?;
    write_text_atomically(file_path, &json)
}

// -- Tests -------------------------------------------------------------------
