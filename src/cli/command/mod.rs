pub mod forecasts;
pub mod locate;
pub mod rose;
pub mod snotel;
pub mod stations;

use std::{io::Write, path::Path};

use anyhow::{Context, Result};
use tempfile::NamedTempFile;

pub use forecasts::forecasts;
pub use locate::locate;
pub use rose::{generate, read, template};
pub use snotel::snotel;
pub use stations::stations;

pub const STATIONS_FILE: &str = "stations.parquet";
pub const ROSTER_FILE: &str = "stations-by-region.json";
pub const DAILY_FILE: &str = "snotel-daily.parquet";
pub const FORECAST_FILE: &str = "avalanche-forecast-rose.parquet";

/// Writes `text` to a sibling temp file and renames it over `file_path`.
pub fn write_text_atomically(file_path: &Path, text: &str) -> Result<()> {
    let dir = match file_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut temp = NamedTempFile::new_in(dir)?;
    temp.write_all(text.as_bytes())?;
    temp.persist(file_path)
        .with_context(|| format!("could not replace {}", file_path.display()))?;

    Ok(())
}

// -- Tests -------------------------------------------------------------------
