//! Command line interface.

pub mod command;

use std::{path::PathBuf, time::Duration};

use chrono::NaiveDate;
use clap::{command, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use crate::rose::PixelCoord;

#[derive(Parser)]
#[command(version, about, long_about = None)]
/// Contains the commands
pub struct Cli {
    /// Settings file, defaults to <config dir>/snowrose/config.toml
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory datasets are written to
    #[arg(long, global = true)]
    pub out_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Get SNOTEL stations and assign them to forecast regions
    Stations {},
    /// Get daily SNOTEL data, extending the existing dataset
    Snotel {
        /// First day to fetch (YYYY-MM-DD)
        #[arg(long)]
        start: Option<NaiveDate>,
        /// Last day to fetch (YYYY-MM-DD), defaults to today
        #[arg(long)]
        end: Option<NaiveDate>,
    },
    /// Scrape new avalanche forecasts and decode their roses
    Forecasts {},
    /// Decode a rose image from disk
    Read {
        image: PathBuf,
        /// Classify a single pixel instead, as ROW,COL
        #[arg(long, value_parser = parse_pixel)]
        pixel: Option<PixelCoord>,
    },
    /// Paint a rose from a JSON grid of danger levels
    Generate {
        /// JSON object of tier -> direction -> level
        #[arg(long)]
        input: PathBuf,
        /// Blank rose to paint, defaults to the built in template
        #[arg(long)]
        template: Option<PathBuf>,
        #[arg(long)]
        output: PathBuf,
        /// Opacity of painted cells
        #[arg(long, default_value_t = 255)]
        alpha: u8,
    },
    /// Write the blank template rose and its coordinate map
    Template {
        #[arg(long)]
        output_dir: PathBuf,
        /// Width and height in pixels
        #[arg(long, default_value_t = 400)]
        size: u32,
    },
    /// Show the regions and elevation tiers for a point
    Locate {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
        /// Feet above sea level
        #[arg(long)]
        elevation: Option<f64>,
    },
}

fn parse_pixel(s: &str) -> Result<PixelCoord, String> {
    let (row, col) = s
        .split_once(',')
        .ok_or_else(|| format!("`{}` is not ROW,COL", s))?;
    let parse = |v: &str| {
        v.trim()
            .parse::<u32>()
            .map_err(|e| format!("`{}`: {}", v.trim(), e))
    };

    Ok(PixelCoord::new(parse(row)?, parse(col)?))
}

/// Creates a spinner.
pub fn create_spinner(message: String) -> ProgressBar {
    let bar = ProgressBar::new_spinner().with_message(message);
    bar.enable_steady_tick(Duration::from_millis(100));

    bar
}

/// Creates a progress bar.
pub fn create_progress_bar(size: u64, message: String) -> ProgressBar {
    ProgressBar::new(size).with_message(message).with_style(
        ProgressStyle::with_template("[{eta_precise}] {bar:40.cyan/blue} {msg}")
            .unwrap()
            .progress_chars("##-"),
    )
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn should_parse_pixel() {
        assert_eq!(parse_pixel("12, 40"), Ok(PixelCoord::new(12, 40)));
        assert!(parse_pixel("12").is_err());
        assert!(parse_pixel("a,1").is_err());
    }

    #[test]
    fn should_parse_snotel_dates() {
        let cli = Cli::parse_from(["snowrose", "--out-dir", "/tmp/x", "snotel", "--start", "2024-01-01"]);

        assert_eq!(cli.out_dir, Some(PathBuf::from("/tmp/x")));
        match cli.command {
            Commands::Snotel { start, end } => {
                assert_eq!(start, NaiveDate::from_ymd_opt(2024, 1, 1));
                assert_eq!(end, None);
            }
            _ => panic!("expected snotel"),
        }
    }

    #[test]
    fn should_accept_negative_longitude() {
        let cli = Cli::parse_from(["snowrose", "locate", "--lat", "41.6", "--lon", "-111.5"]);

        match cli.command {
            Commands::Locate { lat, lon, elevation } => {
                assert_eq!((lat, lon, elevation), (41.6, -111.5, None));
            }
            _ => panic!("expected locate"),
        }
    }
}
