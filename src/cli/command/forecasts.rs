//! Scrape new avalanche forecasts, read their roses and extend the dataset.

use std::{collections::HashSet, sync::Arc};

use anyhow::{anyhow, bail, Result};
use chrono::NaiveDate;
use tracing::{debug, info, warn};

use super::FORECAST_FILE;
use crate::{
    batch,
    cli::create_spinner,
    config::Settings,
    download::Fetcher,
    parquet,
    reading::{latest_date, merge, ForecastListing, ForecastRecord},
    rose::RoseDecoder,
    scrape::{self, ArchivePage},
};

pub async fn forecasts(settings: &Settings) -> Result<String> {
    // The built in map only fits the synthetic template
    if settings.coordinates.is_none() {
        bail!("decoding published roses needs a `coordinates` map for their layout in the config file");
    }

    let parquet_file_name = settings.output_path(FORECAST_FILE)?;
    let existing = if parquet_file_name.exists() {
        parquet::load_forecasts(&parquet_file_name)?
    } else {
        Vec::new()
    };
    let latest = latest_date(&existing);
    match latest {
        Some(date) => info!(%date, "getting forecasts newer than latest stored"),
        None => info!("no existing forecasts, scraping the whole archive"),
    }

    let fetcher = settings.fetcher()?;
    let index = settings.region_index()?;
    let decoder = Arc::new(settings.decoder()?);
    let region_names: Vec<String> = index.regions().iter().map(|r| r.name.clone()).collect();

    let listings = scrape_listings(&fetcher, latest).await?;
    let known: HashSet<(NaiveDate, String)> = existing
        .iter()
        .map(|r| (r.date, r.region.clone()))
        .collect();
    let units = select_new(listings, &region_names, known);
    if units.is_empty() {
        info!("no new forecasts found");
    }

    let outcome = batch::run(
        units,
        settings.max_workers,
        "Reading forecast roses...",
        |(listing, region)| format!("{} {}", region, listing.date),
        |(listing, region)| {
            let fetcher = fetcher.clone();
            let decoder = Arc::clone(&decoder);
            async move { read_forecast(&fetcher, &decoder, &listing, &region).await }
        },
    )
    .await;

    let records = merge(existing, outcome.items);
    parquet::save_forecasts(&records, &parquet_file_name)?;

    Ok(parquet_file_name.to_string_lossy().to_string())
}

/// Walks archive pages from newest until the view runs out or a row older
/// than `latest` appears.
async fn scrape_listings(fetcher: &Fetcher, latest: Option<NaiveDate>) -> Result<Vec<ForecastListing>> {
    let bar = create_spinner("Scraping page 0".to_string());
    let mut listings = Vec::new();
    let mut page = 0;

    loop {
        let html = match fetcher.text(&scrape::archive_page_url(page)).await {
            Ok(html) => html,
            Err(e) if page > 0 => {
                warn!(page, error = %e, "stopping archive scrape");
                break;
            }
            Err(e) => return Err(e),
        };

        let rows = match scrape::parse_archive_page(&html) {
            ArchivePage::Empty => break,
            ArchivePage::Rows(rows) if rows.is_empty() => {
                warn!(page, "archive page has no forecast rows");
                break;
            }
            ArchivePage::Rows(rows) => rows,
        };

        let (kept, reached_latest) = scrape::since(rows, latest);
        listings.extend(kept);
        if reached_latest {
            break;
        }

        page += 1;
        bar.set_message(format!("Scraping page {}", page));
    }

    bar.finish_with_message(format!("{} forecasts listed", listings.len()));

    Ok(listings)
}

/// Pairs each listing with its region, dropping unknown areas and any
/// (date, region) already stored or listed twice.
fn select_new(
    listings: Vec<ForecastListing>,
    region_names: &[String],
    mut known: HashSet<(NaiveDate, String)>,
) -> Vec<(ForecastListing, String)> {
    listings
        .into_iter()
        .filter_map(|listing| {
            let Some(region) = scrape::match_region(&listing.area, region_names) else {
                warn!(area = %listing.area, link = %listing.link, "forecast area matches no region");
                return None;
            };
            let region = region.to_string();
            known
                .insert((listing.date, region.clone()))
                .then_some((listing, region))
        })
        .collect()
}

async fn read_forecast(
    fetcher: &Fetcher,
    decoder: &RoseDecoder,
    listing: &ForecastListing,
    region: &str,
) -> Result<ForecastRecord> {
    let page = fetcher.text(&listing.link).await?;
    let rose_link = scrape::rose_image_link(&page)
        .ok_or_else(|| anyhow!("no rose image on {}", listing.link))?;
    let bytes = fetcher.bytes(&rose_link).await?;
    let image = image::load_from_memory(&bytes)?.to_rgba8();

    let reading = decoder.decode(&image);
    if !reading.unmatched.is_empty() {
        warn!(
            link = %listing.link,
            cells = reading.unmatched.len(),
            "rose cells matched no danger colour"
        );
    }

    let record = ForecastRecord::new(listing, region, &reading);
    debug!(region, date = %record.date, peak = ?record.peak(), "forecast decoded");

    Ok(record)
}

// -- Tests -------------------------------------------------------------------
