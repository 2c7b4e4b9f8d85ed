//! HTTP access to AWDB and the forecast archive.

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use reqwest::Client;
use serde::de::DeserializeOwned;

use crate::reading::{Element, Station, StationData};

pub const AWDB_URL: &str = "https://wcc.sc.egov.usda.gov/awdbRestApi/services/v1/";

#[derive(Debug, Clone)]
/// Shared client. Every request carries the configured deadline.
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Fetcher { client })
    }

    async fn get(&self, url: &str, query: &[(&str, String)]) -> Result<reqwest::Response> {
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .with_context(|| format!("request to {} failed", url))?;

        if !response.status().is_success() {
            return Err(anyhow!("{} returned {}", url, response.status()));
        }

        Ok(response)
    }

    pub async fn text(&self, url: &str) -> Result<String> {
        Ok(self.get(url, &[]).await?.text().await?)
    }

    pub async fn bytes(&self, url: &str) -> Result<Vec<u8>> {
        Ok(self.get(url, &[]).await?.bytes().await?.to_vec())
    }

    pub async fn json<T: DeserializeOwned>(&self, url: &str, query: &[(&str, String)]) -> Result<T> {
        let response = self.get(url, query).await?;
        response
            .json()
            .await
            .with_context(|| format!("unexpected response from {}", url))
    }

    /// Active SNOTEL stations in `state`.
    pub async fn stations(&self, state: &str) -> Result<Vec<Station>> {
        self.json(&format!("{}stations", AWDB_URL), &station_query(state))
            .await
    }

    /// Daily element series for one station, both dates inclusive.
    pub async fn station_data(
        &self,
        triplet: &str,
        begin: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<StationData>> {
        self.json(&format!("{}data", AWDB_URL), &data_query(triplet, begin, end))
            .await
    }
}

fn station_query(state: &str) -> Vec<(&'static str, String)> {
    vec![
        ("stationTriplets", format!("*:{}:SNTL", state)),
        ("returnForecastPointMetadata", "false".to_string()),
        ("returnReservoirMetadata", "false".to_string()),
        ("returnStationElements", "false".to_string()),
        ("activeOnly", "true".to_string()),
    ]
}

fn data_query(triplet: &str, begin: NaiveDate, end: NaiveDate) -> Vec<(&'static str, String)> {
    vec![
        ("stationTriplets", triplet.to_string()),
        ("beginDate", begin.format("%Y-%m-%d").to_string()),
        ("endDate", end.format("%Y-%m-%d").to_string()),
        ("elements", Element::query()),
        ("duration", "DAILY".to_string()),
        ("centralTendencyType", "AVERAGE".to_string()),
    ]
}

// -- Tests -------------------------------------------------------------------
