use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Deserialize;

use super::{Reading, Station};
use crate::region::Placement;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
/// Daily SNOTEL elements requested from AWDB.
pub enum Element {
    SnowDepth,
    SnowWaterEquivalent,
    PrecipitationIncrement,
    SnowDensity,
    AvgTemp,
    MaxTemp,
    MinTemp,
}

impl Element {
    pub const ALL: [Element; 7] = [
        Element::SnowDepth,
        Element::SnowWaterEquivalent,
        Element::PrecipitationIncrement,
        Element::SnowDensity,
        Element::AvgTemp,
        Element::MaxTemp,
        Element::MinTemp,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Element::SnowDepth => "SNWD",
            Element::SnowWaterEquivalent => "WTEQ",
            Element::PrecipitationIncrement => "PRCP",
            Element::SnowDensity => "SNDN",
            Element::AvgTemp => "TAVG",
            Element::MaxTemp => "TMAX",
            Element::MinTemp => "TMIN",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|e| e.code() == code)
    }

    /// Column name in the daily dataset.
    pub fn column(&self) -> &'static str {
        match self {
            Element::SnowDepth => "snow_depth",
            Element::SnowWaterEquivalent => "swe",
            Element::PrecipitationIncrement => "precipitation_increment",
            Element::SnowDensity => "snow_density",
            Element::AvgTemp => "avg_temp",
            Element::MaxTemp => "max_temp",
            Element::MinTemp => "min_temp",
        }
    }

    /// Comma separated codes for the AWDB `elements` parameter.
    pub fn query() -> String {
        Self::ALL.map(|e| e.code()).join(",")
    }
}

// -- AWDB `data` response ----------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StationData {
    #[serde(default)]
    pub station_triplet: Option<String>,
    #[serde(default)]
    pub data: Vec<ElementSeries>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementSeries {
    pub station_element: StationElement,
    #[serde(default)]
    pub values: Vec<DataValue>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StationElement {
    pub element_code: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataValue {
    pub date: String,
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub average: Option<f64>,
}

// ----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
/// One day at one station, repeated for each region the station sits in.
pub struct DailyRow {
    pub date: NaiveDate,
    pub station: String,
    pub name: String,
    pub region: String,
    pub elevation_level: u8,
    pub elevation: f64,
    pub latitude: f64,
    pub longitude: f64,
    pub values: BTreeMap<Element, f64>,
    /// Period-of-record averages, where AWDB supplies them.
    pub averages: BTreeMap<Element, f64>,
}

impl Reading for DailyRow {
    fn date(&self) -> NaiveDate {
        self.date
    }

    fn key(&self) -> (String, String) {
        (self.station.clone(), self.region.clone())
    }
}

fn parse_awdb_date(s: &str) -> Option<NaiveDate> {
    s.get(..10)
        .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
}

type DayValues = (BTreeMap<Element, f64>, BTreeMap<Element, f64>);

/// Pivots element series into one row per date and placement.
///
/// Unknown element codes and unparseable dates are skipped.
pub fn pivot_station_data(
    station: &Station,
    placements: &[Placement],
    data: &[StationData],
) -> Vec<DailyRow> {
    let mut days: BTreeMap<NaiveDate, DayValues> = BTreeMap::new();

    for series in data.iter().flat_map(|d| &d.data) {
        let Some(element) = Element::from_code(&series.station_element.element_code) else {
            continue;
        };
        for value in &series.values {
            let Some(date) = parse_awdb_date(&value.date) else {
                continue;
            };
            let (values, averages) = days.entry(date).or_default();
            if let Some(v) = value.value {
                values.insert(element, v);
            }
            if let Some(a) = value.average {
                averages.insert(element, a);
            }
        }
    }

    let triplet = station.triplet();
    days.into_iter()
        .flat_map(|(date, (values, averages))| {
            let triplet = &triplet;
            placements.iter().map(move |p| DailyRow {
                date,
                station: triplet.clone(),
                name: station.name.clone(),
                region: p.region.clone(),
                elevation_level: p.elevation_level,
                elevation: station.elevation,
                latitude: station.latitude,
                longitude: station.longitude,
                values: values.clone(),
                averages: averages.clone(),
            })
        })
        .collect()
}

// -- Tests -------------------------------------------------------------------
