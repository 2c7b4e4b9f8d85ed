//! Save station metadata with its region placements to a parquet file.

use std::{path::Path, sync::Arc};

use anyhow::Result;
use arrow::{
    array::{ArrayRef, BooleanBuilder, Float64Builder, StringBuilder, UInt8Builder},
    datatypes::{DataType, Field, Schema},
    record_batch::RecordBatch,
};

use super::write_atomically;
use crate::{
    reading::Station,
    region::{Roster, Sited},
};

fn schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("station", DataType::Utf8, false),
        Field::new("station_id", DataType::Utf8, false),
        Field::new("state", DataType::Utf8, false),
        Field::new("network", DataType::Utf8, false),
        Field::new("name", DataType::Utf8, false),
        Field::new("county", DataType::Utf8, true),
        Field::new("elevation", DataType::Float64, false),
        Field::new("latitude", DataType::Float64, false),
        Field::new("longitude", DataType::Float64, false),
        Field::new("begin_date", DataType::Utf8, true),
        Field::new("region", DataType::Utf8, true),
        Field::new("elevation_level", DataType::UInt8, true),
        Field::new("interior", DataType::Boolean, true),
    ]))
}

/// One row per station and region. Stations outside every region get a
/// single row with null placement columns.
pub fn save_stations(stations: &[Station], roster: &Roster<Station>, file_path: &Path) -> Result<()> {
    let mut triplets = StringBuilder::new();
    let mut ids = StringBuilder::new();
    let mut states = StringBuilder::new();
    let mut networks = StringBuilder::new();
    let mut names = StringBuilder::new();
    let mut counties = StringBuilder::new();
    let mut elevations = Float64Builder::new();
    let mut latitudes = Float64Builder::new();
    let mut longitudes = Float64Builder::new();
    let mut begin_dates = StringBuilder::new();
    let mut regions = StringBuilder::new();
    let mut levels = UInt8Builder::new();
    let mut interiors = BooleanBuilder::new();

    let mut sorted: Vec<&Station> = stations.iter().collect();
    sorted.sort_by_key(|s| s.site_id());

    for s in sorted {
        let placements = roster
            .by_station
            .get(&s.site_id())
            .map(Vec::as_slice)
            .unwrap_or_default();
        let rows: Vec<Option<_>> = if placements.is_empty() {
            vec![None]
        } else {
            placements.iter().map(Some).collect()
        };

        for placement in rows {
            triplets.append_value(s.triplet());
            ids.append_value(&s.station_id);
            states.append_value(&s.state_code);
            networks.append_value(&s.network_code);
            names.append_value(&s.name);
            counties.append_option(s.county_name.as_deref());
            elevations.append_value(s.elevation);
            latitudes.append_value(s.latitude);
            longitudes.append_value(s.longitude);
            begin_dates.append_option(s.begin_date.as_deref());
            regions.append_option(placement.map(|p| p.region.as_str()));
            levels.append_option(placement.map(|p| p.elevation_level));
            interiors.append_option(placement.map(|p| p.interior));
        }
    }

    let columns: Vec<ArrayRef> = vec![
        Arc::new(triplets.finish()),
        Arc::new(ids.finish()),
        Arc::new(states.finish()),
        Arc::new(networks.finish()),
        Arc::new(names.finish()),
        Arc::new(counties.finish()),
        Arc::new(elevations.finish()),
        Arc::new(latitudes.finish()),
        Arc::new(longitudes.finish()),
        Arc::new(begin_dates.finish()),
        Arc::new(regions.finish()),
        Arc::new(levels.finish()),
        Arc::new(interiors.finish()),
    ];
    let schema = schema();
    let batch = RecordBatch::try_new(schema.clone(), columns)?;

    write_atomically(file_path, schema, &batch)
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod test {
    use arrow::array::{Array, StringArray, UInt8Array};
    use tempfile::TempDir;

    use super::*;
    use crate::{
        parquet::{column, read_batches},
        region::{assign_stations, BoundaryTolerance, RegionIndex},
    };

    fn station(id: &str, lat: f64, lon: f64, elevation: f64) -> Station {
        Station {
            station_id: id.to_string(),
            state_code: "UT".to_string(),
            network_code: "SNTL".to_string(),
            name: format!("Station {}", id),
            elevation,
            latitude: lat,
            longitude: lon,
            ..Default::default()
        }
    }

    #[test]
    fn should_write_placement_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("stations.parquet");
        let stations = vec![
            station("2", 30.0, -100.0, 5000.0),
            station("1", 41.6, -111.5, 7500.0),
        ];
        let index = RegionIndex::bundled(BoundaryTolerance::default()).unwrap();
        let roster = assign_stations(&index, &stations);

        save_stations(&stations, &roster, &path).unwrap();

        let batches = read_batches(&path).unwrap();
        let batch = &batches[0];
        assert_eq!(batch.num_rows(), 2);

        let triplets = column::<StringArray>(batch, "station").unwrap();
        let regions = column::<StringArray>(batch, "region").unwrap();
        let levels = column::<UInt8Array>(batch, "elevation_level").unwrap();
        assert_eq!(triplets.value(0), "1:UT:SNTL");
        assert_eq!(regions.value(0), "Logan");
        assert_eq!(levels.value(0), 2);
        assert_eq!(triplets.value(1), "2:UT:SNTL");
        assert!(regions.is_null(1));
    }
}
