//! Save and load the tidy daily SNOTEL dataset.

use std::{collections::BTreeMap, path::Path, sync::Arc};

use anyhow::{anyhow, Result};
use arrow::{
    array::{
        Array, ArrayRef, Date32Array, Date32Builder, Float64Array, Float64Builder, StringArray,
        StringBuilder, UInt8Array, UInt8Builder,
    },
    datatypes::{DataType, Field, Schema},
    record_batch::RecordBatch,
};

use super::{column, from_date32, read_batches, to_date32, write_atomically};
use crate::{
    cli::create_progress_bar,
    reading::{DailyRow, Element},
};

fn average_column(element: Element) -> String {
    format!("{}_avg", element.column())
}

fn schema() -> Arc<Schema> {
    let mut fields = vec![
        Field::new("date", DataType::Date32, false),
        Field::new("station", DataType::Utf8, false),
        Field::new("name", DataType::Utf8, false),
        Field::new("region", DataType::Utf8, false),
        Field::new("elevation_level", DataType::UInt8, false),
        Field::new("elevation", DataType::Float64, false),
        Field::new("latitude", DataType::Float64, false),
        Field::new("longitude", DataType::Float64, false),
    ];
    for element in Element::ALL {
        fields.push(Field::new(element.column(), DataType::Float64, true));
        fields.push(Field::new(average_column(element), DataType::Float64, true));
    }

    Arc::new(Schema::new(fields))
}

pub fn save_daily(rows: &[DailyRow], file_path: &Path) -> Result<()> {
    let n = rows.len();
    let mut dates = Date32Builder::with_capacity(n);
    let mut stations = StringBuilder::new();
    let mut names = StringBuilder::new();
    let mut regions = StringBuilder::new();
    let mut levels = UInt8Builder::with_capacity(n);
    let mut elevations = Float64Builder::with_capacity(n);
    let mut latitudes = Float64Builder::with_capacity(n);
    let mut longitudes = Float64Builder::with_capacity(n);
    let mut values: Vec<(Float64Builder, Float64Builder)> = Element::ALL
        .iter()
        .map(|_| (Float64Builder::with_capacity(n), Float64Builder::with_capacity(n)))
        .collect();

    let pb = create_progress_bar(n as u64, "Writing parquet file".to_string());
    for (i, row) in rows.iter().enumerate() {
        dates.append_value(to_date32(row.date));
        stations.append_value(&row.station);
        names.append_value(&row.name);
        regions.append_value(&row.region);
        levels.append_value(row.elevation_level);
        elevations.append_value(row.elevation);
        latitudes.append_value(row.latitude);
        longitudes.append_value(row.longitude);
        for (element, (value, average)) in Element::ALL.iter().zip(values.iter_mut()) {
            value.append_option(row.values.get(element).copied());
            average.append_option(row.averages.get(element).copied());
        }

        if i % 10000 == 0 {
            pb.set_position(i as u64);
        }
    }

    let mut columns: Vec<ArrayRef> = vec![
        Arc::new(dates.finish()),
        Arc::new(stations.finish()),
        Arc::new(names.finish()),
        Arc::new(regions.finish()),
        Arc::new(levels.finish()),
        Arc::new(elevations.finish()),
        Arc::new(latitudes.finish()),
        Arc::new(longitudes.finish()),
    ];
    for (value, average) in values.iter_mut() {
        columns.push(Arc::new(value.finish()));
        columns.push(Arc::new(average.finish()));
    }

    let schema = schema();
    let batch = RecordBatch::try_new(schema.clone(), columns)?;
    write_atomically(file_path, schema, &batch)?;
    pb.finish_with_message("Finished writing parquet file");

    Ok(())
}

fn optional(array: &Float64Array, i: usize) -> Option<f64> {
    (!array.is_null(i)).then(|| array.value(i))
}

pub fn load_daily(file_path: &Path) -> Result<Vec<DailyRow>> {
    let mut rows = Vec::new();

    for batch in read_batches(file_path)? {
        let dates = column::<Date32Array>(&batch, "date")?;
        let stations = column::<StringArray>(&batch, "station")?;
        let names = column::<StringArray>(&batch, "name")?;
        let regions = column::<StringArray>(&batch, "region")?;
        let levels = column::<UInt8Array>(&batch, "elevation_level")?;
        let elevations = column::<Float64Array>(&batch, "elevation")?;
        let latitudes = column::<Float64Array>(&batch, "latitude")?;
        let longitudes = column::<Float64Array>(&batch, "longitude")?;
        let elements = Element::ALL
            .iter()
            .map(|e| {
                Ok((
                    *e,
                    column::<Float64Array>(&batch, e.column())?,
                    column::<Float64Array>(&batch, &average_column(*e))?,
                ))
            })
            .collect::<Result<Vec<_>>>()?;

        for i in 0..batch.num_rows() {
            let date = from_date32(dates.value(i))
                .ok_or_else(|| anyhow!("date out of range in row {}", i))?;
            let mut values = BTreeMap::new();
            let mut averages = BTreeMap::new();
            for (element, value, average) in &elements {
                if let Some(v) = optional(value, i) {
                    values.insert(*element, v);
                }
                if let Some(a) = optional(average, i) {
                    averages.insert(*element, a);
                }
            }

            rows.push(DailyRow {
                date,
                station: stations.value(i).to_string(),
                name: names.value(i).to_string(),
                region: regions.value(i).to_string(),
                elevation_level: levels.value(i),
                elevation: elevations.value(i),
                latitude: latitudes.value(i),
                longitude: longitudes.value(i),
                values,
                averages,
            });
        }
    }

    Ok(rows)
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod test {
    use chrono::NaiveDate;
    use tempfile::TempDir;

    use super::*;

    fn rows_fixture() -> Vec<DailyRow> {
        let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let mut values = BTreeMap::new();
        values.insert(Element::SnowDepth, 52.0);
        values.insert(Element::MinTemp, 11.3);
        let mut averages = BTreeMap::new();
        averages.insert(Element::SnowDepth, 48.5);

        vec![
            DailyRow {
                date,
                station: "1098:UT:SNTL".to_string(),
                name: "Tony Grove Lake".to_string(),
                region: "Logan".to_string(),
                elevation_level: 2,
                elevation: 8474.0,
                latitude: 41.9,
                longitude: -111.6,
                values,
                averages,
            },
            DailyRow {
                date: date.succ_opt().unwrap(),
                station: "1098:UT:SNTL".to_string(),
                name: "Tony Grove Lake".to_string(),
                region: "Logan".to_string(),
                elevation_level: 2,
                elevation: 8474.0,
                latitude: 41.9,
                longitude: -111.6,
                values: BTreeMap::new(),
                averages: BTreeMap::new(),
            },
        ]
    }

    #[test]
    fn should_reload_what_was_saved() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("snotel-daily.parquet");
        let rows = rows_fixture();

        save_daily(&rows, &path).unwrap();
        let loaded = load_daily(&path).unwrap();

        assert_eq!(loaded, rows);
    }

    #[test]
    fn should_write_one_column_per_element() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("snotel-daily.parquet");

        save_daily(&rows_fixture(), &path).unwrap();
        let batch = &read_batches(&path).unwrap()[0];

        assert_eq!(batch.num_columns(), 8 + 2 * Element::ALL.len());
        let depth = column::<Float64Array>(batch, "snow_depth").unwrap();
        assert_eq!(depth.value(0), 52.0);
        assert!(depth.is_null(1));
        let swe = column::<Float64Array>(batch, "swe").unwrap();
        assert_eq!(swe.null_count(), 2);
    }

    #[test]
    fn should_replace_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("snotel-daily.parquet");
        std::fs::write(&path, b"stale").unwrap();

        save_daily(&rows_fixture()[..1], &path).unwrap();

        assert_eq!(load_daily(&path).unwrap().len(), 1);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
