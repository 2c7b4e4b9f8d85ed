//! Save and load the decoded forecast rose dataset.
//!
//! One row per (date, region) with a text column per rose cell, e.g.
//! `bottom_N = "considerable"`. Cells without data are null.

use std::{path::Path, sync::Arc};

use anyhow::{anyhow, Result};
use arrow::{
    array::{Array, ArrayRef, Date32Array, Date32Builder, StringArray, StringBuilder},
    datatypes::{DataType, Field, Schema},
    record_batch::RecordBatch,
};

use super::{column, from_date32, read_batches, to_date32, write_atomically};
use crate::{
    reading::ForecastRecord,
    rose::{Cell, DangerLevel},
};

fn schema() -> Arc<Schema> {
    let mut fields = vec![
        Field::new("date", DataType::Date32, false),
        Field::new("region", DataType::Utf8, false),
        Field::new("link", DataType::Utf8, false),
    ];
    fields.extend(Cell::all().map(|cell| Field::new(cell.label(), DataType::Utf8, true)));

    Arc::new(Schema::new(fields))
}

pub fn save_forecasts(records: &[ForecastRecord], file_path: &Path) -> Result<()> {
    let mut dates = Date32Builder::with_capacity(records.len());
    let mut regions = StringBuilder::new();
    let mut links = StringBuilder::new();
    let mut cells: Vec<(Cell, StringBuilder)> =
        Cell::all().map(|cell| (cell, StringBuilder::new())).collect();

    for record in records {
        dates.append_value(to_date32(record.date));
        regions.append_value(&record.region);
        links.append_value(&record.link);
        for (cell, builder) in cells.iter_mut() {
            builder.append_option(record.cells.get(&*cell).map(DangerLevel::name));
        }
    }

    let mut columns: Vec<ArrayRef> = vec![
        Arc::new(dates.finish()),
        Arc::new(regions.finish()),
        Arc::new(links.finish()),
    ];
    columns.extend(
        cells
            .iter_mut()
            .map(|(_, builder)| Arc::new(builder.finish()) as ArrayRef),
    );

    let schema = schema();
    let batch = RecordBatch::try_new(schema.clone(), columns)?;

    write_atomically(file_path, schema, &batch)
}

pub fn load_forecasts(file_path: &Path) -> Result<Vec<ForecastRecord>> {
    let mut records = Vec::new();

    for batch in read_batches(file_path)? {
        let dates = column::<Date32Array>(&batch, "date")?;
        let regions = column::<StringArray>(&batch, "region")?;
        let links = column::<StringArray>(&batch, "link")?;
        let cells = Cell::all()
            .map(|cell| Ok((cell, column::<StringArray>(&batch, &cell.label())?)))
            .collect::<Result<Vec<_>>>()?;

        for i in 0..batch.num_rows() {
            let date = from_date32(dates.value(i))
                .ok_or_else(|| anyhow!("date out of range in row {}", i))?;
            let mut levels = std::collections::BTreeMap::new();
            for (cell, array) in &cells {
                if array.is_null(i) {
                    continue;
                }
                let level: DangerLevel = array.value(i).parse()?;
                levels.insert(*cell, level);
            }

            records.push(ForecastRecord {
                date,
                region: regions.value(i).to_string(),
                link: links.value(i).to_string(),
                cells: levels,
            });
        }
    }

    Ok(records)
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod test {
    use std::collections::BTreeMap;

    use chrono::NaiveDate;
    use tempfile::TempDir;

    use super::*;
    use crate::rose::{Direction, Tier};

    #[test]
    fn should_reload_what_was_saved() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("avalanche-forecast-rose.parquet");

        let mut cells = BTreeMap::new();
        cells.insert(Cell::new(Tier::Bottom, Direction::N), DangerLevel::Considerable);
        cells.insert(Cell::new(Tier::Top, Direction::NW), DangerLevel::Unknown);
        let records = vec![
            ForecastRecord {
                date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
                region: "Logan".to_string(),
                link: "https://utahavalanchecenter.org/forecast/logan/2/1/2024".to_string(),
                cells,
            },
            ForecastRecord {
                date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
                region: "Moab".to_string(),
                link: "https://utahavalanchecenter.org/forecast/moab/2/1/2024".to_string(),
                cells: BTreeMap::new(),
            },
        ];

        save_forecasts(&records, &path).unwrap();
        let loaded = load_forecasts(&path).unwrap();
        assert_eq!(loaded, records);

        let batch = &read_batches(&path).unwrap()[0];
        assert_eq!(batch.num_columns(), 3 + 24);
        let north = column::<StringArray>(batch, "bottom_N").unwrap();
        assert_eq!(north.value(0), "considerable");
        assert!(north.is_null(1));
    }
}
