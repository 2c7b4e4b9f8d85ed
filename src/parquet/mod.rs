//! Handles serialising datasets to and from the _parquet_ file format.

pub mod daily;
pub mod forecasts;
pub mod stations;

use std::{fs::File, path::Path, sync::Arc};

use anyhow::{anyhow, Context, Result};
use arrow::{array::Array, datatypes::Schema, record_batch::RecordBatch};
use chrono::{Datelike, NaiveDate};
use parquet::{
    arrow::{arrow_reader::ParquetRecordBatchReaderBuilder, ArrowWriter},
    basic::{Compression, ZstdLevel},
    file::properties::WriterProperties,
};
use tempfile::NamedTempFile;

pub use daily::{load_daily, save_daily};
pub use forecasts::{load_forecasts, save_forecasts};
pub use stations::save_stations;

const EPOCH_DAYS_FROM_CE: i32 = 719_163;

pub fn to_date32(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - EPOCH_DAYS_FROM_CE
}

pub fn from_date32(days: i32) -> Option<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(days + EPOCH_DAYS_FROM_CE)
}

/// Writes `batch` next to `file_path` and renames it into place, so a failed
/// write never leaves a truncated dataset behind.
pub fn write_atomically(file_path: &Path, schema: Arc<Schema>, batch: &RecordBatch) -> Result<()> {
    let dir = match file_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let temp = NamedTempFile::new_in(dir)?;

    let props = WriterProperties::builder()
        .set_compression(Compression::ZSTD(ZstdLevel::default()))
        .set_dictionary_enabled(true)
        .build();

    let mut writer = ArrowWriter::try_new(temp.reopen()?, schema, Some(props))?;
    writer.write(batch)?;
    writer.close()?;

    temp.persist(file_path)
        .with_context(|| format!("could not replace {}", file_path.display()))?;

    Ok(())
}

pub fn read_batches(file_path: &Path) -> Result<Vec<RecordBatch>> {
    let file = File::open(file_path)?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;

    Ok(reader.collect::<Result<Vec<_>, _>>()?)
}

/// Typed column by name.
pub fn column<'a, T: Array + 'static>(batch: &'a RecordBatch, name: &str) -> Result<&'a T> {
    batch
        .column_by_name(name)
        .ok_or_else(|| anyhow!("missing column `{}`", name))?
        .as_any()
        .downcast_ref::<T>()
        .ok_or_else(|| anyhow!("column `{}` has an unexpected type", name))
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn should_convert_dates() {
        let date = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
        assert_eq!(to_date32(date), 0);

        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(from_date32(to_date32(date)), Some(date));
    }
}
