use anyhow::{Context, Result};
use arrow::{
    array::{ArrayRef, Float64Array, StringArray},
    datatypes::{DataType, Field, Schema},
    record_batch::RecordBatch,
};
use parquet::{arrow::ArrowWriter, basic::Compression, file::properties::WriterProperties};
use std::{
    fs::{self, File},
    path::Path,
    sync::Arc,
};

use crate::{export::RECORD_COLUMNS, process::Record};

/// `Timestamp` and `Time` are kept as the display strings so the Parquet and CSV
/// exports read the same.
pub fn record_schema() -> Schema {
    let [date, time, value] = RECORD_COLUMNS;
    Schema::new(vec![
        Field::new(date, DataType::Utf8, false),
        Field::new(time, DataType::Utf8, false),
        Field::new(value, DataType::Float64, false),
    ])
}

pub fn records_to_batch(records: &[Record]) -> Result<RecordBatch> {
    let dates: StringArray = records.iter().map(|r| Some(r.date_label())).collect();
    let times: StringArray = records.iter().map(|r| Some(r.time_label())).collect();
    let values = Float64Array::from_iter_values(records.iter().map(|r| r.value));

    RecordBatch::try_new(
        Arc::new(record_schema()),
        vec![
            Arc::new(dates) as ArrayRef,
            Arc::new(times) as ArrayRef,
            Arc::new(values) as ArrayRef,
        ],
    )
    .context("building record batch")
}

/// Write `records` to a Snappy-compressed Parquet file; returns its size in bytes.
pub fn write_parquet(path: &Path, records: &[Record]) -> Result<u64> {
    let batch = records_to_batch(records)?;

    let file =
        File::create(path).with_context(|| format!("creating file {}", path.display()))?;
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();
    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))
        .context("creating parquet writer")?;

    writer.write(&batch).context("writing batch to parquet")?;
    writer.close().context("closing parquet writer")?;

    let metadata = fs::metadata(path).context("getting file metadata")?;
    Ok(metadata.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::init_test_logging;
    use chrono::{NaiveDate, NaiveTime};
    use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
    use tempfile::TempDir;

    #[test]
    fn parquet_round_trip_keeps_columns() -> Result<()> {
        init_test_logging();
        let dir = TempDir::new()?;
        let path = dir.path().join("records.parquet");
        let records: Vec<Record> = (0..4)
            .map(|i| Record {
                date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
                time: NaiveTime::from_hms_opt(0, 15 * i, 0).unwrap(),
                value: f64::from(i) * 0.5,
            })
            .collect();

        let bytes = write_parquet(&path, &records)?;
        assert!(bytes > 0);

        let reader = ParquetRecordBatchReaderBuilder::try_new(File::open(&path)?)?.build()?;
        let batches = reader.collect::<Result<Vec<_>, _>>()?;
        let batch = &batches[0];
        assert_eq!(batch.num_rows(), 4);
        assert_eq!(batch.schema().field(2).name(), "Value [kWh]");

        let times = batch
            .column(1)
            .as_any()
            .downcast_ref::<StringArray>()
            .expect("time column is utf8");
        assert_eq!(times.value(3), "00:45:00");
        let values = batch
            .column(2)
            .as_any()
            .downcast_ref::<Float64Array>()
            .expect("value column is f64");
        assert_eq!(values.value(3), 1.5);
        Ok(())
    }
}
