use anyhow::{Context, Result};
use std::path::Path;

use crate::{export::RECORD_COLUMNS, process::Record};

/// Write `records` as a comma-separated table with a header row.
///
/// Values keep a decimal point even when whole (`0.0`, `12.0`).
pub fn write_csv(path: &Path, records: &[Record]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)
        .with_context(|| format!("creating CSV file {}", path.display()))?;
    wtr.write_record(RECORD_COLUMNS)
        .context("writing CSV header")?;
    for record in records {
        wtr.write_record([
            record.date_label(),
            record.time_label(),
            format!("{:?}", record.value),
        ])
        .with_context(|| format!("writing CSV row to {}", path.display()))?;
    }
    wtr.flush().context("flushing CSV writer")?;
    Ok(())
}
