use chrono::NaiveDate;
use tracing::{debug, trace};

use crate::{
    process::{
        date_parser::{parse_leading_date, quarter_hours},
        layout::LayoutInfo,
        raw_table::DecodedTable,
        record::{DateWindow, Record},
        utils::{clean_direction, parse_reading},
    },
    summary::{Diagnostics, RowCounters},
};

/// Direction labels whose rows are transcribed.
pub const ACCEPTED_DIRECTIONS: [&str; 2] = ["A+", "A-"];

/// Rows between two progress callbacks.
pub const PROGRESS_EVERY_ROWS: usize = 100;

/// What happened to a single table row.
#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    Extracted {
        date: NaiveDate,
        records: Vec<Record>,
        warnings: Vec<String>,
    },
    SkippedLabel,
    SkippedDateError(String),
    SkippedOutOfRange(NaiveDate),
}

/// Classify row `idx` and, if it qualifies, transcribe its readings.
pub fn extract_row(
    idx: usize,
    row: &[String],
    layout: &LayoutInfo,
    window: &DateWindow,
) -> RowOutcome {
    let label = row
        .get(layout.direction_column)
        .map(|c| clean_direction(c))
        .unwrap_or_default();
    if !ACCEPTED_DIRECTIONS.contains(&label.as_str()) {
        return RowOutcome::SkippedLabel;
    }

    let raw_date = row.first().map(String::as_str).unwrap_or_default();
    let Some(date) = parse_leading_date(raw_date) else {
        return RowOutcome::SkippedDateError(format!(
            "Row {idx}: Invalid date format - '{raw_date}'"
        ));
    };
    if !window.contains(date) {
        return RowOutcome::SkippedOutOfRange(date);
    }

    let mut records = Vec::with_capacity(layout.value_columns.indices().len());
    let mut warnings = Vec::new();
    for (interval, (&col, time)) in layout
        .value_columns
        .indices()
        .iter()
        .zip(quarter_hours())
        .enumerate()
    {
        let raw = row.get(col).map(String::as_str).unwrap_or_default();
        let value = if raw.trim().is_empty() {
            0.0
        } else {
            parse_reading(raw).unwrap_or_else(|| {
                warnings.push(format!(
                    "Row {idx}, QH {}: Invalid value '{raw}' - using 0.0",
                    interval + 1
                ));
                0.0
            })
        };
        records.push(Record { date, time, value });
    }

    RowOutcome::Extracted {
        date,
        records,
        warnings,
    }
}

/// Everything accumulated while walking a table's rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    pub records: Vec<Record>,
    pub diagnostics: Diagnostics,
    pub counters: RowCounters,
    /// Earliest and latest dates parsed from direction-matched rows, in the window or not.
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
}

impl Extraction {
    fn absorb(mut self, outcome: RowOutcome) -> Self {
        self.counters.rows_processed += 1;
        match outcome {
            RowOutcome::Extracted {
                date,
                records,
                warnings,
            } => {
                self.observe(date);
                self.records.extend(records);
                self.diagnostics.warnings.extend(warnings);
            }
            RowOutcome::SkippedLabel => self.counters.rows_skipped_label += 1,
            RowOutcome::SkippedDateError(message) => {
                self.counters.rows_skipped_date += 1;
                self.diagnostics.push_error(message);
            }
            RowOutcome::SkippedOutOfRange(date) => {
                trace!(%date, "row outside window");
                self.observe(date);
                self.counters.rows_outside_range += 1;
            }
        }
        self
    }

    fn observe(&mut self, date: NaiveDate) {
        self.first_date = Some(self.first_date.map_or(date, |d| d.min(date)));
        self.last_date = Some(self.last_date.map_or(date, |d| d.max(date)));
    }
}

/// Walk every row of `table` in order, folding each row's outcome into one
/// `Extraction`.
pub fn extract_records(
    table: &DecodedTable,
    layout: &LayoutInfo,
    window: &DateWindow,
    progress: &mut dyn FnMut(f64),
) -> Extraction {
    let total = table.len();
    let extraction = table
        .rows()
        .iter()
        .enumerate()
        .fold(Extraction::default(), |acc, (idx, row)| {
            let acc = acc.absorb(extract_row(idx, row, layout, window));
            if idx % PROGRESS_EVERY_ROWS == 0 {
                progress(idx as f64 / total as f64);
            }
            acc
        });

    debug!(
        rows = extraction.counters.rows_processed,
        skipped_label = extraction.counters.rows_skipped_label,
        skipped_date = extraction.counters.rows_skipped_date,
        outside_range = extraction.counters.rows_outside_range,
        records = extraction.records.len(),
        "rows extracted"
    );
    extraction
}
