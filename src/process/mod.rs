// src/process/mod.rs
use anyhow::{Context, Result};
use rayon::prelude::*;
use std::{fs, path::Path};
use tracing::{debug, info, instrument, trace, warn};

pub mod date_parser;
pub mod encoding;
pub mod error;
pub mod extract;
pub mod labels;
pub mod layout;
pub mod raw_table;
pub mod record;
pub mod utils;
pub mod value_block;

pub use encoding::{detect_data_start, Codec, DataStart};
pub use error::ProcessError;
pub use extract::{extract_records, Extraction, RowOutcome};
pub use layout::{infer_layout, LayoutInfo};
pub use raw_table::{load_table, DecodedTable, LoadedTable};
pub use record::{DateWindow, Record};
pub use value_block::ValueColumns;

use crate::summary::{BatchReport, Diagnostics, Summary};

/// Field separator of every meter export we accept.
pub const DELIMITER: u8 = b';';

/// Quarter-hour readings per calendar day.
pub const QUARTER_HOURS_PER_DAY: usize = 96;

/// An uploaded file: the bytes exactly as received plus the name it was declared under.
#[derive(Debug, Clone)]
pub struct RawFile {
    name: String,
    bytes: Vec<u8>,
}

impl RawFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Read `path` fully into memory, naming the file after its final path component.
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes =
            fs::read(path).with_context(|| format!("Failed to read input file {:?}", path))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::new(name, bytes))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Everything one file's pipeline run produced.
///
/// `records` is empty whenever `failure` is set. `summary` is absent when the
/// failure happened before any row was scanned.
#[derive(Debug, Clone)]
pub struct FileReport {
    pub file_name: String,
    pub records: Vec<Record>,
    pub summary: Option<Summary>,
    pub diagnostics: Diagnostics,
    pub failure: Option<ProcessError>,
}

impl FileReport {
    fn new(file_name: &str) -> Self {
        Self {
            file_name: file_name.to_string(),
            records: Vec::new(),
            summary: None,
            diagnostics: Diagnostics::default(),
            failure: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }
}

/// Run the whole pipeline over one file.
///
/// Never fails: fatal conditions are recorded on the returned report instead.
/// `progress` receives the fraction of table rows visited, every 100 rows.
#[instrument(level = "info", skip_all, fields(file = %file.name()))]
pub fn process_file<F>(file: &RawFile, window: &DateWindow, mut progress: F) -> FileReport
where
    F: FnMut(f64),
{
    let mut report = FileReport::new(file.name());

    if let Err(err) = run_pipeline(file, window, &mut progress, &mut report) {
        warn!(error = %err, "file failed");
        report.diagnostics.push_error(err.to_string());
        report.records.clear();
        report.failure = Some(err);
    } else {
        info!(records = report.records.len(), "file processed");
    }

    report
}

fn run_pipeline(
    file: &RawFile,
    window: &DateWindow,
    progress: &mut dyn FnMut(f64),
    report: &mut FileReport,
) -> Result<(), ProcessError> {
    let start = detect_data_start(file.bytes());
    debug!(
        line = start.line,
        codec = %start.codec,
        fallback = start.fallback,
        "data start"
    );

    let loaded = load_table(file.bytes(), start)?;
    let layout = infer_layout(&loaded.table, start)?;
    debug!(
        energy_column = ?layout.energy_column,
        direction_column = layout.direction_column,
        value_columns = %layout.value_columns,
        "layout inferred"
    );

    let extraction = extract_records(&loaded.table, &layout, window, progress);
    report.summary = Some(Summary::build(file.name(), &loaded, &layout, &extraction));

    let Extraction {
        records,
        diagnostics,
        ..
    } = extraction;
    report.diagnostics = diagnostics;

    if records.is_empty() {
        return Err(ProcessError::NoMatchingRows);
    }
    report.records = records;
    Ok(())
}

/// Process every file in input order. With `parallel` set the files are spread
/// over the rayon pool; the report order is the input order either way.
pub fn process_batch(files: &[RawFile], window: &DateWindow, parallel: bool) -> BatchReport {
    let run = |file: &RawFile| {
        process_file(file, window, |fraction| {
            trace!(file = file.name(), fraction, "progress");
        })
    };

    let reports: Vec<FileReport> = if parallel {
        files.par_iter().map(run).collect()
    } else {
        files.iter().map(run).collect()
    };

    BatchReport::new(reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{init_test_logging, meter_file, named_meter_file, qh_values};

    fn full_window() -> DateWindow {
        DateWindow::all_years()
    }

    #[test]
    fn scenario_latin1_file_with_three_header_lines() {
        init_test_logging();
        // "Zählpunkt" in Latin-1 is not valid UTF-8, so both UTF-8 candidates fail.
        let mut bytes = b"Z\xe4hlpunkt;DE0001\nZeitraum;2024\nDatum;Kennzahl;Einheit;Richtung\n"
            .to_vec();
        bytes.extend_from_slice(
            format!("01012024;1-1:1.29.0;KWT;A+;{}\n", qh_values().join(";")).as_bytes(),
        );
        bytes.extend_from_slice(
            format!("01012024;1-1:2.29.0;KWT;I-;{}\n", qh_values().join(";")).as_bytes(),
        );

        let report = process_file(&RawFile::new("latin.csv", bytes), &full_window(), |_| {});

        assert!(report.is_success(), "{:?}", report.diagnostics);
        assert_eq!(report.records.len(), 96);
        let summary = report.summary.expect("summary present");
        assert_eq!(summary.encoding, Codec::Latin1);
        assert_eq!(summary.header_skip_count, 3);
        assert_eq!(summary.counters.rows_processed, 2);
        assert_eq!(summary.counters.rows_skipped_label, 1);
    }

    #[test]
    fn empty_buffer_is_empty_file_without_summary() {
        init_test_logging();
        let report = process_file(&RawFile::new("empty.csv", Vec::new()), &full_window(), |_| {});

        assert_eq!(report.failure, Some(ProcessError::EmptyFile));
        assert!(report.records.is_empty());
        assert!(report.summary.is_none());
        assert_eq!(report.diagnostics.errors, vec!["No data found in file"]);
    }

    #[test]
    fn first_and_last_record_of_a_day() {
        init_test_logging();
        let file = meter_file(&[("01012024", "A+")]);
        let report = process_file(&file, &full_window(), |_| {});

        let first = &report.records[0];
        let last = &report.records[95];
        assert_eq!(first.date_label(), "01/01/2024");
        assert_eq!(first.time_label(), "00:00:00");
        assert_eq!(last.time_label(), "23:45:00");
        assert_eq!(last.value, 95.0 * 0.25);
    }

    #[test]
    fn no_rows_in_window_is_fatal_but_keeps_summary() {
        init_test_logging();
        let file = meter_file(&[("01012023", "A+"), ("02012023", "A-")]);
        let window = DateWindow::for_year(2024).expect("valid year");
        let report = process_file(&file, &window, |_| {});

        assert_eq!(report.failure, Some(ProcessError::NoMatchingRows));
        assert!(report.records.is_empty());
        let summary = report.summary.expect("summary is kept");
        assert_eq!(summary.counters.rows_outside_range, 2);
        assert_eq!(summary.date_range(), "01/01/2023 to 02/01/2023");
        assert_eq!(
            report.diagnostics.errors.last().map(String::as_str),
            Some("No valid A-/A+ rows found in date range")
        );
    }

    #[test]
    fn summary_dates_span_rows_on_both_sides_of_the_window() {
        init_test_logging();
        let file = meter_file(&[("15122023", "A+"), ("01012024", "A+"), ("05022025", "A-")]);
        let window = DateWindow::for_year(2024).expect("valid year");
        let report = process_file(&file, &window, |_| {});

        assert_eq!(report.records.len(), 96);
        let summary = report.summary.expect("summary present");
        assert_eq!(summary.counters.rows_outside_range, 2);
        assert_eq!(summary.date_range(), "15/12/2023 to 05/02/2025");
    }

    #[test]
    fn missing_direction_column_stops_before_scanning_rows() {
        init_test_logging();
        let mut text = String::from("Header\n");
        text.push_str(&format!("01012024;X;KWT;ZZ;{}\n", qh_values().join(";")));
        let report = process_file(&RawFile::new("nodir.csv", text), &full_window(), |_| {});

        assert_eq!(report.failure, Some(ProcessError::DirectionColumnNotFound));
        assert!(report.summary.is_none());
    }

    #[test]
    fn progress_is_reported_every_hundred_rows() {
        init_test_logging();
        let rows: Vec<(&str, &str)> = (0..250).map(|_| ("01012024", "A+")).collect();
        let file = meter_file(&rows);
        let mut seen = Vec::new();
        let report = process_file(&file, &full_window(), |f| seen.push(f));

        assert!(report.is_success());
        assert_eq!(seen, vec![0.0, 100.0 / 250.0, 200.0 / 250.0]);
    }

    #[test]
    fn rerunning_yields_identical_output() {
        init_test_logging();
        let file = meter_file(&[("01012024", "A+"), ("bad", "A-"), ("02012024", "a-")]);
        let first = process_file(&file, &full_window(), |_| {});
        let second = process_file(&file, &full_window(), |_| {});

        assert_eq!(first.records, second.records);
        assert_eq!(first.summary, second.summary);
        assert_eq!(first.diagnostics, second.diagnostics);
    }

    #[test]
    fn batch_keeps_input_order_and_isolates_failures() {
        init_test_logging();
        let files = vec![
            named_meter_file("a.csv", &[("01012024", "A+")]),
            RawFile::new("b.csv", Vec::new()),
            named_meter_file("c.csv", &[("01012024", "A+"), ("02012024", "A-")]),
        ];

        for parallel in [false, true] {
            let batch = process_batch(&files, &full_window(), parallel);
            let names: Vec<&str> = batch.files.iter().map(|r| r.file_name.as_str()).collect();
            assert_eq!(names, vec!["a.csv", "b.csv", "c.csv"]);
            assert_eq!(batch.successful(), 2);
            assert_eq!(batch.failed(), 1);
            assert_eq!(batch.total_records(), 96 * 3);
        }
    }
}
