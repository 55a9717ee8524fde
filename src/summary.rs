// src/summary.rs
use chrono::NaiveDate;
use serde::Serialize;

use crate::process::{Codec, Extraction, FileReport, LayoutInfo, LoadedTable};

/// Human-readable messages collected while processing one file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Diagnostics {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl Diagnostics {
    pub fn push_error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }
}

/// Per-row tallies from the extractor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RowCounters {
    pub rows_processed: usize,
    pub rows_skipped_label: usize,
    pub rows_skipped_date: usize,
    pub rows_outside_range: usize,
}

/// What was learned about one file: its layout and how its rows fared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub file_name: String,
    pub encoding: Codec,
    pub header_skip_count: usize,
    pub fallback_offset: bool,
    pub removed_headers: usize,
    pub skipped_lines: usize,
    pub energy_column: Option<usize>,
    pub direction_column: usize,
    pub first_value_column: usize,
    pub last_value_column: usize,
    #[serde(flatten)]
    pub counters: RowCounters,
    pub valid_records: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
}

impl Summary {
    pub fn build(
        file_name: &str,
        loaded: &LoadedTable,
        layout: &LayoutInfo,
        extraction: &Extraction,
    ) -> Self {
        Self {
            file_name: file_name.to_string(),
            encoding: layout.encoding,
            header_skip_count: layout.header_skip_count,
            fallback_offset: layout.fallback_offset,
            removed_headers: loaded.removed_markers,
            skipped_lines: loaded.skipped_lines,
            energy_column: layout.energy_column,
            direction_column: layout.direction_column,
            first_value_column: layout.value_columns.first(),
            last_value_column: layout.value_columns.last(),
            counters: extraction.counters,
            valid_records: extraction.records.len(),
            first_date: extraction.first_date,
            last_date: extraction.last_date,
        }
    }

    /// `"DD/MM/YYYY to DD/MM/YYYY"`, or `"N/A"` when no row had a readable date.
    pub fn date_range(&self) -> String {
        match (self.first_date, self.last_date) {
            (Some(first), Some(last)) => format!(
                "{} to {}",
                first.format("%d/%m/%Y"),
                last.format("%d/%m/%Y")
            ),
            _ => "N/A".to_string(),
        }
    }

    pub fn value_columns_range(&self) -> String {
        format!("{} to {}", self.first_value_column, self.last_value_column)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Success,
    Failed,
}

/// One line of the batch results table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileResult {
    pub file: String,
    pub status: FileStatus,
    pub records: usize,
}

/// Reports for a whole batch, in input order.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub files: Vec<FileReport>,
}

impl BatchReport {
    pub fn new(files: Vec<FileReport>) -> Self {
        Self { files }
    }

    pub fn successful(&self) -> usize {
        self.files.iter().filter(|f| f.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.files.len() - self.successful()
    }

    pub fn total_records(&self) -> usize {
        self.files.iter().map(|f| f.records.len()).sum()
    }

    pub fn results(&self) -> Vec<FileResult> {
        self.files
            .iter()
            .map(|f| FileResult {
                file: f.file_name.clone(),
                status: if f.is_success() {
                    FileStatus::Success
                } else {
                    FileStatus::Failed
                },
                records: f.records.len(),
            })
            .collect()
    }
}
