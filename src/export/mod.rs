// src/export/mod.rs
use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
};
use tracing::{info, instrument, warn};

use crate::summary::BatchReport;

pub mod archive;
pub mod columnar;
pub mod delimited;
pub mod report;

pub use archive::bundle_zip;
pub use columnar::write_parquet;
pub use delimited::write_csv;
pub use report::write_batch_summary;

/// Column headers of every exported record table.
pub const RECORD_COLUMNS: [&str; 3] = ["Timestamp", "Time", "Value [kWh]"];

pub const BATCH_SUMMARY_FILE: &str = "batch_summary.json";
pub const DEFAULT_BUNDLE_NAME: &str = "qh_transpose_output.zip";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Parquet,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Parquet => "parquet",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOptions {
    pub output_dir: PathBuf,
    pub formats: Vec<ExportFormat>,
    /// File name of the ZIP bundle inside `output_dir`, if one is wanted.
    pub bundle: Option<String>,
}

/// `"meter_2024.csv"` → `"meter_2024_cleaned"`.
pub fn output_stem(file_name: &str) -> String {
    let stem = Path::new(file_name)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| file_name.to_string());
    format!("{}_cleaned", stem)
}

/// Hands out output stems, suffixing `_2`, `_3`, ... when two inputs share a stem
/// (e.g. `a/meter.csv` and `b/meter.csv`).
#[derive(Debug, Default)]
struct StemAllocator {
    used: HashSet<String>,
}

impl StemAllocator {
    fn allocate(&mut self, file_name: &str) -> String {
        let base = output_stem(file_name);
        let mut candidate = base.clone();
        let mut n = 1;
        while !self.used.insert(candidate.clone()) {
            n += 1;
            candidate = format!("{}_{}", base, n);
        }
        if n > 1 {
            warn!(file = file_name, stem = %candidate, "output name already used; renamed");
        }
        candidate
    }
}

/// Write every successful file's records in each requested format, then the
/// batch summary, then (optionally) a ZIP holding all of the above.
///
/// Returns the paths written, in the order they were written.
#[instrument(level = "info", skip_all, fields(dir = %options.output_dir.display()))]
pub fn export_batch(batch: &BatchReport, options: &ExportOptions) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(&options.output_dir)
        .with_context(|| format!("creating output directory {:?}", options.output_dir))?;

    let mut written = Vec::new();
    let mut stems = StemAllocator::default();
    for report in batch.files.iter().filter(|r| r.is_success()) {
        let stem = stems.allocate(&report.file_name);
        for format in &options.formats {
            let path = options
                .output_dir
                .join(format!("{}.{}", stem, format.extension()));
            match format {
                ExportFormat::Csv => write_csv(&path, &report.records)?,
                ExportFormat::Parquet => {
                    write_parquet(&path, &report.records)?;
                }
            }
            info!(path = %path.display(), records = report.records.len(), "exported");
            written.push(path);
        }
    }

    let summary_path = options.output_dir.join(BATCH_SUMMARY_FILE);
    write_batch_summary(&summary_path, batch)?;
    written.push(summary_path);

    if let Some(name) = &options.bundle {
        let zip_path = options.output_dir.join(name);
        bundle_zip(&zip_path, &written)?;
        info!(path = %zip_path.display(), files = written.len(), "bundled");
        written.push(zip_path);
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::{process_batch, DateWindow, RawFile};
    use crate::testutil::{init_test_logging, named_meter_file};
    use tempfile::TempDir;

    #[test]
    fn stems() {
        assert_eq!(output_stem("meter_2024.csv"), "meter_2024_cleaned");
        assert_eq!(output_stem("archive.tar.csv"), "archive.tar_cleaned");
        assert_eq!(output_stem("noext"), "noext_cleaned");
    }

    #[test]
    fn clashing_stems_get_numbered() {
        let mut stems = StemAllocator::default();
        assert_eq!(stems.allocate("meter.csv"), "meter_cleaned");
        assert_eq!(stems.allocate("meter.CSV"), "meter_cleaned_2");
        assert_eq!(stems.allocate("meter_cleaned_3.csv"), "meter_cleaned_3_cleaned");
        assert_eq!(stems.allocate("meter.txt"), "meter_cleaned_3");
        assert_eq!(stems.allocate("other.csv"), "other_cleaned");
    }

    #[test]
    fn same_named_inputs_are_all_exported_and_bundled() -> Result<()> {
        init_test_logging();
        let dir = TempDir::new()?;
        let batch = process_batch(
            &[
                named_meter_file("meter.csv", &[("01012024", "A+")]),
                named_meter_file("meter.csv", &[("01012024", "A+"), ("02012024", "A-")]),
            ],
            &DateWindow::all_years(),
            false,
        );
        let options = ExportOptions {
            output_dir: dir.path().to_path_buf(),
            formats: vec![ExportFormat::Csv],
            bundle: Some(DEFAULT_BUNDLE_NAME.to_string()),
        };

        let written = export_batch(&batch, &options)?;

        assert_eq!(written[0], dir.path().join("meter_cleaned.csv"));
        assert_eq!(written[1], dir.path().join("meter_cleaned_2.csv"));
        let second = fs::read_to_string(&written[1])?;
        assert_eq!(second.lines().count(), 1 + 2 * 96);
        assert!(dir.path().join(DEFAULT_BUNDLE_NAME).is_file());
        Ok(())
    }

    #[test]
    fn exports_only_successful_files() -> Result<()> {
        init_test_logging();
        let dir = TempDir::new()?;
        let batch = process_batch(
            &[
                named_meter_file("good.csv", &[("01012024", "A+")]),
                RawFile::new("bad.csv", Vec::new()),
            ],
            &DateWindow::all_years(),
            false,
        );
        let options = ExportOptions {
            output_dir: dir.path().join("out"),
            formats: vec![ExportFormat::Csv, ExportFormat::Parquet],
            bundle: Some(DEFAULT_BUNDLE_NAME.to_string()),
        };

        let written = export_batch(&batch, &options)?;
        let names: Vec<String> = written
            .iter()
            .filter_map(|p| p.file_name())
            .map(|n| n.to_string_lossy().to_string())
            .collect();
        assert_eq!(
            names,
            vec![
                "good_cleaned.csv",
                "good_cleaned.parquet",
                BATCH_SUMMARY_FILE,
                DEFAULT_BUNDLE_NAME
            ]
        );
        assert!(written.iter().all(|p| p.is_file()));
        Ok(())
    }
}
