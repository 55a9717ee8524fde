use anyhow::{Context, Result};
use serde::Serialize;
use std::{fs::File, io::BufWriter, path::Path};

use crate::summary::{BatchReport, FileStatus, Summary};

/// JSON view of a batch: the aggregate counts, then one entry per file.
#[derive(Debug, Serialize)]
pub struct BatchSummaryDoc<'a> {
    pub successful: usize,
    pub failed: usize,
    pub total_records: usize,
    pub files: Vec<FileEntry<'a>>,
}

#[derive(Debug, Serialize)]
pub struct FileEntry<'a> {
    pub file: &'a str,
    pub status: FileStatus,
    pub records: usize,
    pub summary: Option<&'a Summary>,
    pub errors: &'a [String],
    pub warnings: &'a [String],
}

impl<'a> BatchSummaryDoc<'a> {
    pub fn new(batch: &'a BatchReport) -> Self {
        let files = batch
            .files
            .iter()
            .zip(batch.results())
            .map(|(report, result)| FileEntry {
                file: &report.file_name,
                status: result.status,
                records: result.records,
                summary: report.summary.as_ref(),
                errors: &report.diagnostics.errors,
                warnings: &report.diagnostics.warnings,
            })
            .collect();

        Self {
            successful: batch.successful(),
            failed: batch.failed(),
            total_records: batch.total_records(),
            files,
        }
    }
}

pub fn write_batch_summary(path: &Path, batch: &BatchReport) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("creating batch summary {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), &BatchSummaryDoc::new(batch))
        .context("serializing batch summary")?;
    Ok(())
}
