use anyhow::Result;
use chrono::Datelike;
use clap::Parser;
use qhtranspose::{
    config::{expand_inputs, Args, Settings},
    export::export_batch,
    process::{process_batch, FileReport, RawFile},
    summary::{BatchReport, FileStatus},
};
use std::time::Instant;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

/// Warnings logged per file before the rest are folded into a count.
const WARNINGS_SHOWN: usize = 10;

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env).init();

    // ─── 2) resolve settings ─────────────────────────────────────────
    let settings = Settings::resolve(Args::parse(), chrono::Local::now().year())?;
    info!(
        start = %settings.window.start().format("%d/%m/%Y"),
        end = %settings.window.end().format("%d/%m/%Y"),
        output_dir = %settings.export.output_dir.display(),
        parallel = settings.parallel,
        "startup"
    );

    // ─── 3) read inputs ──────────────────────────────────────────────
    let paths = expand_inputs(&settings.inputs)?;
    let files: Vec<RawFile> = paths
        .iter()
        .filter_map(|path| match RawFile::read(path) {
            Ok(file) => Some(file),
            Err(e) => {
                error!("{:#}", e);
                None
            }
        })
        .collect();
    if files.is_empty() {
        anyhow::bail!("none of the {} input paths could be read", paths.len());
    }
    info!("{} files to process", files.len());

    // ─── 4) process ──────────────────────────────────────────────────
    let t0 = Instant::now();
    let batch = process_batch(&files, &settings.window, settings.parallel);
    info!("processed {} files in {:?}", files.len(), t0.elapsed());
    batch.files.iter().for_each(log_outcome);

    // ─── 5) export ───────────────────────────────────────────────────
    let written = export_batch(&batch, &settings.export)?;
    info!(
        "wrote {} files to {}",
        written.len(),
        settings.export.output_dir.display()
    );

    // ─── 6) summary table ────────────────────────────────────────────
    print_batch_table(&batch);
    Ok(())
}

fn log_outcome(report: &FileReport) {
    let file = report.file_name.as_str();

    for message in &report.diagnostics.errors {
        error!(file, "{}", message);
    }
    for message in report.diagnostics.warnings.iter().take(WARNINGS_SHOWN) {
        warn!(file, "{}", message);
    }
    let hidden = report.diagnostics.warnings.len().saturating_sub(WARNINGS_SHOWN);
    if hidden > 0 {
        warn!(file, "... and {} more", hidden);
    }

    if let Some(summary) = &report.summary {
        if summary.removed_headers > 0 {
            info!(file, "removed {} section header rows", summary.removed_headers);
        }
        info!(
            file,
            encoding = %summary.encoding,
            header_skip = summary.header_skip_count,
            direction_column = summary.direction_column,
            value_columns = %summary.value_columns_range(),
            rows = summary.counters.rows_processed,
            records = summary.valid_records,
            dates = %summary.date_range(),
            "summary"
        );
        if summary.fallback_offset {
            warn!(file, "no date line found; assumed {} header lines", summary.header_skip_count);
        }
    }
}

fn print_batch_table(batch: &BatchReport) {
    println!("\n=== Batch summary ===");
    println!("{: <20} {:>10}", "Successful", batch.successful());
    println!("{: <20} {:>10}", "Failed", batch.failed());
    println!("{: <20} {:>10}", "Total records", batch.total_records());
    println!();
    println!("{: <40} {: <10} {:>10}", "File", "Status", "Records");
    for result in batch.results() {
        let status = match result.status {
            FileStatus::Success => "success",
            FileStatus::Failed => "failed",
        };
        println!("{: <40} {: <10} {:>10}", result.file, status, result.records);
    }
}
