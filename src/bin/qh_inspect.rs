// src/bin/qh_inspect.rs
//
// Print the layout detected in each meter export without extracting any rows.
use anyhow::{Context, Result};
use clap::Parser;
use qhtranspose::{
    config::expand_inputs,
    process::{
        detect_data_start, infer_layout,
        labels::{locate_direction_column, locate_energy_column},
        load_table, RawFile,
    },
};
use std::process::exit;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Debug, Parser)]
#[command(name = "qh_inspect", about = "Show the detected layout of meter exports")]
struct InspectArgs {
    /// Input files or glob patterns.
    #[arg(required = true)]
    inputs: Vec<String>,

    /// Emit one JSON object per file instead of the text report.
    #[arg(long)]
    json: bool,
}

fn main() {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt::Subscriber::builder().with_env_filter(env).init();

    let args = InspectArgs::parse();
    if let Err(e) = run(&args) {
        eprintln!("Error: {:#}", e);
        exit(1);
    }
}

fn run(args: &InspectArgs) -> Result<()> {
    for path in expand_inputs(&args.inputs)? {
        let file = match RawFile::read(&path) {
            Ok(file) => file,
            Err(e) => {
                eprintln!("Error: {:#}", e);
                continue;
            }
        };
        inspect(&file, args.json)?;
    }
    Ok(())
}

fn inspect(file: &RawFile, json: bool) -> Result<()> {
    let start = detect_data_start(file.bytes());
    let loaded = match load_table(file.bytes(), start) {
        Ok(loaded) => loaded,
        Err(e) => {
            println!("=== {} ===\n  failed: {}\n", file.name(), e);
            return Ok(());
        }
    };
    let layout = infer_layout(&loaded.table, start);

    if json {
        let doc = serde_json::json!({
            "file": file.name(),
            "rows": loaded.table.len(),
            "width": loaded.table.width(),
            "removed_headers": loaded.removed_markers,
            "skipped_lines": loaded.skipped_lines,
            "energy_match": locate_energy_column(&loaded.table),
            "direction_match": locate_direction_column(&loaded.table),
            "layout": layout.as_ref().ok(),
            "error": layout.as_ref().err().map(ToString::to_string),
        });
        println!(
            "{}",
            serde_json::to_string(&doc).context("serializing inspection report")?
        );
        return Ok(());
    }

    println!("=== {} ===", file.name());
    println!("{: <22} {}", "Encoding:", start.codec);
    println!(
        "{: <22} {}{}",
        "Header lines:",
        start.line,
        if start.fallback { " (fallback)" } else { "" }
    );
    println!(
        "{: <22} {} x {}",
        "Table:",
        loaded.table.len(),
        loaded.table.width()
    );
    println!("{: <22} {}", "Section markers:", loaded.removed_markers);
    println!("{: <22} {}", "Skipped lines:", loaded.skipped_lines);
    match locate_energy_column(&loaded.table) {
        Some(m) => println!("{: <22} {} ({} hits)", "Energy column:", m.index, m.hits),
        None => println!("{: <22} -", "Energy column:"),
    }
    match locate_direction_column(&loaded.table) {
        Some(m) => println!("{: <22} {} ({} hits)", "Direction column:", m.index, m.hits),
        None => println!("{: <22} -", "Direction column:"),
    }
    match &layout {
        Ok(layout) => println!("{: <22} {}", "Value columns:", layout.value_columns),
        Err(e) => println!("{: <22} {}", "Layout error:", e),
    }
    println!();
    Ok(())
}
