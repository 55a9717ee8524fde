// src/config.rs
use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::Deserialize;
use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, warn};

use crate::{
    export::{ExportFormat, ExportOptions, DEFAULT_BUNDLE_NAME},
    process::{date_parser::parse_display_date, DateWindow},
};

pub const DEFAULT_OUTPUT_DIR: &str = "output";

/// Transpose quarter-hour meter exports into one record per reading.
#[derive(Debug, Clone, Parser)]
#[command(name = "qhtranspose", version, about)]
pub struct Args {
    /// Input files or glob patterns (e.g. `data/*.csv`).
    pub inputs: Vec<String>,

    /// Directory the cleaned files and `batch_summary.json` are written to.
    #[arg(short, long, env = "QH_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// YAML file supplying defaults for any of these options.
    #[arg(short, long, env = "QH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Keep only readings from this calendar year.
    #[arg(long, conflicts_with = "all_years")]
    pub year: Option<i32>,

    /// Keep readings from 01/01/2020 to 31/12/2030.
    #[arg(long)]
    pub all_years: bool,

    /// First day of a custom window, DD/MM/YYYY.
    #[arg(long, value_parser = parse_date_arg, requires = "end")]
    pub start: Option<chrono::NaiveDate>,

    /// Last day of a custom window, DD/MM/YYYY.
    #[arg(long, value_parser = parse_date_arg, requires = "start")]
    pub end: Option<chrono::NaiveDate>,

    /// Output formats, comma separated.
    #[arg(short, long, value_enum, value_delimiter = ',')]
    pub formats: Vec<ExportFormat>,

    /// Also bundle every written file into one ZIP archive.
    #[arg(long)]
    pub zip: bool,

    /// File name of the ZIP bundle.
    #[arg(long)]
    pub zip_name: Option<String>,

    /// Process files on all cores.
    #[arg(short, long, env = "QH_PARALLEL")]
    pub parallel: bool,
}

fn parse_date_arg(s: &str) -> Result<chrono::NaiveDate, String> {
    parse_display_date(s).ok_or_else(|| format!("'{}' is not a DD/MM/YYYY date", s))
}

/// The optional YAML config. Every key is optional; command-line values win.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub inputs: Vec<String>,
    pub output_dir: Option<PathBuf>,
    pub year: Option<i32>,
    pub all_years: Option<bool>,
    /// DD/MM/YYYY
    pub start: Option<String>,
    /// DD/MM/YYYY
    pub end: Option<String>,
    pub formats: Option<Vec<ExportFormat>>,
    pub zip: Option<bool>,
    pub zip_name: Option<String>,
    pub parallel: Option<bool>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config file {:?}", path))?;
        serde_yaml::from_str(&text).with_context(|| format!("parsing config file {:?}", path))
    }

    fn window(&self) -> Result<Option<DateWindow>> {
        match (&self.start, &self.end) {
            (Some(start), Some(end)) => {
                let start = parse_display_date(start)
                    .with_context(|| format!("config start '{}' is not DD/MM/YYYY", start))?;
                let end = parse_display_date(end)
                    .with_context(|| format!("config end '{}' is not DD/MM/YYYY", end))?;
                custom_window(start, end).map(Some)
            }
            (None, None) => {
                if self.all_years.unwrap_or(false) {
                    Ok(Some(DateWindow::all_years()))
                } else {
                    self.year.map(year_window).transpose()
                }
            }
            _ => bail!("config must set both `start` and `end`, or neither"),
        }
    }
}

/// Fully resolved run settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub inputs: Vec<String>,
    pub window: DateWindow,
    pub export: ExportOptions,
    pub parallel: bool,
}

impl Settings {
    /// Merge `args` over the config file it names (if any).
    ///
    /// The date window is the first of: `--start/--end`, `--all-years`, `--year`,
    /// then the same keys from the config file, then `current_year`.
    pub fn resolve(args: Args, current_year: i32) -> Result<Self> {
        let file = match &args.config {
            Some(path) => {
                let cfg = FileConfig::load(path)?;
                debug!(path = %path.display(), "config loaded");
                cfg
            }
            None => FileConfig::default(),
        };
        Self::merge(args, file, current_year)
    }

    pub fn merge(args: Args, file: FileConfig, current_year: i32) -> Result<Self> {
        let window = match cli_window(&args)? {
            Some(window) => window,
            None => match file.window()? {
                Some(window) => window,
                None => year_window(current_year)?,
            },
        };

        let inputs = if args.inputs.is_empty() {
            file.inputs
        } else {
            args.inputs
        };
        if inputs.is_empty() {
            bail!("no input files given");
        }

        let mut formats = if args.formats.is_empty() {
            file.formats.unwrap_or_else(|| vec![ExportFormat::Csv])
        } else {
            args.formats
        };
        let mut seen = HashSet::new();
        formats.retain(|f| seen.insert(*f));
        if formats.is_empty() {
            warn!("no export formats selected; only the batch summary is written");
        }

        let bundle = (args.zip || file.zip.unwrap_or(false)).then(|| {
            args.zip_name
                .or(file.zip_name)
                .unwrap_or_else(|| DEFAULT_BUNDLE_NAME.to_string())
        });

        Ok(Self {
            inputs,
            window,
            export: ExportOptions {
                output_dir: args
                    .output_dir
                    .or(file.output_dir)
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
                formats,
                bundle,
            },
            parallel: args.parallel || file.parallel.unwrap_or(false),
        })
    }
}

fn cli_window(args: &Args) -> Result<Option<DateWindow>> {
    if let (Some(start), Some(end)) = (args.start, args.end) {
        return custom_window(start, end).map(Some);
    }
    if args.all_years {
        return Ok(Some(DateWindow::all_years()));
    }
    args.year.map(year_window).transpose()
}

fn custom_window(start: chrono::NaiveDate, end: chrono::NaiveDate) -> Result<DateWindow> {
    DateWindow::new(start, end).with_context(|| {
        format!(
            "start date {} is after end date {}",
            start.format("%d/%m/%Y"),
            end.format("%d/%m/%Y")
        )
    })
}

fn year_window(year: i32) -> Result<DateWindow> {
    DateWindow::for_year(year).with_context(|| format!("year {} is out of range", year))
}

/// Expand each input as a glob pattern; inputs without glob metacharacters pass
/// through unchanged so a missing plain path is reported by the reader.
pub fn expand_inputs(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for pattern in patterns {
        if !pattern.contains(['*', '?', '[']) {
            paths.push(PathBuf::from(pattern));
            continue;
        }
        let mut matched = 0;
        for entry in glob::glob(pattern).with_context(|| format!("bad glob pattern {}", pattern))? {
            let path = entry.with_context(|| format!("expanding {}", pattern))?;
            if path.is_file() {
                paths.push(path);
                matched += 1;
            }
        }
        if matched == 0 {
            warn!(pattern = %pattern, "pattern matched no files");
        }
    }
    Ok(paths)
}
