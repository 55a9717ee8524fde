pub mod config;
pub mod export;
pub mod process;
pub mod summary;

#[cfg(test)]
pub(crate) mod testutil;

pub use process::{process_batch, process_file, DateWindow, FileReport, RawFile, Record};
pub use summary::{BatchReport, Diagnostics, Summary};
