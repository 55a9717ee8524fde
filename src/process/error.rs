use thiserror::Error;

use crate::process::encoding::DecodeError;

/// Conditions that stop the processing of a single file.
///
/// The `Display` text is what ends up in the file's diagnostics, so it is written
/// for direct display to whoever uploaded the file.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProcessError {
    #[error("Failed to read file: {0}")]
    ReadFailure(#[from] DecodeError),

    #[error("No data found in file")]
    EmptyFile,

    #[error("Could not find A+/A- direction column")]
    DirectionColumnNotFound,

    #[error("Could not find exactly {expected} quarter-hourly value columns (found {found})")]
    ValueColumnsNotFound { expected: usize, found: usize },

    #[error("No valid A-/A+ rows found in date range")]
    NoMatchingRows,
}
