use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("Input file '{0}' does not exist")]
    MissingFile(PathBuf),

    #[error("Failed to parse CSV file '{path}'")]
    CsvRead {
        path: PathBuf,
        #[source]
        source: PolarsError,
    },

    #[error("Failed to write CSV file '{path}'")]
    CsvWrite {
        path: PathBuf,
        #[source]
        source: PolarsError,
    },

    #[error("I/O error on '{0}'")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Failed to move finished file into place at '{0}'")]
    Persist(PathBuf, #[source] tempfile::PersistError),

    #[error("Required column '{column}' not found in '{path}'")]
    MissingColumn { path: PathBuf, column: String },

    #[error("Row {row} of '{path}' has no date")]
    MissingDate { path: PathBuf, row: usize },

    #[error("Row {row} of '{path}' has an invalid date '{value}', expected YYYY-MM-DD")]
    InvalidDate {
        path: PathBuf,
        row: usize,
        value: String,
    },

    #[error("Row {row} of '{path}' has a non-numeric value '{value}' in column '{column}'")]
    InvalidNumber {
        path: PathBuf,
        column: String,
        row: usize,
        value: String,
    },

    #[error("Failed processing DataFrame: {0}")]
    DataFrameProcessing(#[from] PolarsError),
}
