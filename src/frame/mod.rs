//! Tabular file I/O for the pipeline.
//!
//! Every stage talks to the next one through delimited text files with a header
//! row and ISO 8601 dates. Files are read into a Polars [`DataFrame`] and
//! converted to typed records, so a malformed file fails here with a
//! descriptive [`FrameError`] instead of deep inside a computation.
//!
//! [`DataFrame`]: polars::frame::DataFrame

pub mod error;
pub mod filter;
pub mod reader;
pub mod records;
pub mod writer;

pub use error::FrameError;
pub use filter::DailyFrameFilterExt;
pub use reader::{read_csv, ColumnReader};
pub use records::{
    observations_from_frame, observations_to_frame, processed_to_frame, read_observations,
    read_processed, write_observations, write_processed,
};
pub use writer::write_csv;

/// Date format used in every file.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Columns of a raw observation file, in output order.
pub const OBSERVATION_COLUMNS: [&str; 9] = [
    "date", "tmin", "tmax", "tavg", "precip", "wind_max", "location", "lat", "lon",
];

/// Columns appended by the preprocess stage, in output order.
pub const FEATURE_COLUMNS: [&str; 10] = [
    "dow",
    "month",
    "is_weekend",
    "tavg_lag_1",
    "tavg_lag_7",
    "tavg_lag_14",
    "tavg_roll_mean_7",
    "tavg_roll_std_7",
    "tavg_roll_mean_30",
    "is_test",
];
