use crate::frame::FrameError;
use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PreprocessError {
    #[error("Input contains no observations")]
    EmptyInput,

    #[error("Date {0} appears more than once in the input")]
    DuplicateDate(NaiveDate),

    #[error(transparent)]
    Frame(#[from] FrameError),
}
