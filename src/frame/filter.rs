use crate::frame::DATE_FORMAT;
use chrono::NaiveDate;
use polars::prelude::{col, lit, LazyFrame};

pub trait DailyFrameFilterExt {
    /// Keeps the rows whose `date` column lies in `start..=end`.
    ///
    /// Dates are stored as ISO 8601 strings, which sort the same way as the
    /// dates they encode. Errors surface on `collect`.
    fn filter_daily(self, start: NaiveDate, end: NaiveDate) -> LazyFrame;
}

impl DailyFrameFilterExt for LazyFrame {
    fn filter_daily(self, start: NaiveDate, end: NaiveDate) -> LazyFrame {
        let start = start.format(DATE_FORMAT).to_string();
        let end = end.format(DATE_FORMAT).to_string();
        self.filter(
            col("date")
                .gt_eq(lit(start))
                .and(col("date").lt_eq(lit(end))),
        )
    }
}
