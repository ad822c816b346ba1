//! Turns a raw observation file into a model-ready daily table.
//!
//! The output has exactly one row per calendar day between the first and
//! the last observation, short interior gaps interpolated, and the calendar,
//! lag and rolling features every model consumes.

pub mod error;
pub mod features;
pub mod resample;

use crate::config::PreprocessConfig;
use crate::frame::{read_observations, write_processed};
use crate::preprocess::error::PreprocessError;
use crate::preprocess::features::{
    calendar, lag, rolling_mean, rolling_std, LONG_WINDOW, SHORT_WINDOW,
};
use crate::preprocess::resample::{fill_location, fill_numeric_gaps, reindex_daily};
use crate::types::observation::ObservationRecord;
use crate::types::processed::{ProcessedRecord, LAGS};
use bon::Builder;
use log::{debug, info, warn};
use std::path::Path;

#[derive(Debug, Clone, Builder)]
pub struct Preprocessor {
    /// Longest interior run of missing days that is interpolated.
    #[builder(default = 3)]
    max_gap_days: usize,
    /// Trailing days flagged `is_test`.
    #[builder(default = 365)]
    test_days: usize,
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl From<&PreprocessConfig> for Preprocessor {
    fn from(config: &PreprocessConfig) -> Self {
        Self::builder()
            .max_gap_days(config.max_gap_days)
            .test_days(config.test_days)
            .build()
    }
}

impl Preprocessor {
    /// Reindexes, fills gaps and derives features.
    ///
    /// Running this on its own output returns the same rows.
    pub fn run(
        &self,
        records: Vec<ObservationRecord>,
    ) -> Result<Vec<ProcessedRecord>, PreprocessError> {
        let input_rows = records.len();
        let mut daily = reindex_daily(records)?;
        if daily.len() > input_rows {
            debug!("Inserted {} missing days", daily.len() - input_rows);
        }

        let filled = fill_numeric_gaps(&mut daily, self.max_gap_days);
        if filled > 0 {
            debug!("Interpolated {} missing values", filled);
        }
        fill_location(&mut daily);

        let remaining = daily.iter().filter(|r| r.tavg.is_none()).count();
        if remaining > 0 {
            warn!(
                "{} days still have no tavg after filling gaps of up to {} days",
                remaining, self.max_gap_days
            );
        }

        let tavg: Vec<Option<f64>> = daily.iter().map(|r| r.tavg).collect();
        let test_start = daily.len().saturating_sub(self.test_days);

        Ok(daily
            .into_iter()
            .enumerate()
            .map(|(t, observation)| {
                let (dow, month, is_weekend) = calendar(observation.date);
                ProcessedRecord {
                    observation,
                    dow,
                    month,
                    is_weekend,
                    tavg_lag_1: lag(&tavg, t, LAGS[0]),
                    tavg_lag_7: lag(&tavg, t, LAGS[1]),
                    tavg_lag_14: lag(&tavg, t, LAGS[2]),
                    tavg_roll_mean_7: rolling_mean(&tavg, t, SHORT_WINDOW),
                    tavg_roll_std_7: rolling_std(&tavg, t, SHORT_WINDOW),
                    tavg_roll_mean_30: rolling_mean(&tavg, t, LONG_WINDOW),
                    is_test: t >= test_start,
                }
            })
            .collect())
    }

    /// Reads a raw (or already processed) file and writes the processed table.
    /// Returns the number of rows written.
    pub fn process_file(&self, input: &Path, output: &Path) -> Result<usize, PreprocessError> {
        let records = read_observations(input)?;
        let processed = self.run(records)?;
        write_processed(&processed, output)?;
        info!("Wrote {} processed rows to {:?}", processed.len(), output);
        Ok(processed.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::read_processed;
    use chrono::{Days, NaiveDate};

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 1, 2).unwrap()
    }

    fn synthetic(days: u64) -> Vec<ObservationRecord> {
        (0..days)
            .map(|i| {
                let mut r = ObservationRecord::empty(start() + Days::new(i));
                r.tmin = Some(i as f64 % 5.0);
                r.tmax = Some(10.0 + i as f64 % 5.0);
                r.tavg = Some(5.0 + i as f64 % 5.0);
                r.location = Some("Austin,US".to_string());
                r
            })
            .collect()
    }

    #[test]
    fn one_row_per_day_with_short_gaps_filled() {
        let mut records = synthetic(40);
        // Remove two days entirely and blank a long stretch of tavg.
        records.remove(10);
        records.remove(10);
        for r in records.iter_mut().skip(20).take(5) {
            r.tavg = None;
        }
        let out = Preprocessor::default().run(records).unwrap();
        assert_eq!(out.len(), 40);
        assert!(out[10].tavg().is_some() && out[11].tavg().is_some());
        assert_eq!(out[10].observation.location.as_deref(), Some("Austin,US"));
        let long_gap = out.iter().filter(|r| r.tavg().is_none()).count();
        assert_eq!(long_gap, 5);
    }

    #[test]
    fn lags_and_trailing_windows() {
        let out = Preprocessor::default().run(synthetic(40)).unwrap();
        assert_eq!(out[0].tavg_lag_1, None);
        assert_eq!(out[7].tavg_lag_7, out[0].tavg());
        assert_eq!(out[14].tavg_lag_14, out[0].tavg());
        assert_eq!(out[5].tavg_roll_mean_7, None);
        // Days 0..=6 have tavg 5,6,7,8,9,5,6; the window includes day 6.
        let first_week: f64 = out[..7].iter().filter_map(|r| r.tavg()).sum();
        assert_eq!(out[6].tavg_roll_mean_7, Some(first_week / 7.0));
        assert_eq!(out[6].tavg_roll_mean_7, Some(46.0 / 7.0));
        assert!(out[6].tavg_roll_std_7.is_some());
        assert!(out[28].tavg_roll_mean_30.is_none());
        assert!(out[29].tavg_roll_mean_30.is_some());
        // 2023-01-02 was a Monday.
        assert_eq!((out[0].dow, out[0].month, out[0].is_weekend), (0, 1, false));
        assert!(out[5].is_weekend);
    }

    #[test]
    fn trailing_days_are_flagged_for_testing() {
        let pre = Preprocessor::builder().test_days(10).build();
        let out = pre.run(synthetic(40)).unwrap();
        assert_eq!(out.iter().filter(|r| r.is_test).count(), 10);
        assert!(out[30..].iter().all(|r| r.is_test));

        let all = Preprocessor::builder().test_days(100).build();
        assert!(all.run(synthetic(40)).unwrap().iter().all(|r| r.is_test));
    }

    #[test]
    fn rejects_duplicates() {
        let mut records = synthetic(5);
        records.push(records[2].clone());
        assert!(matches!(
            Preprocessor::default().run(records),
            Err(PreprocessError::DuplicateDate(_))
        ));
    }

    #[test]
    fn processing_own_output_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let raw = dir.path().join("raw.csv");
        let once = dir.path().join("once.csv");
        let twice = dir.path().join("twice.csv");

        let mut records = synthetic(60);
        records.remove(20);
        for r in records.iter_mut().skip(40).take(6) {
            r.tavg = None;
        }
        crate::frame::write_observations(&records, &raw).unwrap();

        let pre = Preprocessor::builder().test_days(14).build();
        pre.process_file(&raw, &once).unwrap();
        pre.process_file(&once, &twice).unwrap();

        let first = read_processed(&once).unwrap();
        let second = read_processed(&twice).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            std::fs::read_to_string(&once).unwrap(),
            std::fs::read_to_string(&twice).unwrap()
        );
    }
}
