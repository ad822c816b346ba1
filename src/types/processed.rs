//! The processed record produced by the preprocess stage.

use crate::types::observation::ObservationRecord;
use chrono::NaiveDate;

/// Lag offsets (in days) derived for the target column.
pub const LAGS: [usize; 3] = [1, 7, 14];

/// An observation augmented with calendar, lag and rolling features.
///
/// Exactly one processed record exists per calendar day between the first and
/// the last observation. Lag and rolling features are `None` when the history
/// they need is missing.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedRecord {
    pub observation: ObservationRecord,
    /// Day of week, Monday = 0.
    pub dow: u32,
    /// Month of year, 1-12.
    pub month: u32,
    pub is_weekend: bool,
    pub tavg_lag_1: Option<f64>,
    pub tavg_lag_7: Option<f64>,
    pub tavg_lag_14: Option<f64>,
    /// Mean of the 7 days ending with this one.
    pub tavg_roll_mean_7: Option<f64>,
    /// Sample standard deviation of the 7 days ending with this one.
    pub tavg_roll_std_7: Option<f64>,
    /// Mean of the 30 days ending with this one.
    pub tavg_roll_mean_30: Option<f64>,
    /// Whether the day belongs to the trailing evaluation period.
    pub is_test: bool,
}

impl ProcessedRecord {
    pub fn date(&self) -> NaiveDate {
        self.observation.date
    }

    pub fn tavg(&self) -> Option<f64> {
        self.observation.tavg
    }
}
