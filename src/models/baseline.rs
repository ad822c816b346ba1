//! Baselines every other model has to beat.

use crate::models::error::ModelError;
use log::debug;

/// Repeats the last training value.
pub fn naive(train: &[f64], horizon: usize) -> Result<Vec<f64>, ModelError> {
    let last = *train.last().ok_or(ModelError::InsufficientData {
        model: "naive",
        needed: 1,
        got: 0,
    })?;
    Ok(vec![last; horizon])
}

/// Repeats the last full season: step `h` takes the value one (or more)
/// periods before it. Falls back to [`naive`] when the training slice is
/// shorter than a period.
pub fn seasonal_naive(
    train: &[f64],
    horizon: usize,
    period: usize,
) -> Result<Vec<f64>, ModelError> {
    let n = train.len();
    if period == 0 || n < period {
        debug!(
            "Training slice of {} values is shorter than period {}; using naive",
            n, period
        );
        return naive(train, horizon);
    }
    Ok((1..=horizon)
        .map(|h| {
            let back = period * ((h - 1) / period + 1);
            train[n + h - 1 - back]
        })
        .collect())
}
