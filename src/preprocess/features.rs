//! Feature derivation shared by the preprocess stage and the ridge model.
//!
//! A rolling statistic at day `t` covers the window ending at `t` itself,
//! as written to the processed file. Model regressors for day `t` take the
//! window ending at `t - 1`, so no regressor contains the value it predicts.

use chrono::{Datelike, NaiveDate};

/// Window lengths of the rolling statistics.
pub const SHORT_WINDOW: usize = 7;
pub const LONG_WINDOW: usize = 30;

/// Day of week (Monday = 0), month (1-12) and weekend flag.
pub fn calendar(date: NaiveDate) -> (u32, u32, bool) {
    let dow = date.weekday().num_days_from_monday();
    (dow, date.month(), dow >= 5)
}

/// `values[t - k]`, or `None` before the start of the series.
pub fn lag(values: &[Option<f64>], t: usize, k: usize) -> Option<f64> {
    t.checked_sub(k).and_then(|i| values.get(i).copied().flatten())
}

/// The `window` values ending at `t` (inclusive), or `None` if any is missing
/// or out of range.
fn window_ending_at(values: &[Option<f64>], t: usize, window: usize) -> Option<Vec<f64>> {
    let start = (t + 1).checked_sub(window)?;
    values.get(start..=t)?.iter().copied().collect()
}

/// Mean of the `window` values ending at `t`.
pub fn rolling_mean(values: &[Option<f64>], t: usize, window: usize) -> Option<f64> {
    let w = window_ending_at(values, t, window)?;
    Some(w.iter().sum::<f64>() / w.len() as f64)
}

/// Sample standard deviation (n - 1) of the `window` values ending at `t`.
pub fn rolling_std(values: &[Option<f64>], t: usize, window: usize) -> Option<f64> {
    if window < 2 {
        return None;
    }
    let w = window_ending_at(values, t, window)?;
    let mean = w.iter().sum::<f64>() / w.len() as f64;
    let var = w.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (w.len() - 1) as f64;
    Some(var.sqrt())
}

/// Regressors for day `t` of `values` dated `date`, in the order
/// lag 1, lag 7, lag 14, rolling mean 7, rolling std 7, rolling mean 30,
/// day of week, month, weekend flag.
///
/// Rolling statistics are those of the previous day. `None` when any
/// history-based feature is unavailable.
pub fn regressors(values: &[Option<f64>], t: usize, date: NaiveDate) -> Option<[f64; 9]> {
    let (dow, month, weekend) = calendar(date);
    let prev = t.checked_sub(1)?;
    Some([
        lag(values, t, 1)?,
        lag(values, t, 7)?,
        lag(values, t, 14)?,
        rolling_mean(values, prev, SHORT_WINDOW)?,
        rolling_std(values, prev, SHORT_WINDOW)?,
        rolling_mean(values, prev, LONG_WINDOW)?,
        dow as f64,
        month as f64,
        if weekend { 1.0 } else { 0.0 },
    ])
}

/// Number of regressors returned by [`regressors`].
pub const N_REGRESSORS: usize = 9;

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn series(n: usize) -> Vec<Option<f64>> {
        (0..n).map(|i| Some(i as f64)).collect()
    }

    #[test]
    fn calendar_starts_week_on_monday() {
        // 2024-01-01 was a Monday, 2024-01-06 a Saturday.
        let day = |m, d| NaiveDate::from_ymd_opt(2024, m, d).unwrap();
        assert_eq!(calendar(day(1, 1)), (0, 1, false));
        assert_eq!(calendar(day(1, 6)), (5, 1, true));
        assert_eq!(calendar(day(12, 29)), (6, 12, true));
    }

    #[test]
    fn lags_respect_series_start_and_gaps() {
        let mut v = series(20);
        assert_eq!(lag(&v, 0, 1), None);
        assert_eq!(lag(&v, 7, 7), Some(0.0));
        assert_eq!(lag(&v, 15, 14), Some(1.0));
        v[3] = None;
        assert_eq!(lag(&v, 4, 1), None);
    }

    #[test]
    fn rolling_windows_end_at_current_day() {
        let v = series(40);
        assert_eq!(rolling_mean(&v, 5, 7), None);
        assert_abs_diff_eq!(rolling_mean(&v, 6, 7).unwrap(), 3.0);
        // Sample std of 0..=6.
        assert_abs_diff_eq!(
            rolling_std(&v, 6, 7).unwrap(),
            (28.0f64 / 6.0).sqrt(),
            epsilon = 1e-12
        );
        assert_abs_diff_eq!(rolling_mean(&v, 29, 30).unwrap(), 14.5);
    }

    #[test]
    fn missing_value_in_window_blanks_statistic() {
        let mut v = series(10);
        v[5] = None;
        assert_eq!(rolling_mean(&v, 8, 7), None);
        assert_eq!(rolling_std(&v, 8, 7), None);
        assert!(rolling_mean(&v, 4, 5).is_some());
    }

    #[test]
    fn regressors_need_thirty_days_of_history() {
        let v = series(40);
        let date = NaiveDate::from_ymd_opt(2024, 1, 6).unwrap();
        assert!(regressors(&v, 29, date).is_none());
        let x = regressors(&v, 30, date).unwrap();
        assert_eq!(x.len(), N_REGRESSORS);
        assert_eq!(x[0], 29.0);
        assert_eq!(x[1], 23.0);
        assert_eq!(x[2], 16.0);
        // Rolling regressors end the day before: mean of 23..=29.
        assert_abs_diff_eq!(x[3], 26.0);
        assert_abs_diff_eq!(x[5], 14.5);
        assert_eq!(x[6..], [5.0, 1.0, 1.0]);
    }
}
