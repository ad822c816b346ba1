//! Rolling-origin evaluation windows.

use crate::backtest::error::BacktestError;
use clap::ValueEnum;
use std::fmt;
use std::ops::Range;

/// How the training slice grows as the origin moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum WindowKind {
    /// Train on everything before the origin.
    #[default]
    Expanding,
    /// Train on a fixed number of days before the origin.
    Sliding,
}

impl fmt::Display for WindowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WindowKind::Expanding => f.write_str("expanding"),
            WindowKind::Sliding => f.write_str("sliding"),
        }
    }
}

/// One train/test split. Both ranges index the target series and never overlap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Window {
    pub index: usize,
    pub train: Range<usize>,
    pub test: Range<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WindowPlan {
    pub horizon: usize,
    pub step: usize,
    pub kind: WindowKind,
    /// Training length of sliding windows.
    pub train_size: usize,
    /// Smallest origin considered.
    pub min_train: usize,
    /// Keep only the last `n` windows.
    pub max_windows: Option<usize>,
}

impl WindowPlan {
    /// Lays out windows over a series of `rows` values. Origins start at
    /// `first_test` (or `min_train` when nothing is flagged for testing),
    /// never before `min_train`, and advance by `step`.
    pub fn windows(
        &self,
        rows: usize,
        first_test: Option<usize>,
    ) -> Result<Vec<Window>, BacktestError> {
        if self.horizon == 0 || self.step == 0 {
            return Err(BacktestError::InvalidSettings(
                "horizon and step must be at least 1".into(),
            ));
        }
        if self.kind == WindowKind::Sliding && self.train_size == 0 {
            return Err(BacktestError::InvalidSettings(
                "sliding windows need a training size of at least 1".into(),
            ));
        }

        let mut origin = first_test.unwrap_or(self.min_train).max(self.min_train).max(1);
        if self.kind == WindowKind::Sliding {
            origin = origin.max(self.train_size);
        }
        let first_origin = origin;

        let mut windows = Vec::new();
        while origin + self.horizon <= rows {
            let train_start = match self.kind {
                WindowKind::Expanding => 0,
                WindowKind::Sliding => origin - self.train_size,
            };
            windows.push(Window {
                index: windows.len(),
                train: train_start..origin,
                test: origin..origin + self.horizon,
            });
            origin += self.step;
        }

        if let Some(keep) = self.max_windows {
            let skip = windows.len().saturating_sub(keep);
            windows.drain(..skip);
            for (index, window) in windows.iter_mut().enumerate() {
                window.index = index;
            }
        }

        if windows.is_empty() {
            return Err(BacktestError::NoWindows {
                rows,
                origin: first_origin,
                horizon: self.horizon,
            });
        }
        Ok(windows)
    }
}

/// Number of windows whose training slice is shorter than `len`.
pub fn count_shorter_than(windows: &[Window], len: usize) -> usize {
    windows.iter().filter(|w| w.train.len() < len).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(kind: WindowKind) -> WindowPlan {
        WindowPlan {
            horizon: 7,
            step: 7,
            kind,
            train_size: 30,
            min_train: 20,
            max_windows: None,
        }
    }

    #[test]
    fn expanding_windows_start_at_first_test_row() {
        let windows = plan(WindowKind::Expanding).windows(100, Some(79)).unwrap();
        assert_eq!(windows.len(), 3);
        assert_eq!(windows[0].train, 0..79);
        assert_eq!(windows[0].test, 79..86);
        assert_eq!(windows[2].test, 93..100);
    }

    #[test]
    fn windows_never_overlap_their_training_data() {
        for kind in [WindowKind::Expanding, WindowKind::Sliding] {
            for window in plan(kind).windows(200, None).unwrap() {
                assert!(window.train.end <= window.test.start);
                assert!(!window.train.is_empty());
                assert_eq!(window.test.len(), 7);
            }
        }
    }

    #[test]
    fn sliding_windows_have_fixed_length() {
        let windows = plan(WindowKind::Sliding).windows(100, None).unwrap();
        assert_eq!(windows[0].train, 0..30);
        assert!(windows.iter().all(|w| w.train.len() == 30));
    }

    #[test]
    fn keeps_last_windows_and_renumbers() {
        let mut p = plan(WindowKind::Expanding);
        p.max_windows = Some(2);
        let windows = p.windows(100, Some(20)).unwrap();
        assert_eq!(windows.len(), 2);
        assert_eq!(windows[0].index, 0);
        assert_eq!(windows[1].test.end, 97);
    }

    #[test]
    fn sliding_windows_shorter_than_a_season_are_counted() {
        let windows = plan(WindowKind::Sliding).windows(400, None).unwrap();
        assert_eq!(count_shorter_than(&windows, 365), windows.len());
        assert_eq!(count_shorter_than(&windows, 30), 0);

        let expanding = plan(WindowKind::Expanding).windows(400, Some(360)).unwrap();
        // Origins 360, 367, ...: only the first trains on fewer than 365 days.
        assert_eq!(count_shorter_than(&expanding, 365), 1);
    }

    #[test]
    fn short_series_has_no_windows() {
        assert!(matches!(
            plan(WindowKind::Expanding).windows(25, None),
            Err(BacktestError::NoWindows { rows: 25, origin: 20, horizon: 7 })
        ));
    }
}
