//! Rolling-origin backtesting of the forecasting models.

pub mod error;
pub mod metrics;
pub mod tables;
pub mod windows;

use crate::backtest::error::BacktestError;
use crate::backtest::metrics::ErrorMetrics;
use crate::backtest::tables::{upsert_metrics, write_predictions, write_windows, MetricsRow};
use crate::backtest::windows::{count_shorter_than, WindowKind, WindowPlan};
use crate::models::{fit_forecast, ModelKind, ModelSettings};
use crate::types::processed::ProcessedRecord;
use bon::Builder;
use chrono::NaiveDate;
use log::{debug, info, warn};
use std::path::{Path, PathBuf};

/// The daily `tavg` series a backtest runs on.
///
/// Leading missing values are dropped and later ones carried forward, so
/// every position holds a value.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetSeries {
    pub dates: Vec<NaiveDate>,
    pub values: Vec<f64>,
    /// Position of the first row flagged `is_test`.
    pub first_test: Option<usize>,
}

impl TargetSeries {
    pub fn from_records(records: &[ProcessedRecord]) -> Result<Self, BacktestError> {
        let first = records
            .iter()
            .position(|r| r.tavg().is_some())
            .ok_or(BacktestError::EmptyTarget)?;
        if first > 0 {
            debug!("Dropping {} leading rows without tavg", first);
        }

        let mut dates = Vec::with_capacity(records.len() - first);
        let mut values = Vec::with_capacity(records.len() - first);
        let mut first_test = None;
        let mut carried = 0;
        let mut last = 0.0;
        for record in &records[first..] {
            let value = match record.tavg() {
                Some(v) => v,
                None => {
                    carried += 1;
                    last
                }
            };
            if record.is_test && first_test.is_none() {
                first_test = Some(dates.len());
            }
            dates.push(record.date());
            values.push(value);
            last = value;
        }
        if carried > 0 {
            warn!(
                "Carried the previous tavg forward into {} days with no value",
                carried
            );
        }
        Ok(Self {
            dates,
            values,
            first_test,
        })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Outcome of one window.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowResult {
    pub window: usize,
    pub train_start: NaiveDate,
    pub train_end: NaiveDate,
    pub test_start: NaiveDate,
    pub test_end: NaiveDate,
    pub dates: Vec<NaiveDate>,
    pub actual: Vec<f64>,
    pub predicted: Vec<f64>,
    pub metrics: ErrorMetrics,
}

/// Every window of one model plus errors pooled over all forecast points.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelReport {
    pub model: ModelKind,
    pub horizon: usize,
    pub windows: Vec<WindowResult>,
    pub pooled: ErrorMetrics,
}

impl ModelReport {
    pub fn metrics_row(&self) -> MetricsRow {
        MetricsRow {
            model: self.model.name().to_string(),
            horizon: self.horizon,
            windows: self.windows.len(),
            mae: self.pooled.mae,
            rmse: self.pooled.rmse,
        }
    }
}

#[derive(Debug, Clone, Builder)]
pub struct Backtest {
    #[builder(default = 7)]
    horizon: usize,
    /// Origin advance; defaults to the horizon.
    step: Option<usize>,
    /// Keep only the last `n` windows.
    max_windows: Option<usize>,
    #[builder(default)]
    window_kind: WindowKind,
    /// Training length of sliding windows; defaults to `min_train`.
    train_size: Option<usize>,
    #[builder(default = 60)]
    min_train: usize,
    #[builder(default)]
    settings: ModelSettings,
}

impl Backtest {
    pub fn horizon(&self) -> usize {
        self.horizon
    }

    fn plan(&self) -> WindowPlan {
        WindowPlan {
            horizon: self.horizon,
            step: self.step.unwrap_or(self.horizon),
            kind: self.window_kind,
            train_size: self.train_size.unwrap_or(self.min_train),
            min_train: self.min_train,
            max_windows: self.max_windows,
        }
    }

    /// Runs `model` over every window of `series`.
    pub fn run(
        &self,
        series: &TargetSeries,
        model: ModelKind,
    ) -> Result<ModelReport, BacktestError> {
        let windows = self.plan().windows(series.len(), series.first_test)?;
        info!(
            "Backtesting {} over {} {} windows of {} days",
            model,
            windows.len(),
            self.window_kind,
            self.horizon
        );
        if model == ModelKind::SeasonalNaive {
            let period = self.settings.seasonal_period;
            let short = count_shorter_than(&windows, period);
            if short > 0 {
                warn!(
                    "{} of {} windows train on fewer than {} days; seasonal_naive \
                     falls back to naive for them",
                    short,
                    windows.len(),
                    period
                );
            }
        }

        let mut results = Vec::with_capacity(windows.len());
        for window in windows {
            let train = &series.values[window.train.clone()];
            let train_first = series.dates[window.train.start];
            let predicted = fit_forecast(model, &self.settings, train, train_first, self.horizon)
                .map_err(|source| BacktestError::Model {
                    model: model.name(),
                    window: window.index,
                    source,
                })?;
            let actual = series.values[window.test.clone()].to_vec();
            let metrics = ErrorMetrics::evaluate(&actual, &predicted)
                .ok_or_else(|| BacktestError::InvalidSettings("empty test window".into()))?;
            debug!(
                "{} window {}: MAE {:.3} RMSE {:.3}",
                model, window.index, metrics.mae, metrics.rmse
            );
            results.push(WindowResult {
                window: window.index,
                train_start: train_first,
                train_end: series.dates[window.train.end - 1],
                test_start: series.dates[window.test.start],
                test_end: series.dates[window.test.end - 1],
                dates: series.dates[window.test.clone()].to_vec(),
                actual,
                predicted,
                metrics,
            });
        }

        let pooled = ErrorMetrics::from_pairs(
            results
                .iter()
                .flat_map(|r| r.actual.iter().copied().zip(r.predicted.iter().copied())),
        )
        .ok_or(BacktestError::EmptyTarget)?;
        Ok(ModelReport {
            model,
            horizon: self.horizon,
            windows: results,
            pooled,
        })
    }
}

/// Where a backtest writes its tables.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputLayout {
    pub metrics: PathBuf,
    pub output_dir: PathBuf,
}

impl OutputLayout {
    /// `metrics/metrics.csv`, `metrics/windows_{model}.csv` and
    /// `predictions/{model}.csv` under `reports_dir`.
    pub fn under(reports_dir: &Path) -> Self {
        Self {
            metrics: reports_dir.join("metrics").join("metrics.csv"),
            output_dir: reports_dir.to_path_buf(),
        }
    }

    pub fn windows_path(&self, model: ModelKind) -> PathBuf {
        self.output_dir
            .join("metrics")
            .join(format!("windows_{}.csv", model.name()))
    }

    pub fn predictions_path(&self, model: ModelKind) -> PathBuf {
        self.output_dir
            .join("predictions")
            .join(format!("{}.csv", model.name()))
    }

    /// HTML chart of the predictions, written when built with `plots`.
    pub fn figure_path(&self, model: ModelKind) -> PathBuf {
        self.output_dir
            .join("figures")
            .join(format!("pred_{}.html", model.name()))
    }

    pub fn write(&self, report: &ModelReport) -> Result<(), BacktestError> {
        let name = report.model.name();
        upsert_metrics(report.metrics_row(), &self.metrics)?;
        write_windows(name, &report.windows, &self.windows_path(report.model))?;
        write_predictions(name, &report.windows, &self.predictions_path(report.model))?;
        info!("Wrote {} results to {:?}", name, self.output_dir);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backtest::tables::{read_metrics, read_predictions};
    use crate::preprocess::Preprocessor;
    use crate::types::observation::ObservationRecord;
    use chrono::Days;

    fn processed(days: u64, test_days: usize) -> Vec<ProcessedRecord> {
        let start = NaiveDate::from_ymd_opt(2022, 1, 1).unwrap();
        let records = (0..days)
            .map(|i| {
                let mut r = ObservationRecord::empty(start + Days::new(i));
                let t = i as f64;
                r.tavg = Some(12.0 + 9.0 * (t / 58.0).sin() + ((i * 7919) % 13) as f64 * 0.1);
                r
            })
            .collect();
        Preprocessor::builder()
            .test_days(test_days)
            .build()
            .run(records)
            .unwrap()
    }

    #[test]
    fn target_trims_leading_and_fills_interior_gaps() {
        let mut records = processed(20, 5);
        records[0].observation.tavg = None;
        records[1].observation.tavg = None;
        records[5].observation.tavg = None;
        let series = TargetSeries::from_records(&records).unwrap();
        assert_eq!(series.len(), 18);
        assert_eq!(series.values[3], records[4].tavg().unwrap());
        assert_eq!(series.first_test, Some(13));
    }

    #[test]
    fn every_model_produces_finite_non_negative_metrics() {
        let series = TargetSeries::from_records(&processed(200, 28)).unwrap();
        let backtest = Backtest::builder().horizon(7).build();
        for model in ModelKind::ALL {
            let report = backtest.run(&series, model).unwrap();
            assert_eq!(report.windows.len(), 4, "{model}");
            for w in &report.windows {
                assert!(w.train_end < w.test_start);
                assert_eq!(w.predicted.len(), 7);
            }
            assert!(report.pooled.mae.is_finite() && report.pooled.mae >= 0.0);
            assert!(report.pooled.rmse >= report.pooled.mae);
        }
    }

    #[test]
    fn consecutive_windows_do_not_overlap() {
        let series = TargetSeries::from_records(&processed(150, 40)).unwrap();
        let report = Backtest::builder()
            .horizon(5)
            .build()
            .run(&series, ModelKind::Naive)
            .unwrap();
        for pair in report.windows.windows(2) {
            assert!(pair[0].test_end < pair[1].test_start);
        }
    }

    #[test]
    fn too_short_dataset_has_no_windows() {
        let series = TargetSeries::from_records(&processed(50, 10)).unwrap();
        assert!(matches!(
            Backtest::builder().build().run(&series, ModelKind::Naive),
            Err(BacktestError::NoWindows { .. })
        ));
    }

    #[test]
    fn writes_all_tables() {
        let dir = tempfile::tempdir().unwrap();
        let layout = OutputLayout::under(dir.path());
        let series = TargetSeries::from_records(&processed(120, 14)).unwrap();
        let report = Backtest::builder()
            .horizon(7)
            .build()
            .run(&series, ModelKind::SeasonalNaive)
            .unwrap();
        layout.write(&report).unwrap();

        let metrics = read_metrics(&layout.metrics).unwrap();
        assert_eq!(metrics.len(), 1);
        assert_eq!(metrics[0].model, "seasonal_naive");
        assert_eq!(metrics[0].windows, 2);

        let points = read_predictions(&layout.predictions_path(ModelKind::SeasonalNaive)).unwrap();
        assert_eq!(points.len(), 14);
        assert_eq!(points[0].step, 1);
        assert_eq!(points[13].window, 1);
        assert!(layout.windows_path(ModelKind::SeasonalNaive).is_file());
        assert_eq!(
            layout.figure_path(ModelKind::SeasonalNaive),
            dir.path().join("figures").join("pred_seasonal_naive.html")
        );
    }
}
