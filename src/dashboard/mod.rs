//! Read-only views over the pipeline's output tables.

#[cfg(feature = "plots")]
pub mod plot;

use crate::backtest::tables::{metrics_from_frame, MetricsRow};
use crate::frame::{read_csv, FrameError};
use crate::types::processed::ProcessedRecord;
use chrono::NaiveDate;
use polars::prelude::*;
use std::fmt::Write;
use std::path::Path;

/// Reads the metrics table, best (lowest RMSE) first.
pub fn ranked_metrics(path: &Path) -> Result<Vec<MetricsRow>, FrameError> {
    let df = read_csv(path)?
        .lazy()
        .sort(["rmse", "model"], SortMultipleOptions::default())
        .collect()?;
    metrics_from_frame(&df, path)
}

/// Rows of a predictions table to draw as a single actual/predicted line.
///
/// When windows overlap (origins closer than the horizon) a date appears in
/// several windows; only the one-step-ahead forecasts are kept then, so every
/// date is drawn once. Rows are sorted by date.
pub fn prediction_line(df: DataFrame) -> Result<DataFrame, FrameError> {
    let distinct_dates = df.column("date")?.as_materialized_series().n_unique()?;
    let overlapping = distinct_dates < df.height();
    let mut lazy = df.lazy();
    if overlapping {
        lazy = lazy.filter(col("step").eq(lit(1)));
    }
    Ok(lazy
        .sort(["date"], SortMultipleOptions::default())
        .collect()?)
}

pub fn render_metrics(rows: &[MetricsRow]) -> String {
    let width = rows
        .iter()
        .map(|r| r.model.len())
        .max()
        .unwrap_or(0)
        .max("model".len());
    let mut out = format!(
        "{:<4} {:<width$} {:>7} {:>7} {:>8} {:>8}\n",
        "rank", "model", "horizon", "windows", "mae", "rmse"
    );
    for (rank, row) in rows.iter().enumerate() {
        let _ = writeln!(
            out,
            "{:<4} {:<width$} {:>7} {:>7} {:>8.3} {:>8.3}",
            rank + 1,
            row.model,
            row.horizon,
            row.windows,
            row.mae,
            row.rmse
        );
    }
    out
}

/// Shape of a processed dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetSummary {
    pub rows: usize,
    pub first: NaiveDate,
    pub last: NaiveDate,
    pub test_rows: usize,
    pub missing_tavg: usize,
    pub location: Option<String>,
}

impl DatasetSummary {
    pub fn from_records(records: &[ProcessedRecord]) -> Option<Self> {
        let first = records.first()?.date();
        let last = records.last()?.date();
        Some(Self {
            rows: records.len(),
            first,
            last,
            test_rows: records.iter().filter(|r| r.is_test).count(),
            missing_tavg: records.iter().filter(|r| r.tavg().is_none()).count(),
            location: records.iter().find_map(|r| r.observation.location.clone()),
        })
    }

    pub fn render(&self) -> String {
        format!(
            "{} : {} days from {} to {} ({} test days, {} without tavg)",
            self.location.as_deref().unwrap_or("unknown location"),
            self.rows,
            self.first,
            self.last,
            self.test_rows,
            self.missing_tavg
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backtest::tables::write_metrics;

    fn row(model: &str, rmse: f64) -> MetricsRow {
        MetricsRow {
            model: model.to_string(),
            horizon: 7,
            windows: 52,
            mae: rmse * 0.8,
            rmse,
        }
    }

    #[test]
    fn metrics_are_ranked_by_rmse() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.csv");
        write_metrics(
            &[row("naive", 3.1), row("sarima", 2.2), row("seasonal_naive", 4.0)],
            &path,
        )
        .unwrap();

        let ranked = ranked_metrics(&path).unwrap();
        let order: Vec<&str> = ranked.iter().map(|r| r.model.as_str()).collect();
        assert_eq!(order, ["sarima", "naive", "seasonal_naive"]);

        let table = render_metrics(&ranked);
        assert!(table.lines().nth(1).unwrap().starts_with("1    sarima"));
        assert_eq!(table.lines().count(), 4);
    }

    fn predictions_table(step: usize) -> DataFrame {
        use crate::backtest::tables::write_predictions;
        use crate::backtest::{Backtest, TargetSeries};
        use crate::models::ModelKind;
        use crate::preprocess::Preprocessor;
        use crate::types::observation::ObservationRecord;
        use chrono::Days;

        let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        let records = (0..100u64)
            .map(|i| {
                let mut r = ObservationRecord::empty(start + Days::new(i));
                r.tavg = Some((i % 9) as f64);
                r
            })
            .collect();
        let processed = Preprocessor::builder()
            .test_days(20)
            .build()
            .run(records)
            .unwrap();
        let series = TargetSeries::from_records(&processed).unwrap();
        let report = Backtest::builder()
            .horizon(5)
            .step(step)
            .build()
            .run(&series, ModelKind::Naive)
            .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("naive.csv");
        write_predictions("naive", &report.windows, &path).unwrap();
        read_csv(&path).unwrap()
    }

    #[test]
    fn overlapping_windows_draw_each_date_once() {
        // Origins 80, 82, ..., 94 with a 5 day horizon overlap.
        let line = prediction_line(predictions_table(2)).unwrap();
        assert_eq!(line.height(), 8);
        let dates = line.column("date").unwrap().as_materialized_series().n_unique().unwrap();
        assert_eq!(dates, line.height());
    }

    #[test]
    fn disjoint_windows_keep_every_point() {
        let line = prediction_line(predictions_table(5)).unwrap();
        assert_eq!(line.height(), 20);
    }

    #[test]
    fn missing_metrics_file_is_reported() {
        assert!(matches!(
            ranked_metrics(Path::new("does/not/exist.csv")),
            Err(FrameError::MissingFile(_))
        ));
    }
}
