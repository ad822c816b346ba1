//! Result tables written by a backtest run.

use crate::backtest::WindowResult;
use crate::frame::{read_csv, write_csv, ColumnReader, FrameError, DATE_FORMAT};
use chrono::NaiveDate;
use polars::prelude::*;
use std::path::Path;

/// One row of the metrics table: pooled errors of a model at a horizon.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsRow {
    pub model: String,
    pub horizon: usize,
    pub windows: usize,
    pub mae: f64,
    pub rmse: f64,
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

fn date_strings<'a>(dates: impl Iterator<Item = &'a NaiveDate>) -> Vec<String> {
    dates.map(|d| d.format(DATE_FORMAT).to_string()).collect()
}

/// Reads a metrics table. Row order is kept.
pub fn read_metrics(path: &Path) -> Result<Vec<MetricsRow>, FrameError> {
    let df = read_csv(path)?;
    metrics_from_frame(&df, path)
}

/// Converts a loaded metrics frame; `source` only labels errors.
pub fn metrics_from_frame(df: &DataFrame, source: &Path) -> Result<Vec<MetricsRow>, FrameError> {
    let reader = ColumnReader::new(df, source);
    let model = reader.strings("model")?;
    let horizon = reader.f64s("horizon")?;
    let windows = reader.f64s("windows")?;
    let mae = reader.f64s("mae")?;
    let rmse = reader.f64s("rmse")?;
    Ok(model
        .into_iter()
        .enumerate()
        .map(|(i, model)| MetricsRow {
            model,
            horizon: horizon[i].unwrap_or_default() as usize,
            windows: windows[i].unwrap_or_default() as usize,
            mae: mae[i].unwrap_or(f64::NAN),
            rmse: rmse[i].unwrap_or(f64::NAN),
        })
        .collect())
}

pub fn write_metrics(rows: &[MetricsRow], path: &Path) -> Result<(), FrameError> {
    let mut df = DataFrame::new(vec![
        Column::new(
            "model".into(),
            rows.iter().map(|r| r.model.clone()).collect::<Vec<_>>(),
        ),
        Column::new(
            "horizon".into(),
            rows.iter().map(|r| r.horizon as u64).collect::<Vec<_>>(),
        ),
        Column::new(
            "windows".into(),
            rows.iter().map(|r| r.windows as u64).collect::<Vec<_>>(),
        ),
        Column::new(
            "mae".into(),
            rows.iter().map(|r| round3(r.mae)).collect::<Vec<_>>(),
        ),
        Column::new(
            "rmse".into(),
            rows.iter().map(|r| round3(r.rmse)).collect::<Vec<_>>(),
        ),
    ])?;
    write_csv(&mut df, path)
}

/// Adds `row` to the metrics table at `path`, replacing an existing row for
/// the same model and horizon. Other rows keep their place.
pub fn upsert_metrics(row: MetricsRow, path: &Path) -> Result<(), FrameError> {
    let mut rows = if path.is_file() {
        read_metrics(path)?
    } else {
        Vec::new()
    };
    match rows
        .iter_mut()
        .find(|r| r.model == row.model && r.horizon == row.horizon)
    {
        Some(existing) => *existing = row,
        None => rows.push(row),
    }
    write_metrics(&rows, path)
}

/// Per-window errors of one model.
pub fn write_windows(
    model: &str,
    results: &[WindowResult],
    path: &Path,
) -> Result<(), FrameError> {
    let mut df = DataFrame::new(vec![
        Column::new("model".into(), vec![model; results.len()]),
        Column::new(
            "window".into(),
            results.iter().map(|r| r.window as u64).collect::<Vec<_>>(),
        ),
        Column::new(
            "train_start".into(),
            date_strings(results.iter().map(|r| &r.train_start)),
        ),
        Column::new(
            "train_end".into(),
            date_strings(results.iter().map(|r| &r.train_end)),
        ),
        Column::new(
            "test_start".into(),
            date_strings(results.iter().map(|r| &r.test_start)),
        ),
        Column::new(
            "test_end".into(),
            date_strings(results.iter().map(|r| &r.test_end)),
        ),
        Column::new(
            "mae".into(),
            results.iter().map(|r| round3(r.metrics.mae)).collect::<Vec<_>>(),
        ),
        Column::new(
            "rmse".into(),
            results.iter().map(|r| round3(r.metrics.rmse)).collect::<Vec<_>>(),
        ),
    ])?;
    write_csv(&mut df, path)
}

/// Every forecast point of one model, in window then step order.
pub fn write_predictions(
    model: &str,
    results: &[WindowResult],
    path: &Path,
) -> Result<(), FrameError> {
    let points: Vec<(usize, usize, &NaiveDate, f64, f64)> = results
        .iter()
        .flat_map(|r| {
            r.dates
                .iter()
                .zip(r.actual.iter().zip(&r.predicted))
                .enumerate()
                .map(move |(step, (date, (a, p)))| (r.window, step + 1, date, *a, *p))
        })
        .collect();

    let mut df = DataFrame::new(vec![
        Column::new("model".into(), vec![model; points.len()]),
        Column::new(
            "window".into(),
            points.iter().map(|p| p.0 as u64).collect::<Vec<_>>(),
        ),
        Column::new("date".into(), date_strings(points.iter().map(|p| p.2))),
        Column::new(
            "step".into(),
            points.iter().map(|p| p.1 as u64).collect::<Vec<_>>(),
        ),
        Column::new(
            "actual".into(),
            points.iter().map(|p| p.3).collect::<Vec<_>>(),
        ),
        Column::new(
            "predicted".into(),
            points.iter().map(|p| p.4).collect::<Vec<_>>(),
        ),
    ])?;
    write_csv(&mut df, path)
}

/// A forecast point read back from a predictions table.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionPoint {
    pub model: String,
    pub window: usize,
    pub date: NaiveDate,
    pub step: usize,
    pub actual: f64,
    pub predicted: f64,
}

pub fn read_predictions(path: &Path) -> Result<Vec<PredictionPoint>, FrameError> {
    let df = read_csv(path)?;
    let reader = ColumnReader::new(&df, path);
    let model = reader.strings("model")?;
    let window = reader.f64s("window")?;
    let date = reader.dates("date")?;
    let step = reader.f64s("step")?;
    let actual = reader.f64s("actual")?;
    let predicted = reader.f64s("predicted")?;
    Ok(model
        .into_iter()
        .enumerate()
        .map(|(i, model)| PredictionPoint {
            model,
            window: window[i].unwrap_or_default() as usize,
            date: date[i],
            step: step[i].unwrap_or_default() as usize,
            actual: actual[i].unwrap_or(f64::NAN),
            predicted: predicted[i].unwrap_or(f64::NAN),
        })
        .collect())
}
