//! HTML charts of the processed data and of backtest predictions.

use crate::dashboard::prediction_line;
use crate::frame::{read_csv, FrameError};
use crate::utils::ensure_parent_dir;
use log::info;
use plotlars::{Line, Plot, Rgb, Text, TimeSeriesPlot};
use std::path::{Path, PathBuf};

fn prepare(out: &Path) -> Result<String, FrameError> {
    ensure_parent_dir(out).map_err(|e| FrameError::Io(out.to_path_buf(), e))?;
    Ok(out.to_string_lossy().into_owned())
}

/// Daily `tavg`, with `tmin` and `tmax` when present.
pub fn history_chart(dataset: &Path, out: &Path) -> Result<PathBuf, FrameError> {
    let df = read_csv(dataset)?;
    let mut extra = Vec::new();
    for column in ["tmin", "tmax"] {
        if df.column(column).is_ok() {
            extra.push(column);
        }
    }
    let target = prepare(out)?;
    TimeSeriesPlot::builder()
        .data(&df)
        .x("date")
        .y("tavg")
        .additional_series(extra)
        .colors(vec![Rgb(69, 157, 230), Rgb(120, 120, 120), Rgb(235, 117, 0)])
        .lines(vec![Line::Solid, Line::Dot, Line::Dot])
        .plot_title(Text::from("Daily mean temperature").size(18))
        .y_title("°C")
        .build()
        .write_html(target);
    info!("Wrote history chart to {:?}", out);
    Ok(out.to_path_buf())
}

/// Actual against predicted values of a predictions table, one point per date.
pub fn prediction_chart(predictions: &Path, out: &Path) -> Result<PathBuf, FrameError> {
    let df = prediction_line(read_csv(predictions)?)?;
    let title = predictions
        .file_stem()
        .map(|s| format!("{} forecasts", s.to_string_lossy()))
        .unwrap_or_else(|| "Forecasts".to_string());
    let target = prepare(out)?;
    TimeSeriesPlot::builder()
        .data(&df)
        .x("date")
        .y("actual")
        .additional_series(vec!["predicted"])
        .colors(vec![Rgb(0, 0, 0), Rgb(235, 117, 0)])
        .lines(vec![Line::Solid, Line::Dash])
        .plot_title(Text::from(title).size(18))
        .y_title("°C")
        .build()
        .write_html(target);
    info!("Wrote prediction chart to {:?}", out);
    Ok(out.to_path_buf())
}
