use crate::frame::FrameError;
use crate::models::error::ModelError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BacktestError {
    #[error("Dataset has no tavg values to backtest on")]
    EmptyTarget,

    #[error("Invalid backtest settings: {0}")]
    InvalidSettings(String),

    #[error(
        "No evaluation windows: {rows} usable rows, first origin {origin}, horizon {horizon}"
    )]
    NoWindows {
        rows: usize,
        origin: usize,
        horizon: usize,
    },

    #[error("Model {model} failed on window {window}")]
    Model {
        model: &'static str,
        window: usize,
        #[source]
        source: ModelError,
    },

    #[error(transparent)]
    Frame(#[from] FrameError),
}
