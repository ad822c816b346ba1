use crate::backtest::error::BacktestError;
use crate::config::ConfigError;
use crate::frame::FrameError;
use crate::ingest::error::IngestError;
use crate::models::error::ModelError;
use crate::preprocess::error::PreprocessError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error(transparent)]
    Frame(#[from] FrameError),

    #[error(transparent)]
    Preprocess(#[from] PreprocessError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Backtest(#[from] BacktestError),
}
