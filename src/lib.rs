pub mod backtest;
pub mod config;
pub mod dashboard;
mod error;
pub mod frame;
pub mod ingest;
pub mod models;
pub mod preprocess;
pub mod types;
mod utils;

pub use error::PipelineError;
pub use utils::slugify;

pub use config::{ConfigError, PipelineConfig, SourceConfig};

pub use types::date_span::DateSpan;
pub use types::location::{GeoLocation, LatLon};
pub use types::observation::ObservationRecord;
pub use types::processed::ProcessedRecord;

pub use ingest::error::IngestError;
pub use ingest::{IngestOutcome, Ingestor, LocationQuery};

pub use frame::{DailyFrameFilterExt, FrameError};

pub use preprocess::error::PreprocessError;
pub use preprocess::Preprocessor;

pub use models::error::ModelError;
pub use models::{fit_forecast, ModelKind, ModelSettings};

pub use backtest::error::BacktestError;
pub use backtest::windows::WindowKind;
pub use backtest::{Backtest, ModelReport, OutputLayout, TargetSeries};
