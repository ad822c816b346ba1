//! Command-line interface of the `weather-insights` binary.

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use weather_insights::{ModelKind, WindowKind};

/// Daily weather pipeline: ingest, preprocess, backtest and report.
#[derive(Parser, Debug)]
#[command(name = "weather-insights")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Download daily observations for a location and date range
    Ingest(IngestArgs),
    /// Reindex, fill gaps and derive model features
    Preprocess(PreprocessArgs),
    /// Evaluate forecasting models over rolling windows
    Backtest(BacktestArgs),
    /// Print ranked metrics (and write charts when built with `plots`)
    Report(ReportArgs),
}

#[derive(Args, Debug)]
pub struct IngestArgs {
    /// Place name to geocode, e.g. "Austin,US"
    #[arg(long, required_unless_present = "latitude", conflicts_with = "latitude")]
    pub location: Option<String>,

    #[arg(long, requires = "longitude", allow_negative_numbers = true)]
    pub latitude: Option<f64>,

    #[arg(long, requires = "latitude", allow_negative_numbers = true)]
    pub longitude: Option<f64>,

    /// First day, YYYY-MM-DD
    #[arg(long)]
    pub start: NaiveDate,

    /// Last day (inclusive), YYYY-MM-DD
    #[arg(long)]
    pub end: NaiveDate,

    /// Output file; defaults to {raw_dir}/{location}_{start}_{end}.csv
    #[arg(long)]
    pub outfile: Option<PathBuf>,

    /// Always download, ignoring and not updating the cache
    #[arg(long)]
    pub no_cache: bool,
}

#[derive(Args, Debug)]
pub struct PreprocessArgs {
    #[arg(long = "in", value_name = "PATH")]
    pub input: PathBuf,

    #[arg(long = "out", value_name = "PATH")]
    pub output: PathBuf,

    /// Longest interior gap (days) that is interpolated
    #[arg(long)]
    pub max_gap_days: Option<usize>,

    /// Trailing days flagged for testing
    #[arg(long, value_parser = parse_positive)]
    pub test_days: Option<usize>,
}

/// Model selection; `all` runs every model in turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ModelArg {
    Naive,
    #[value(name = "seasonal_naive")]
    SeasonalNaive,
    Sarima,
    Ridge,
    All,
}

impl ModelArg {
    pub fn kinds(self) -> Vec<ModelKind> {
        match self {
            ModelArg::Naive => vec![ModelKind::Naive],
            ModelArg::SeasonalNaive => vec![ModelKind::SeasonalNaive],
            ModelArg::Sarima => vec![ModelKind::Sarima],
            ModelArg::Ridge => vec![ModelKind::Ridge],
            ModelArg::All => ModelKind::ALL.to_vec(),
        }
    }
}

#[derive(Args, Debug)]
pub struct BacktestArgs {
    /// Processed dataset
    #[arg(long)]
    pub dataset: PathBuf,

    #[arg(long, value_enum, default_value_t = ModelArg::Sarima)]
    pub model: ModelArg,

    /// Days forecast from each origin
    #[arg(long, value_parser = parse_positive)]
    pub horizon: Option<usize>,

    /// Evaluate only the last N windows
    #[arg(long, value_parser = parse_positive)]
    pub windows: Option<usize>,

    /// Days between consecutive origins; defaults to the horizon
    #[arg(long, value_parser = parse_positive)]
    pub step: Option<usize>,

    #[arg(long, value_enum, default_value_t = WindowKind::Expanding)]
    pub window_kind: WindowKind,

    /// Training days of sliding windows
    #[arg(long, value_parser = parse_positive)]
    pub train_size: Option<usize>,

    /// Metrics table; defaults to {reports_dir}/metrics/metrics.csv
    #[arg(long)]
    pub metrics_out: Option<PathBuf>,

    /// Directory for per-window and prediction tables; defaults to reports_dir
    #[arg(long)]
    pub output_dir: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ReportArgs {
    /// Metrics table; defaults to {reports_dir}/metrics/metrics.csv
    #[arg(long)]
    pub metrics: Option<PathBuf>,

    /// Processed dataset to summarize
    #[arg(long)]
    pub dataset: Option<PathBuf>,

    /// Directory of prediction tables; defaults to {reports_dir}/predictions
    #[arg(long)]
    pub predictions_dir: Option<PathBuf>,
}

fn parse_positive(s: &str) -> Result<usize, String> {
    match s.parse::<usize>() {
        Ok(0) => Err("must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_backtest_flags() {
        let cli = Cli::try_parse_from([
            "weather-insights",
            "-vv",
            "backtest",
            "--dataset",
            "data/processed/austin.csv",
            "--model",
            "seasonal_naive",
            "--horizon",
            "14",
            "--window-kind",
            "sliding",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        let Commands::Backtest(args) = cli.command else {
            panic!("expected backtest");
        };
        assert_eq!(args.model.kinds(), vec![ModelKind::SeasonalNaive]);
        assert_eq!(args.horizon, Some(14));
        assert_eq!(args.window_kind, WindowKind::Sliding);
    }

    #[test]
    fn rejects_invalid_values() {
        for argv in [
            vec!["weather-insights", "backtest", "--dataset", "x.csv", "--horizon", "0"],
            vec!["weather-insights", "backtest", "--dataset", "x.csv", "--model", "arima"],
            vec![
                "weather-insights", "ingest", "--location", "Austin", "--start", "2024-13-01",
                "--end", "2024-12-31",
            ],
            vec!["weather-insights", "ingest", "--start", "2024-01-01", "--end", "2024-12-31"],
        ] {
            assert!(Cli::try_parse_from(argv).is_err());
        }
    }

    #[test]
    fn coordinates_replace_location() {
        let cli = Cli::try_parse_from([
            "weather-insights",
            "ingest",
            "--latitude",
            "-33.87",
            "--longitude",
            "151.21",
            "--start",
            "2024-01-01",
            "--end",
            "2024-01-31",
        ])
        .unwrap();
        let Commands::Ingest(args) = cli.command else {
            panic!("expected ingest");
        };
        assert_eq!(args.latitude, Some(-33.87));
        assert!(args.location.is_none());
    }
}
