mod cli;

use anyhow::{bail, Context, Result};
use clap::Parser;
use cli::{BacktestArgs, Cli, Commands, IngestArgs, PreprocessArgs, ReportArgs};
use log::info;
use std::path::Path;
use weather_insights::backtest::OutputLayout;
use weather_insights::dashboard::{ranked_metrics, render_metrics, DatasetSummary};
use weather_insights::frame::read_processed;
use weather_insights::ingest::default_output_path;
use weather_insights::{
    Backtest, DateSpan, Ingestor, LatLon, LocationQuery, ModelKind, ModelSettings,
    PipelineConfig, Preprocessor, TargetSeries,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let config = PipelineConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Ingest(args) => ingest(&config, args).await,
        Commands::Preprocess(args) => preprocess(&config, args),
        Commands::Backtest(args) => backtest(&config, args),
        Commands::Report(args) => report(&config, args),
    }
}

async fn ingest(config: &PipelineConfig, args: IngestArgs) -> Result<()> {
    let query = match (args.location, args.latitude, args.longitude) {
        (Some(name), _, _) => LocationQuery::Name(name),
        (None, Some(lat), Some(lon)) => LocationQuery::Coordinates(LatLon(lat, lon)),
        _ => bail!("either --location or both --latitude and --longitude are required"),
    };
    let Some(span) = DateSpan::new(args.start, args.end) else {
        bail!("--start {} is after --end {}", args.start, args.end);
    };

    let mut source = config.source.clone();
    if args.no_cache {
        source.use_cache = false;
    }
    let ingestor = Ingestor::new(&source, config.paths.cache_dir.clone()).await?;
    let outcome = ingestor
        .fetch_daily()
        .location(query.clone())
        .start(span.start())
        .end(span.end())
        .call()
        .await?;

    let path = args
        .outfile
        .unwrap_or_else(|| default_output_path(&config.paths.raw_dir, &query, span));
    outcome.write(&path)?;
    println!(
        "Saved {} rows for {} to {}",
        outcome.records.len(),
        outcome.location.label(),
        path.display()
    );
    if outcome.missing_days() > 0 {
        println!("{} days have no mean temperature", outcome.missing_days());
    }
    Ok(())
}

fn preprocess(config: &PipelineConfig, args: PreprocessArgs) -> Result<()> {
    let preprocessor = Preprocessor::builder()
        .max_gap_days(args.max_gap_days.unwrap_or(config.preprocess.max_gap_days))
        .test_days(args.test_days.unwrap_or(config.preprocess.test_days))
        .build();
    let rows = preprocessor.process_file(&args.input, &args.output)?;
    println!("Saved processed dataset: {} ({} rows)", args.output.display(), rows);
    Ok(())
}

fn backtest(config: &PipelineConfig, args: BacktestArgs) -> Result<()> {
    let records = read_processed(&args.dataset)?;
    let series = TargetSeries::from_records(&records)?;
    let backtest = Backtest::builder()
        .horizon(args.horizon.unwrap_or(config.backtest.horizon))
        .maybe_step(args.step)
        .maybe_max_windows(args.windows)
        .window_kind(args.window_kind)
        .maybe_train_size(args.train_size)
        .min_train(config.backtest.min_train)
        .settings(ModelSettings::from(&config.backtest))
        .build();

    let mut layout = OutputLayout::under(&config.paths.reports_dir);
    if let Some(dir) = args.output_dir {
        layout = OutputLayout::under(&dir);
    }
    if let Some(metrics) = args.metrics_out {
        layout.metrics = metrics;
    }

    for model in args.model.kinds() {
        let report = backtest
            .run(&series, model)
            .with_context(|| format!("backtest of {model} failed"))?;
        layout.write(&report)?;
        write_prediction_chart(&layout, model)?;
        println!(
            "{} -> MAE {:.3}  RMSE {:.3}",
            model, report.pooled.mae, report.pooled.rmse
        );
    }
    info!("Metrics table at {}", layout.metrics.display());
    Ok(())
}

fn report(config: &PipelineConfig, args: ReportArgs) -> Result<()> {
    let layout = OutputLayout::under(&config.paths.reports_dir);
    let metrics = args.metrics.unwrap_or(layout.metrics);
    let rows = ranked_metrics(&metrics)?;
    print!("{}", render_metrics(&rows));

    if let Some(dataset) = &args.dataset {
        let records = read_processed(dataset)?;
        if let Some(summary) = DatasetSummary::from_records(&records) {
            println!("{}", summary.render());
        }
    }

    let predictions_dir = args
        .predictions_dir
        .unwrap_or_else(|| config.paths.reports_dir.join("predictions"));
    write_charts(
        &config.paths.reports_dir.join("figures"),
        args.dataset.as_deref(),
        &predictions_dir,
    )
}

#[cfg(feature = "plots")]
fn write_charts(figures: &Path, dataset: Option<&Path>, predictions_dir: &Path) -> Result<()> {
    use weather_insights::dashboard::plot::{history_chart, prediction_chart};

    if let Some(dataset) = dataset {
        let out = history_chart(dataset, &figures.join("tavg_history.html"))?;
        println!("Saved chart {}", out.display());
    }
    if predictions_dir.is_dir() {
        let entries = std::fs::read_dir(predictions_dir)
            .with_context(|| format!("reading {}", predictions_dir.display()))?;
        for entry in entries {
            let path = entry?.path();
            if path.extension().is_some_and(|e| e == "csv") {
                let stem = path.file_stem().unwrap_or_default().to_string_lossy();
                let out = prediction_chart(&path, &figures.join(format!("pred_{stem}.html")))?;
                println!("Saved chart {}", out.display());
            }
        }
    }
    Ok(())
}

#[cfg(feature = "plots")]
fn write_prediction_chart(layout: &OutputLayout, model: ModelKind) -> Result<()> {
    use weather_insights::dashboard::plot::prediction_chart;

    let out = prediction_chart(&layout.predictions_path(model), &layout.figure_path(model))?;
    println!("Saved chart {}", out.display());
    Ok(())
}

#[cfg(not(feature = "plots"))]
fn write_prediction_chart(_layout: &OutputLayout, _model: ModelKind) -> Result<()> {
    Ok(())
}

#[cfg(not(feature = "plots"))]
fn write_charts(_figures: &Path, _dataset: Option<&Path>, _predictions_dir: &Path) -> Result<()> {
    info!("Built without the `plots` feature; skipping charts");
    Ok(())
}
