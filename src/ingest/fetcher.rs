use crate::frame::{observations_from_frame, observations_to_frame, DailyFrameFilterExt};
use crate::ingest::error::IngestError;
use crate::ingest::http::get_json;
use crate::ingest::response::{normalize_daily, DailyResponse, DAILY_VARIABLES};
use crate::types::date_span::DateSpan;
use crate::types::location::GeoLocation;
use crate::types::observation::ObservationRecord;
use chrono::{Days, Local, NaiveDate};
use log::{info, warn};
use polars::prelude::*;
use reqwest::Client;
use std::path::{Path, PathBuf};
use tokio::{fs, task};

/// Ranges ending this close to today may still be revised by the archive and
/// are never cached.
const UNSETTLED_DAYS: u64 = 7;

/// Downloads daily observations from the archive API, caching settled ranges
/// as parquet files.
pub struct DailyFetcher {
    client: Client,
    url: String,
    cache_dir: Option<PathBuf>,
}

impl DailyFetcher {
    pub fn new(client: Client, url: &str, cache_dir: Option<&Path>) -> Self {
        Self {
            client,
            url: url.to_string(),
            cache_dir: cache_dir.map(Path::to_path_buf),
        }
    }

    fn cache_path(&self, location: &GeoLocation, span: DateSpan) -> Option<PathBuf> {
        let dir = self.cache_dir.as_ref()?;
        let coordinates = location.coordinates;
        Some(dir.join(format!(
            "daily-{:.4}_{:.4}_{}_{}.parquet",
            coordinates.latitude(),
            coordinates.longitude(),
            span.start(),
            span.end()
        )))
    }

    /// Fetches one record per day of `span` for `location`.
    pub async fn fetch(
        &self,
        location: &GeoLocation,
        span: DateSpan,
    ) -> Result<Vec<ObservationRecord>, IngestError> {
        let cache_path = self.cache_path(location, span);
        if let Some(path) = &cache_path {
            if fs::metadata(path).await.is_ok() {
                info!("Cache hit for daily data of {} at {:?}", location.label(), path);
                return read_cached(path.clone(), span).await;
            }
            warn!(
                "Cache miss for daily data of {}. Downloading.",
                location.label()
            );
        }

        let records = self.download(location, span).await?;

        if let Some(path) = cache_path {
            if is_settled(span.end(), Local::now().date_naive()) {
                cache_records(records.clone(), &path).await?;
                info!("Cached daily data of {} to {:?}", location.label(), path);
            } else {
                info!("Range {} is too recent to cache", span);
            }
        }
        Ok(records)
    }

    async fn download(
        &self,
        location: &GeoLocation,
        span: DateSpan,
    ) -> Result<Vec<ObservationRecord>, IngestError> {
        let coordinates = location.coordinates;
        let query = [
            ("latitude", coordinates.latitude().to_string()),
            ("longitude", coordinates.longitude().to_string()),
            ("start_date", span.start().to_string()),
            ("end_date", span.end().to_string()),
            ("daily", DAILY_VARIABLES.join(",")),
            ("timezone", "auto".to_string()),
        ];
        info!("Downloading daily data for {} over {}", location.label(), span);
        let response: DailyResponse = get_json(&self.client, &self.url, &query).await?;

        if let Some(cell) = response.grid_cell() {
            info!(
                "Source grid cell {} is {:.1} km from the requested point",
                cell,
                coordinates.distance_km(cell)
            );
        }
        normalize_daily(response, location, span)
    }
}

fn is_settled(end: NaiveDate, today: NaiveDate) -> bool {
    today
        .checked_sub_days(Days::new(UNSETTLED_DAYS))
        .is_some_and(|cutoff| end < cutoff)
}

async fn read_cached(
    path: PathBuf,
    span: DateSpan,
) -> Result<Vec<ObservationRecord>, IngestError> {
    task::spawn_blocking(move || {
        let df = LazyFrame::scan_parquet(&path, Default::default())
            .and_then(|lf| lf.filter_daily(span.start(), span.end()).collect())
            .map_err(|e| IngestError::ParquetScan(path.clone(), e))?;
        Ok::<_, IngestError>(observations_from_frame(&df, &path)?)
    })
    .await?
}

async fn cache_records(records: Vec<ObservationRecord>, path: &Path) -> Result<(), IngestError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| IngestError::CacheDirCreation(parent.to_path_buf(), e))?;
    }
    let path_buf = path.to_path_buf();
    task::spawn_blocking(move || {
        let mut df = observations_to_frame(&records)
            .map_err(|e| IngestError::ParquetWritePolars(path_buf.clone(), e))?;
        let file = std::fs::File::create(&path_buf)
            .map_err(|e| IngestError::ParquetWriteIo(path_buf.clone(), e))?;
        ParquetWriter::new(file)
            .with_compression(ParquetCompression::Snappy)
            .finish(&mut df)
            .map_err(|e| IngestError::ParquetWritePolars(path_buf, e))?;
        Ok::<(), IngestError>(())
    })
    .await??;
    Ok(())
}
