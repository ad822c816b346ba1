//! The ingest stage: resolve a location, download daily observations for a
//! date range and write them as a raw observation file.
//!
//! Data comes from the Open-Meteo geocoding and historical archive APIs. The
//! output always holds exactly one record per requested day; see
//! [`response::normalize_daily`] for the gap policy.

pub mod error;
pub mod fetcher;
pub mod geocoder;
mod http;
pub mod response;

use crate::config::SourceConfig;
use crate::frame::write_observations;
use crate::types::date_span::DateSpan;
use crate::types::location::{GeoLocation, LatLon};
use crate::types::observation::ObservationRecord;
use crate::utils::{ensure_cache_dir_exists, get_cache_dir, slugify};
use bon::bon;
use chrono::NaiveDate;
use error::IngestError;
use fetcher::DailyFetcher;
use geocoder::Geocoder;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Where to fetch weather for.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationQuery {
    /// A free-text place name such as `"Austin,US"`, resolved by geocoding.
    Name(String),
    /// Explicit coordinates; no geocoding lookup is made.
    Coordinates(LatLon),
}

impl LocationQuery {
    /// Text used to derive default file names.
    pub fn label(&self) -> String {
        match self {
            LocationQuery::Name(name) => name.clone(),
            LocationQuery::Coordinates(c) => c.to_string(),
        }
    }
}

/// Result of one ingest run.
#[derive(Debug, Clone)]
pub struct IngestOutcome {
    pub location: GeoLocation,
    pub span: DateSpan,
    pub records: Vec<ObservationRecord>,
}

impl IngestOutcome {
    /// Days of the range for which the source reported no mean temperature.
    pub fn missing_days(&self) -> usize {
        self.records.iter().filter(|r| r.tavg.is_none()).count()
    }

    pub fn write(&self, path: &Path) -> Result<(), IngestError> {
        write_observations(&self.records, path)?;
        Ok(())
    }
}

/// `{raw_dir}/{slug}_{start}_{end}.csv`
pub fn default_output_path(raw_dir: &Path, query: &LocationQuery, span: DateSpan) -> PathBuf {
    raw_dir.join(format!(
        "{}_{}_{}.csv",
        slugify(&query.label()),
        span.start(),
        span.end()
    ))
}

/// Client for the ingest stage.
///
/// # Examples
///
/// ```no_run
/// # use weather_insights::{Ingestor, LocationQuery, SourceConfig, IngestError};
/// # use chrono::NaiveDate;
/// # #[tokio::main]
/// # async fn main() -> Result<(), IngestError> {
/// let ingestor = Ingestor::new(&SourceConfig::default(), None).await?;
/// let outcome = ingestor
///     .fetch_daily()
///     .location(LocationQuery::Name("Austin,US".to_string()))
///     .start(NaiveDate::from_ymd_opt(2023, 1, 1).unwrap())
///     .end(NaiveDate::from_ymd_opt(2023, 12, 31).unwrap())
///     .call()
///     .await?;
/// assert_eq!(outcome.records.len(), 365);
/// # Ok(())
/// # }
/// ```
pub struct Ingestor {
    geocoder: Geocoder,
    fetcher: DailyFetcher,
}

#[bon]
impl Ingestor {
    /// Creates an ingestor from the `[source]` configuration.
    ///
    /// When `source.use_cache` is set, downloads are cached in `cache_dir`, or
    /// in the system cache directory when `cache_dir` is `None`.
    pub async fn new(
        source: &SourceConfig,
        cache_dir: Option<PathBuf>,
    ) -> Result<Self, IngestError> {
        let cache_dir = if source.use_cache {
            let dir = match cache_dir {
                Some(dir) => dir,
                None => get_cache_dir().map_err(IngestError::CacheDirResolution)?,
            };
            ensure_cache_dir_exists(&dir)
                .await
                .map_err(|e| IngestError::CacheDirCreation(dir.clone(), e))?;
            Some(dir)
        } else {
            None
        };

        let client = http::build_client(Duration::from_secs(source.timeout_secs))?;
        Ok(Self {
            geocoder: Geocoder::new(client.clone(), &source.geocoding_url, cache_dir.as_deref()),
            fetcher: DailyFetcher::new(client, &source.archive_url, cache_dir.as_deref()),
        })
    }

    /// Fetches daily observations for `location` from `start` to `end`
    /// (inclusive).
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::InvalidDateRange`] when `start` is after `end`,
    /// [`IngestError::LocationNotFound`] when a name cannot be geocoded, and
    /// network, HTTP or decoding errors when the source is unreachable or
    /// answers with something unexpected. Nothing is retried.
    #[builder]
    pub async fn fetch_daily(
        &self,
        location: LocationQuery,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<IngestOutcome, IngestError> {
        let span =
            DateSpan::new(start, end).ok_or(IngestError::InvalidDateRange { start, end })?;
        let location = match location {
            LocationQuery::Name(name) => self.geocoder.resolve(&name).await?,
            LocationQuery::Coordinates(coordinates) => GeoLocation::from_coordinates(coordinates),
        };
        let records = self.fetcher.fetch(&location, span).await?;
        Ok(IngestOutcome {
            location,
            span,
            records,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn default_path_uses_slug_and_range() {
        let span = DateSpan::new(d(2018, 1, 1), d(2024, 12, 31)).unwrap();
        let path = default_output_path(
            Path::new("data/raw"),
            &LocationQuery::Name("Austin,US".to_string()),
            span,
        );
        assert_eq!(
            path,
            PathBuf::from("data/raw/austin_us_2018-01-01_2024-12-31.csv")
        );
    }

    #[tokio::test]
    async fn reversed_range_is_rejected_before_any_request() -> Result<(), IngestError> {
        let source = SourceConfig {
            use_cache: false,
            ..SourceConfig::default()
        };
        let ingestor = Ingestor::new(&source, None).await?;
        let result = ingestor
            .fetch_daily()
            .location(LocationQuery::Coordinates(LatLon(30.0, -97.0)))
            .start(d(2024, 2, 1))
            .end(d(2024, 1, 1))
            .call()
            .await;
        assert!(matches!(result, Err(IngestError::InvalidDateRange { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn unreachable_source_is_a_network_error() -> Result<(), IngestError> {
        let source = SourceConfig {
            archive_url: "http://127.0.0.1:9/archive".to_string(),
            timeout_secs: 5,
            use_cache: false,
            ..SourceConfig::default()
        };
        let ingestor = Ingestor::new(&source, None).await?;
        let result = ingestor
            .fetch_daily()
            .location(LocationQuery::Coordinates(LatLon(30.0, -97.0)))
            .start(d(2024, 1, 1))
            .end(d(2024, 1, 31))
            .call()
            .await;
        assert!(matches!(result, Err(IngestError::NetworkRequest(..))));
        Ok(())
    }
}
