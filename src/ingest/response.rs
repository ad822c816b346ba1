//! Response models of the geocoding and daily archive endpoints, and their
//! normalization into [`ObservationRecord`]s.

use crate::ingest::error::IngestError;
use crate::types::date_span::DateSpan;
use crate::types::location::{GeoLocation, LatLon};
use crate::types::observation::ObservationRecord;
use chrono::NaiveDate;
use log::warn;
use serde::Deserialize;
use std::collections::BTreeMap;

/// Daily variables requested from the archive, in request order.
pub const DAILY_VARIABLES: [&str; 5] = [
    "temperature_2m_max",
    "temperature_2m_min",
    "temperature_2m_mean",
    "precipitation_sum",
    "windspeed_10m_max",
];

#[derive(Debug, Deserialize)]
pub struct GeocodingResponse {
    #[serde(default)]
    pub results: Vec<GeocodingResult>,
}

#[derive(Debug, Deserialize)]
pub struct GeocodingResult {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub country_code: Option<String>,
    pub timezone: Option<String>,
}

impl From<GeocodingResult> for GeoLocation {
    fn from(result: GeocodingResult) -> Self {
        GeoLocation {
            name: result.name,
            country_code: result.country_code,
            coordinates: LatLon(result.latitude, result.longitude),
            timezone: result.timezone,
        }
    }
}

/// Error body returned with non-2xx statuses.
#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    pub reason: String,
}

#[derive(Debug, Deserialize)]
pub struct DailyResponse {
    /// Latitude of the grid cell the values belong to.
    pub latitude: Option<f64>,
    /// Longitude of the grid cell the values belong to.
    pub longitude: Option<f64>,
    pub daily: Option<DailyBlock>,
}

#[derive(Debug, Deserialize)]
pub struct DailyBlock {
    #[serde(default)]
    pub time: Vec<String>,
    pub temperature_2m_max: Option<Vec<Option<f64>>>,
    pub temperature_2m_min: Option<Vec<Option<f64>>>,
    pub temperature_2m_mean: Option<Vec<Option<f64>>>,
    pub precipitation_sum: Option<Vec<Option<f64>>>,
    #[serde(alias = "wind_speed_10m_max")]
    pub windspeed_10m_max: Option<Vec<Option<f64>>>,
}

impl DailyResponse {
    pub fn grid_cell(&self) -> Option<LatLon> {
        Some(LatLon(self.latitude?, self.longitude?))
    }
}

/// Checks that an optional series has one value per day.
fn series<'a>(
    values: &'a Option<Vec<Option<f64>>>,
    name: &str,
    expected: usize,
) -> Result<Option<&'a [Option<f64>]>, IngestError> {
    match values {
        Some(v) if v.len() != expected => Err(IngestError::MalformedResponse(format!(
            "'{name}' has {} values but 'time' has {expected}",
            v.len()
        ))),
        Some(v) => Ok(Some(v.as_slice())),
        None => Ok(None),
    }
}

fn value_at(values: Option<&[Option<f64>]>, i: usize) -> Option<f64> {
    values.and_then(|v| v[i]).filter(|v| v.is_finite())
}

/// Turns a daily response into exactly one record per day of `span`.
///
/// Days the response leaves out get a record with empty measurements, days
/// outside `span` are dropped, and of duplicated days the first wins. A
/// missing mean temperature is derived from min and max when both exist.
/// Every record carries the label and coordinates of `location`.
pub fn normalize_daily(
    response: DailyResponse,
    location: &GeoLocation,
    span: DateSpan,
) -> Result<Vec<ObservationRecord>, IngestError> {
    let daily = response
        .daily
        .filter(|d| !d.time.is_empty())
        .ok_or_else(|| IngestError::EmptyResponse(format!("{} over {}", location.label(), span)))?;

    let n = daily.time.len();
    let tmax = series(&daily.temperature_2m_max, "temperature_2m_max", n)?;
    let tmin = series(&daily.temperature_2m_min, "temperature_2m_min", n)?;
    let tavg = series(&daily.temperature_2m_mean, "temperature_2m_mean", n)?;
    let precip = series(&daily.precipitation_sum, "precipitation_sum", n)?;
    let wind = series(&daily.windspeed_10m_max, "windspeed_10m_max", n)?;

    let mut by_date: BTreeMap<NaiveDate, ObservationRecord> = BTreeMap::new();
    let mut outside = 0usize;
    for (i, time) in daily.time.iter().enumerate() {
        let date = NaiveDate::parse_from_str(time, "%Y-%m-%d").map_err(|_| {
            IngestError::MalformedResponse(format!("invalid date '{time}' at index {i}"))
        })?;
        if !span.contains(date) {
            outside += 1;
            continue;
        }
        by_date.entry(date).or_insert_with(|| {
            let mut record = ObservationRecord::empty(date);
            record.tmin = value_at(tmin, i);
            record.tmax = value_at(tmax, i);
            record.tavg = value_at(tavg, i);
            record.precip = value_at(precip, i);
            record.wind_max = value_at(wind, i);
            record.tavg = record.tavg_or_midpoint();
            record
        });
    }
    if outside > 0 {
        warn!("Dropped {} days outside the requested range {}", outside, span);
    }

    let missing = span.len() - by_date.len();
    if missing > 0 {
        warn!(
            "{} of {} requested days were not returned; writing them with empty values",
            missing,
            span.len()
        );
    }

    let label = location.label();
    Ok(span
        .days()
        .map(|day| {
            let mut record = by_date
                .remove(&day)
                .unwrap_or_else(|| ObservationRecord::empty(day));
            record.location = Some(label.clone());
            record.lat = Some(location.coordinates.latitude());
            record.lon = Some(location.coordinates.longitude());
            record
        })
        .collect())
}
