//! The observation record produced by the ingest stage.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One day of weather for one location.
///
/// Records are created by the ingest stage and treated as immutable afterwards.
/// Every measurement is optional: the source may not report a value for a day,
/// and the ingest gap policy emits a record with empty measurements for days the
/// source left out entirely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationRecord {
    /// Calendar day of the observation. Unique within a file.
    pub date: NaiveDate,
    /// Minimum air temperature at 2 m (°C).
    pub tmin: Option<f64>,
    /// Maximum air temperature at 2 m (°C).
    pub tmax: Option<f64>,
    /// Mean air temperature at 2 m (°C).
    pub tavg: Option<f64>,
    /// Precipitation sum (mm).
    pub precip: Option<f64>,
    /// Maximum wind speed at 10 m (km/h).
    pub wind_max: Option<f64>,
    /// Human readable location label, e.g. `"Austin,US"`.
    pub location: Option<String>,
    /// Latitude of the location the data was fetched for.
    pub lat: Option<f64>,
    /// Longitude of the location the data was fetched for.
    pub lon: Option<f64>,
}

impl ObservationRecord {
    /// A record for `date` with every measurement missing.
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            tmin: None,
            tmax: None,
            tavg: None,
            precip: None,
            wind_max: None,
            location: None,
            lat: None,
            lon: None,
        }
    }

    /// Mean temperature, falling back to the midpoint of min and max.
    pub fn tavg_or_midpoint(&self) -> Option<f64> {
        self.tavg.or(match (self.tmin, self.tmax) {
            (Some(lo), Some(hi)) => Some((lo + hi) / 2.0),
            _ => None,
        })
    }
}
