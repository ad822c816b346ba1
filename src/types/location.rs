//! Geographical coordinates and resolved locations.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Represents a geographical coordinate using latitude and longitude.
///
/// Latitude is the first element (index 0), and longitude is the second (index 1).
///
/// # Examples
///
/// ```
/// use weather_insights::LatLon;
///
/// let austin = LatLon(30.2672, -97.7431);
/// assert_eq!(austin.0, 30.2672); // Latitude
/// assert_eq!(austin.1, -97.7431); // Longitude
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon(pub f64, pub f64);

impl LatLon {
    pub fn latitude(&self) -> f64 {
        self.0
    }

    pub fn longitude(&self) -> f64 {
        self.1
    }

    /// Great-circle distance to `other` in kilometers.
    pub fn distance_km(&self, other: LatLon) -> f64 {
        haversine::distance(
            haversine::Location {
                latitude: self.0,
                longitude: self.1,
            },
            haversine::Location {
                latitude: other.0,
                longitude: other.1,
            },
            haversine::Units::Kilometers,
        )
    }
}

impl fmt::Display for LatLon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4},{:.4}", self.0, self.1)
    }
}

/// A place name resolved to coordinates by the geocoding service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    pub name: String,
    pub country_code: Option<String>,
    pub coordinates: LatLon,
    pub timezone: Option<String>,
}

impl GeoLocation {
    /// Label written to the `location` column, e.g. `"Austin,US"`.
    pub fn label(&self) -> String {
        match &self.country_code {
            Some(code) => format!("{},{}", self.name, code),
            None => self.name.clone(),
        }
    }

    /// A location given directly as coordinates, without a geocoding lookup.
    pub fn from_coordinates(coordinates: LatLon) -> Self {
        Self {
            name: coordinates.to_string(),
            country_code: None,
            coordinates,
            timezone: None,
        }
    }
}
