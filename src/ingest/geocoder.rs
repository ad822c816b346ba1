use crate::ingest::error::IngestError;
use crate::ingest::http::get_json;
use crate::ingest::response::GeocodingResponse;
use crate::types::location::GeoLocation;
use bincode::config::{Configuration, Fixint, LittleEndian};
use log::info;
use reqwest::Client;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

const BINCODE_CACHE_FILE_NAME: &str = "geocode.bin";
const BINCODE_CONFIG: Configuration<LittleEndian, Fixint> =
    bincode::config::standard().with_fixed_int_encoding();

type GeocodeCache = HashMap<String, GeoLocation>;

/// Resolves place names to coordinates, remembering earlier answers on disk.
pub struct Geocoder {
    client: Client,
    url: String,
    cache_file: Option<PathBuf>,
}

impl Geocoder {
    pub fn new(client: Client, url: &str, cache_dir: Option<&Path>) -> Self {
        Self {
            client,
            url: url.to_string(),
            cache_file: cache_dir.map(|dir| dir.join(BINCODE_CACHE_FILE_NAME)),
        }
    }

    /// Returns the best match for `name`.
    pub async fn resolve(&self, name: &str) -> Result<GeoLocation, IngestError> {
        let key = name.trim().to_lowercase();
        let mut cache = match &self.cache_file {
            Some(path) if path.exists() => {
                let path = path.clone();
                tokio::task::spawn_blocking(move || read_cache(&path)).await??
            }
            _ => GeocodeCache::new(),
        };
        if let Some(hit) = cache.get(&key) {
            info!("Geocode cache hit for '{}'", name);
            return Ok(hit.clone());
        }

        let query = [
            ("name", name.trim().to_string()),
            ("count", "1".to_string()),
            ("language", "en".to_string()),
            ("format", "json".to_string()),
        ];
        let response: GeocodingResponse = get_json(&self.client, &self.url, &query).await?;
        let location: GeoLocation = response
            .results
            .into_iter()
            .next()
            .ok_or_else(|| IngestError::LocationNotFound(name.to_string()))?
            .into();
        info!(
            "Resolved '{}' to {} at {}",
            name,
            location.label(),
            location.coordinates
        );

        if let Some(path) = &self.cache_file {
            cache.insert(key, location.clone());
            write_cache(cache, path).await?;
        }
        Ok(location)
    }
}

fn read_cache(path: &Path) -> Result<GeocodeCache, IngestError> {
    let bytes =
        std::fs::read(path).map_err(|e| IngestError::CacheRead(path.to_path_buf(), e))?;
    let (cache, _) = bincode::serde::decode_from_slice::<GeocodeCache, _>(&bytes, BINCODE_CONFIG)
        .map_err(|e| IngestError::CacheDecode(path.to_path_buf(), Box::new(e)))?;
    Ok(cache)
}

async fn write_cache(cache: GeocodeCache, path: &Path) -> Result<(), IngestError> {
    let bytes = tokio::task::spawn_blocking(move || {
        bincode::serde::encode_to_vec(&cache, BINCODE_CONFIG)
            .map_err(|e| IngestError::CacheEncode(Box::new(e)))
    })
    .await??;
    tokio::fs::write(path, &bytes)
        .await
        .map_err(|e| IngestError::CacheWrite(path.to_path_buf(), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::location::LatLon;

    #[tokio::test]
    async fn cache_round_trips_through_disk() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join(BINCODE_CACHE_FILE_NAME);
        let mut cache = GeocodeCache::new();
        cache.insert(
            "austin,us".to_string(),
            GeoLocation {
                name: "Austin".to_string(),
                country_code: Some("US".to_string()),
                coordinates: LatLon(30.26715, -97.74306),
                timezone: None,
            },
        );
        write_cache(cache.clone(), &path).await?;
        assert_eq!(read_cache(&path)?, cache);
        Ok(())
    }

    #[tokio::test]
    async fn cached_name_needs_no_network() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let location = GeoLocation::from_coordinates(LatLon(1.0, 2.0));
        let mut cache = GeocodeCache::new();
        cache.insert("somewhere".to_string(), location.clone());
        write_cache(cache, &dir.path().join(BINCODE_CACHE_FILE_NAME)).await?;

        // An unroutable URL: a cache miss would fail with a network error.
        let geocoder = Geocoder::new(Client::new(), "http://127.0.0.1:9/search", Some(dir.path()));
        assert_eq!(geocoder.resolve("  Somewhere ").await?, location);
        Ok(())
    }
}
