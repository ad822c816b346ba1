use crate::ingest::error::IngestError;
use crate::ingest::response::ApiErrorBody;
use log::{debug, warn};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;

pub(crate) fn build_client(timeout: Duration) -> Result<Client, IngestError> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(IngestError::ClientBuild)
}

/// The `reason` of an API error body, or the whole body if it is not one.
fn error_reason(body: String) -> String {
    serde_json::from_str::<ApiErrorBody>(&body)
        .map(|b| b.reason)
        .unwrap_or(body)
}

/// Sends a GET request and decodes the JSON body.
///
/// Non-2xx responses become [`IngestError::HttpStatus`] carrying the `reason`
/// the API put in its error body, or the raw body when it has none.
pub(crate) async fn get_json<T: DeserializeOwned>(
    client: &Client,
    base_url: &str,
    query: &[(&str, String)],
) -> Result<T, IngestError> {
    let request = client
        .get(base_url)
        .query(query)
        .build()
        .map_err(|e| IngestError::NetworkRequest(base_url.to_string(), e))?;
    let url = request.url().to_string();
    debug!("GET {}", url);

    let response = client
        .execute(request)
        .await
        .map_err(|e| IngestError::NetworkRequest(url.clone(), e))?;
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| IngestError::NetworkRequest(url.clone(), e))?;

    if !status.is_success() {
        warn!("HTTP error {} for {}", status, url);
        return Err(IngestError::HttpStatus {
            url,
            status,
            reason: error_reason(body),
        });
    }

    serde_json::from_str(&body).map_err(|e| IngestError::JsonParse(url, e))
}
