//! REST implementation of the remote visit source.

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use serde::de::DeserializeOwned;
use visit_sync_core::sync::{LastVitalsQuery, RemoteResult};
use visit_sync_core::{Encounter, RemoteError, RemoteVisitSource, SyncConfig, Visit, VisitType};

use crate::types::{ApiErrorResponse, Results};

/// Default timeout for API requests.
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const MAX_LOG_BODY_CHARS: usize = 512;

/// Path of the REST resource API below the server URL.
const REST_API_PATH: &str = "ws/rest/v1";

fn transport_error(err: reqwest::Error) -> RemoteError {
    RemoteError::Transport(err.to_string())
}

/// Client for the records server's visit, encounter and visit type resources.
#[derive(Debug, Clone)]
pub struct RestVisitSource {
    client: reqwest::Client,
    base_url: String,
}

impl RestVisitSource {
    /// Create a client for a server.
    ///
    /// # Arguments
    ///
    /// * `server_url` - The server root (e.g., "https://demo.openmrs.org/openmrs")
    pub fn new(server_url: &str) -> RemoteResult<Self> {
        Self::with_timeout(server_url, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Create a client with a custom request timeout.
    pub fn with_timeout(server_url: &str, timeout: Duration) -> RemoteResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(transport_error)?;

        Ok(Self {
            client,
            base_url: format!("{}/{}", server_url.trim_end_matches('/'), REST_API_PATH),
        })
    }

    /// Create a client for the configured server.
    pub fn from_config(config: &SyncConfig) -> RemoteResult<Self> {
        Self::new(&config.server_url)
    }

    fn url(&self, resource: &str) -> String {
        format!("{}/{}", self.base_url, resource)
    }

    fn log_response(status: reqwest::StatusCode, body: &str) {
        if status.is_success() {
            debug!("API response status: {}", status);
            return;
        }

        let mut preview = body.chars().take(MAX_LOG_BODY_CHARS).collect::<String>();
        if body.chars().count() > MAX_LOG_BODY_CHARS {
            preview.push_str("...");
        }
        debug!("API response error ({}): {}", status, preview);
    }

    /// Send a request and decode a JSON response body.
    async fn send<T: DeserializeOwned>(request: reqwest::RequestBuilder) -> RemoteResult<T> {
        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        let body = response.text().await.map_err(transport_error)?;
        Self::log_response(status, &body);

        if !status.is_success() {
            let message = serde_json::from_str::<ApiErrorResponse>(&body)
                .ok()
                .map(|e| e.error.message)
                .filter(|m| !m.is_empty())
                .or_else(|| status.canonical_reason().map(String::from))
                .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
            return Err(RemoteError::api(status.as_u16(), message));
        }

        serde_json::from_str(&body).map_err(|e| {
            log::error!("Failed to deserialize response: {}", e);
            RemoteError::Decode(e.to_string())
        })
    }
}

#[async_trait]
impl RemoteVisitSource for RestVisitSource {
    async fn find_visits(&self, patient_uuid: &str, expansion: &str) -> RemoteResult<Vec<Visit>> {
        let request = self
            .client
            .get(self.url("visit"))
            .query(&[("patient", patient_uuid), ("v", expansion)]);
        let results: Results<Visit> = Self::send(request).await?;
        Ok(results.results)
    }

    async fn get_last_vitals(&self, query: &LastVitalsQuery) -> RemoteResult<Vec<Encounter>> {
        let limit = query.limit.to_string();
        let request = self.client.get(self.url("encounter")).query(&[
            ("patient", query.patient_uuid.as_str()),
            ("encounterType", query.encounter_type_uuid.as_str()),
            ("v", query.representation.as_str()),
            ("limit", limit.as_str()),
            ("order", query.order.as_str()),
        ]);
        let results: Results<Encounter> = Self::send(request).await?;
        Ok(results.results)
    }

    async fn get_visit_types(&self) -> RemoteResult<Vec<VisitType>> {
        let request = self.client.get(self.url("visittype"));
        let results: Results<VisitType> = Self::send(request).await?;
        Ok(results.results)
    }

    async fn create_visit(&self, visit: &Visit) -> RemoteResult<Visit> {
        let request = self.client.post(self.url("visit")).json(visit);
        Self::send(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_normalized() {
        let source = RestVisitSource::new("http://localhost:8080/openmrs/").unwrap();
        assert_eq!(
            source.url("visit"),
            "http://localhost:8080/openmrs/ws/rest/v1/visit"
        );
    }

    #[test]
    fn test_from_config() {
        let config = SyncConfig::new("https://demo.openmrs.org/openmrs", "Pharmacy", "vt-1");
        let source = RestVisitSource::from_config(&config).unwrap();
        assert_eq!(
            source.url("visittype"),
            "https://demo.openmrs.org/openmrs/ws/rest/v1/visittype"
        );
    }
}
