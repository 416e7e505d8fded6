// SPDX-FileCopyrightText: 2026 Paloma Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Supabase storage and PostgREST APIs.
//!
//! Handles authentication headers and connection pooling; the bucket and
//! table adapters build on it.

use std::time::Duration;

use paloma_core::PalomaError;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};

/// Request timeout for all backend calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Shared HTTP client for Supabase API communication.
#[derive(Debug, Clone)]
pub struct SupabaseClient {
    http: reqwest::Client,
    base_url: String,
}

impl SupabaseClient {
    /// Creates a client for the given project base URL and service-role key.
    pub fn new(base_url: &str, service_key: &str) -> Result<Self, PalomaError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "apikey",
            HeaderValue::from_str(service_key)
                .map_err(|e| PalomaError::Config(format!("invalid service key header: {e}")))?,
        );
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {service_key}"))
                .map_err(|e| PalomaError::Config(format!("invalid service key header: {e}")))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| PalomaError::Storage {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// The underlying HTTP client.
    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Absolute URL for an API path.
    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

/// Maps a non-success response to a storage error carrying status and body.
pub(crate) async fn check_status(
    response: reqwest::Response,
    context: &str,
) -> Result<reqwest::Response, PalomaError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(PalomaError::Storage {
        message: format!("{context} returned {status}: {body}"),
        source: None,
    })
}
