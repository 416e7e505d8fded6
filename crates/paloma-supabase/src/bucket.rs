// SPDX-FileCopyrightText: 2026 Paloma Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! [`ObjectStore`] implementation over the Supabase storage API.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use paloma_core::{FileRecord, ObjectStore, PalomaError};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::client::{check_status, SupabaseClient};

/// Bucket adapter listing objects newest-first and resolving public URLs.
pub struct BucketStore {
    client: SupabaseClient,
    bucket: String,
}

impl BucketStore {
    pub fn new(client: SupabaseClient, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }
}

/// Body of the storage list call.
#[derive(Debug, Serialize)]
struct ListRequest<'a> {
    prefix: &'a str,
    limit: usize,
    #[serde(rename = "sortBy")]
    sort_by: SortBy,
}

#[derive(Debug, Serialize)]
struct SortBy {
    column: &'static str,
    order: &'static str,
}

/// One storage listing entry. Folder placeholders carry no `created_at`.
#[derive(Debug, Deserialize)]
struct ListedObject {
    name: String,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
}

#[async_trait]
impl ObjectStore for BucketStore {
    async fn list(&self, prefix: &str, limit: usize) -> Result<Vec<FileRecord>, PalomaError> {
        let url = self
            .client
            .url(&format!("storage/v1/object/list/{}", self.bucket));
        let body = ListRequest {
            prefix,
            limit,
            sort_by: SortBy {
                column: "created_at",
                order: "desc",
            },
        };

        let response = self
            .client
            .http()
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| PalomaError::storage("bucket listing request failed", e))?;
        let response = check_status(response, "bucket listing").await?;

        let objects: Vec<ListedObject> = response
            .json()
            .await
            .map_err(|e| PalomaError::storage("bucket listing body malformed", e))?;

        debug!(bucket = %self.bucket, count = objects.len(), "bucket listed");
        Ok(objects
            .into_iter()
            .map(|o| FileRecord {
                name: o.name,
                created_at: o.created_at.unwrap_or(DateTime::UNIX_EPOCH),
            })
            .collect())
    }

    async fn public_url(&self, name: &str) -> Result<String, PalomaError> {
        if name.is_empty() || name.starts_with('/') || name.contains("..") {
            return Err(PalomaError::Storage {
                message: format!("object name `{name}` cannot be resolved to a public URL"),
                source: None,
            });
        }
        Ok(self
            .client
            .url(&format!("storage/v1/object/public/{}/{name}", self.bucket)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn store(server: &MockServer) -> BucketStore {
        let client = SupabaseClient::new(&server.uri(), "test-key").unwrap();
        BucketStore::new(client, "documents")
    }

    #[tokio::test]
    async fn list_requests_descending_created_at_and_maps_records() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/storage/v1/object/list/documents"))
            .and(header("apikey", "test-key"))
            .and(body_partial_json(serde_json::json!({
                "limit": 100,
                "sortBy": {"column": "created_at", "order": "desc"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"name": "b.pdf", "created_at": "2026-02-01T10:00:00Z"},
                {"name": "a.pdf", "created_at": "2026-01-01T10:00:00Z"}
            ])))
            .mount(&server)
            .await;

        let records = store(&server).await.list("", 100).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "b.pdf");
        assert!(records[0].created_at > records[1].created_at);
    }

    #[tokio::test]
    async fn list_tolerates_entries_without_created_at() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/storage/v1/object/list/documents"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"name": "placeholder"}
            ])))
            .mount(&server)
            .await;

        let records = store(&server).await.list("", 10).await.unwrap();
        assert_eq!(records[0].created_at, DateTime::UNIX_EPOCH);
    }

    #[tokio::test]
    async fn list_error_status_surfaces_as_storage_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/storage/v1/object/list/documents"))
            .respond_with(ResponseTemplate::new(500).set_body_string("backend down"))
            .mount(&server)
            .await;

        let err = store(&server).await.list("", 10).await.unwrap_err();
        assert!(err.to_string().contains("storage error"));
    }

    #[tokio::test]
    async fn public_url_is_constructed_from_bucket_and_name() {
        let server = MockServer::start().await;
        let url = store(&server)
            .await
            .public_url("report.pdf")
            .await
            .unwrap();
        assert_eq!(
            url,
            format!("{}/storage/v1/object/public/documents/report.pdf", server.uri())
        );
    }

    #[tokio::test]
    async fn public_url_rejects_traversal_names() {
        let server = MockServer::start().await;
        let s = store(&server).await;
        assert!(s.public_url("").await.is_err());
        assert!(s.public_url("/etc/passwd").await.is_err());
        assert!(s.public_url("../secrets.pdf").await.is_err());
    }
}
