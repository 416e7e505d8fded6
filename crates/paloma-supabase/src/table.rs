// SPDX-FileCopyrightText: 2026 Paloma Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! [`RelayStore`] implementation over the PostgREST API.
//!
//! The outbox query filters on `sent_at=is.null` so delivered rows are never
//! selected again; the update after a send sets `sent_at` and `wa_msg_id` in
//! place. The `messages_outbox` table is optional: a missing relation comes
//! back as a storage error the engines treat as a skipped cycle.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use paloma_core::{InboxRecord, OutboxRow, PalomaError, RelayStore};
use tracing::debug;

use crate::client::{check_status, SupabaseClient};

const OUTBOX_TABLE: &str = "messages_outbox";
const INBOX_TABLE: &str = "messages_inbox";

/// PostgREST adapter for the outbox and inbox tables.
pub struct TableStore {
    client: SupabaseClient,
}

impl TableStore {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RelayStore for TableStore {
    async fn unsent_outbox(&self, limit: usize) -> Result<Vec<OutboxRow>, PalomaError> {
        let url = self.client.url(&format!("rest/v1/{OUTBOX_TABLE}"));
        let response = self
            .client
            .http()
            .get(&url)
            .query(&[
                ("select", "*"),
                ("sent_at", "is.null"),
                ("order", "id.asc"),
                ("limit", &limit.to_string()),
            ])
            .send()
            .await
            .map_err(|e| PalomaError::storage("outbox select request failed", e))?;
        let response = check_status(response, "outbox select").await?;

        let rows: Vec<OutboxRow> = response
            .json()
            .await
            .map_err(|e| PalomaError::storage("outbox select body malformed", e))?;
        debug!(count = rows.len(), "outbox rows selected");
        Ok(rows)
    }

    async fn mark_sent(
        &self,
        id: i64,
        wa_msg_id: Option<&str>,
        sent_at: DateTime<Utc>,
    ) -> Result<(), PalomaError> {
        let url = self.client.url(&format!("rest/v1/{OUTBOX_TABLE}"));
        let response = self
            .client
            .http()
            .patch(&url)
            .query(&[("id", format!("eq.{id}"))])
            .header("Prefer", "return=minimal")
            .json(&serde_json::json!({
                "sent_at": sent_at,
                "wa_msg_id": wa_msg_id,
            }))
            .send()
            .await
            .map_err(|e| PalomaError::storage("outbox update request failed", e))?;
        check_status(response, "outbox update").await?;
        Ok(())
    }

    async fn insert_inbox(&self, record: &InboxRecord) -> Result<(), PalomaError> {
        let url = self.client.url(&format!("rest/v1/{INBOX_TABLE}"));
        let response = self
            .client
            .http()
            .post(&url)
            .header("Prefer", "return=minimal")
            .json(record)
            .send()
            .await
            .map_err(|e| PalomaError::storage("inbox insert request failed", e))?;
        check_status(response, "inbox insert").await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paloma_core::Jid;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn store(server: &MockServer) -> TableStore {
        TableStore::new(SupabaseClient::new(&server.uri(), "test-key").unwrap())
    }

    #[tokio::test]
    async fn unsent_outbox_filters_on_null_sent_at() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/messages_outbox"))
            .and(query_param("sent_at", "is.null"))
            .and(query_param("order", "id.asc"))
            .and(query_param("limit", "50"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"id": 1, "to": null, "message": "hi", "sent_at": null, "wa_msg_id": null},
                {"id": 2, "to": "user@s.whatsapp.net", "message": "direct", "sent_at": null, "wa_msg_id": null}
            ])))
            .mount(&server)
            .await;

        let rows = store(&server).await.unsent_outbox(50).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, 1);
        assert!(rows[0].to.is_none());
        assert_eq!(rows[1].to, Some(Jid("user@s.whatsapp.net".into())));
    }

    #[tokio::test]
    async fn missing_table_surfaces_as_storage_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/messages_outbox"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "code": "42P01",
                "message": "relation \"public.messages_outbox\" does not exist"
            })))
            .mount(&server)
            .await;

        let err = store(&server).await.unsent_outbox(50).await.unwrap_err();
        assert!(err.to_string().contains("outbox select"));
    }

    #[tokio::test]
    async fn mark_sent_patches_row_by_id() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/rest/v1/messages_outbox"))
            .and(query_param("id", "eq.7"))
            .and(header("Prefer", "return=minimal"))
            .and(body_partial_json(serde_json::json!({"wa_msg_id": "WAMID.1"})))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        store(&server)
            .await
            .mark_sent(7, Some("WAMID.1"), Utc::now())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn mark_sent_serializes_missing_receipt_as_null() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/rest/v1/messages_outbox"))
            .and(query_param("id", "eq.9"))
            .and(body_partial_json(serde_json::json!({"wa_msg_id": null})))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        store(&server)
            .await
            .mark_sent(9, None, Utc::now())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn insert_inbox_posts_full_record() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/messages_inbox"))
            .and(header("Prefer", "return=minimal"))
            .and(body_partial_json(serde_json::json!({
                "from_jid": "sender@s.whatsapp.net",
                "message": "hello"
            })))
            .respond_with(ResponseTemplate::new(201))
            .mount(&server)
            .await;

        let record = InboxRecord {
            from_jid: Jid("sender@s.whatsapp.net".into()),
            to_jid: Jid("self@s.whatsapp.net".into()),
            message: "hello".into(),
            received_at: Utc::now(),
        };
        store(&server).await.insert_inbox(&record).await.unwrap();
    }

    #[tokio::test]
    async fn insert_failure_is_an_error_for_the_caller_to_contain() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/messages_inbox"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let record = InboxRecord {
            from_jid: Jid("a@s.whatsapp.net".into()),
            to_jid: Jid("b@s.whatsapp.net".into()),
            message: "x".into(),
            received_at: Utc::now(),
        };
        assert!(store(&server).await.insert_inbox(&record).await.is_err());
    }
}
