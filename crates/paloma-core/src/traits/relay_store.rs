// SPDX-FileCopyrightText: 2026 Paloma Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Relational backend adapter trait for the outbox and inbox tables.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::PalomaError;
use crate::types::{InboxRecord, OutboxRow};

/// Adapter for the `messages_outbox` / `messages_inbox` tables.
///
/// The outbox table is optional: a backend without it returns a storage
/// error from [`unsent_outbox`](RelayStore::unsent_outbox), which callers
/// treat as a skipped cycle, never a crash.
#[async_trait]
pub trait RelayStore: Send + Sync {
    /// Selects up to `limit` rows with `sent_at` unset, oldest id first.
    async fn unsent_outbox(&self, limit: usize) -> Result<Vec<OutboxRow>, PalomaError>;

    /// Marks one row delivered, recording the receipt identifier if any.
    async fn mark_sent(
        &self,
        id: i64,
        wa_msg_id: Option<&str>,
        sent_at: DateTime<Utc>,
    ) -> Result<(), PalomaError>;

    /// Appends one inbound archive record.
    async fn insert_inbox(&self, record: &InboxRecord) -> Result<(), PalomaError>;
}
