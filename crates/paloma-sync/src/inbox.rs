// SPDX-FileCopyrightText: 2026 Paloma Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inbox archiver: appends inbound chat traffic to the archive table.
//!
//! Consumes the connection manager's inbound batch stream. Only live
//! notification batches are archived; history replays delivered during
//! session bring-up are skipped. One record is written per message with
//! extractable text, and a persistence failure on one record never affects
//! the rest of the batch.

use std::sync::Arc;

use paloma_core::{InboxRecord, MessageBatch, RelayStore};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Archives inbound messages as append-only table rows.
pub struct InboxArchiver {
    store: Arc<dyn RelayStore>,
    inbound: mpsc::Receiver<MessageBatch>,
}

impl InboxArchiver {
    pub fn new(store: Arc<dyn RelayStore>, inbound: mpsc::Receiver<MessageBatch>) -> Self {
        Self { store, inbound }
    }

    /// Consumes batches until the stream closes or shutdown is requested.
    pub async fn run(mut self, cancel: CancellationToken) {
        loop {
            tokio::select! {
                batch = self.inbound.recv() => {
                    match batch {
                        Some(batch) => archive_batch(self.store.as_ref(), &batch).await,
                        None => {
                            debug!("inbound stream closed");
                            break;
                        }
                    }
                }
                _ = cancel.cancelled() => {
                    info!("inbox archiver stopped");
                    break;
                }
            }
        }
    }
}

/// Archives one batch. Public for tests.
pub async fn archive_batch(store: &dyn RelayStore, batch: &MessageBatch) {
    if !batch.live {
        debug!(count = batch.items.len(), "skipping history replay batch");
        return;
    }

    for item in &batch.items {
        let Some(text) = item.content.text() else {
            continue;
        };
        let record = InboxRecord {
            from_jid: item.from.clone(),
            to_jid: item.to.clone(),
            message: text.to_string(),
            received_at: item.timestamp,
        };
        if let Err(e) = store.insert_inbox(&record).await {
            warn!(from = %record.from_jid, error = %e, "failed to archive inbound message");
        }
    }
}
