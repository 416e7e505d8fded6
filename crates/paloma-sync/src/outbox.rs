// SPDX-FileCopyrightText: 2026 Paloma Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbox sync engine: delivers queued outbound message rows.
//!
//! Each cycle selects rows with `sent_at` unset and sends them sequentially.
//! Rows are marked sent only after a successful delivery, so a row stays
//! eligible for retry on every subsequent cycle until it goes through
//! (at-least-once, no backoff or attempt cap). The outbox table is optional:
//! a failing select is logged and the cycle skipped, never a crash.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use paloma_core::{ConnectionState, Jid, RelayStore, SendCapability};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::scheduler;

/// Settings for one outbox sync engine.
#[derive(Debug, Clone)]
pub struct OutboxSyncConfig {
    /// Poll period.
    pub interval: Duration,
    /// Maximum rows selected per cycle.
    pub batch: usize,
    /// Destination for rows without an explicit `to`.
    pub default_group: Jid,
}

/// Polls the outbox table and delivers pending rows.
pub struct OutboxSync {
    store: Arc<dyn RelayStore>,
    sender: Arc<dyn SendCapability>,
    config: OutboxSyncConfig,
}

impl OutboxSync {
    pub fn new(
        store: Arc<dyn RelayStore>,
        sender: Arc<dyn SendCapability>,
        config: OutboxSyncConfig,
    ) -> Self {
        Self {
            store,
            sender,
            config,
        }
    }

    /// Runs cycles on the configured period until shutdown.
    pub async fn run(self, cancel: CancellationToken) {
        let mut ticks = scheduler::cycle_interval(self.config.interval);
        loop {
            tokio::select! {
                _ = ticks.tick() => {
                    if self.sender.current_state() != ConnectionState::Open {
                        debug!("outbox sync tick skipped, session not open");
                        continue;
                    }
                    self.run_cycle().await;
                }
                _ = cancel.cancelled() => {
                    info!("outbox sync stopped");
                    break;
                }
            }
        }
    }

    /// Executes one select-and-deliver cycle.
    ///
    /// A failure on one row never aborts the remaining rows; a select failure
    /// (including a missing table) skips the whole cycle.
    pub async fn run_cycle(&self) {
        let rows = match self.store.unsent_outbox(self.config.batch).await {
            Ok(rows) => rows,
            Err(e) => {
                debug!(error = %e, "outbox select failed (table may be absent), skipping cycle");
                return;
            }
        };

        for row in rows {
            if row.message.trim().is_empty() {
                debug!(id = row.id, "skipping outbox row with empty body");
                continue;
            }

            let target = row
                .to
                .clone()
                .unwrap_or_else(|| self.config.default_group.clone());

            match self.sender.send_text(&target, &row.message).await {
                Ok(receipt) => {
                    let wa_msg_id = receipt.message_id.as_ref().map(|id| id.0.as_str());
                    match self.store.mark_sent(row.id, wa_msg_id, Utc::now()).await {
                        Ok(()) => info!(id = row.id, "outbox row delivered"),
                        Err(e) => warn!(
                            id = row.id,
                            error = %e,
                            "delivered but failed to mark sent, row will be retried"
                        ),
                    }
                }
                Err(e) => {
                    warn!(id = row.id, error = %e, "outbox send failed, row stays eligible");
                }
            }
        }
    }
}
