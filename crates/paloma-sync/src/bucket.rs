// SPDX-FileCopyrightText: 2026 Paloma Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bucket sync engine: forwards newly uploaded documents to the group.
//!
//! Each cycle lists the bucket newest-first, filters names without the
//! recognized document suffix and names already recorded in the ledger,
//! resolves a public URL, and sends one notification per new document.
//! Ordering is send-then-record: a crash between the two causes at most one
//! duplicate notification on the next cycle, never a silent drop.

use std::sync::Arc;
use std::time::Duration;

use paloma_core::{ConnectionState, Jid, ObjectStore, PalomaError, SendCapability};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::ledger::SentLedger;
use crate::scheduler;

/// Settings for one bucket sync engine.
#[derive(Debug, Clone)]
pub struct BucketSyncConfig {
    /// Poll period.
    pub interval: Duration,
    /// Listing prefix inside the bucket.
    pub prefix: String,
    /// Maximum listing page size per cycle.
    pub page_limit: usize,
    /// Recognized document suffix; other names are ignored.
    pub doc_suffix: String,
    /// Destination group.
    pub group: Jid,
}

/// Polls the storage listing and forwards unseen documents exactly once
/// per process history (ledger-gated).
pub struct BucketSync {
    store: Arc<dyn ObjectStore>,
    sender: Arc<dyn SendCapability>,
    ledger: SentLedger,
    config: BucketSyncConfig,
}

impl BucketSync {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        sender: Arc<dyn SendCapability>,
        ledger: SentLedger,
        config: BucketSyncConfig,
    ) -> Self {
        Self {
            store,
            sender,
            ledger,
            config,
        }
    }

    /// Runs cycles on the configured period until shutdown.
    ///
    /// Ticks while the session is not open are skipped; the single-task loop
    /// plus skipped missed ticks guarantee cycles never overlap.
    pub async fn run(mut self, cancel: CancellationToken) {
        let mut ticks = scheduler::cycle_interval(self.config.interval);
        loop {
            tokio::select! {
                _ = ticks.tick() => {
                    if self.sender.current_state() != ConnectionState::Open {
                        debug!("bucket sync tick skipped, session not open");
                        continue;
                    }
                    self.run_cycle().await;
                }
                _ = cancel.cancelled() => {
                    info!("bucket sync stopped");
                    break;
                }
            }
        }
    }

    /// Executes one listing-and-delivery cycle.
    ///
    /// Every failure is contained here: a listing error skips the cycle, a
    /// per-item error skips the item, and nothing propagates to the caller.
    pub async fn run_cycle(&mut self) {
        let entries = match self
            .store
            .list(&self.config.prefix, self.config.page_limit)
            .await
        {
            Ok(entries) => entries,
            Err(e) => {
                warn!(error = %e, "bucket listing failed, skipping cycle");
                return;
            }
        };

        for entry in entries {
            if !entry.name.ends_with(&self.config.doc_suffix) {
                continue;
            }
            if self.ledger.contains(&entry.name) {
                continue;
            }

            let url = match self.store.public_url(&entry.name).await {
                Ok(url) => url,
                Err(e) => {
                    warn!(file = %entry.name, error = %e, "public URL resolution failed, skipping");
                    continue;
                }
            };

            let body = notification_body(&entry.name, &url);
            match self.sender.send_text(&self.config.group, &body).await {
                Ok(_) => {
                    info!(file = %entry.name, "document forwarded");
                    // Recorded immediately after the send so a crash loses at
                    // most this one in-flight item.
                    if let Err(e) = self.ledger.insert(&entry.name) {
                        error!(
                            file = %entry.name,
                            error = %e,
                            "ledger write failed, item may be re-sent after restart"
                        );
                    }
                }
                Err(PalomaError::NotConnected) => {
                    debug!("session dropped mid-cycle, abandoning remaining entries");
                    return;
                }
                Err(e) => {
                    warn!(file = %entry.name, error = %e, "send failed, will retry next cycle");
                }
            }
        }
    }

    /// Read access for tests and status reporting.
    pub fn ledger(&self) -> &SentLedger {
        &self.ledger
    }
}

/// Notification text for one new document.
pub fn notification_body(name: &str, url: &str) -> String {
    format!("New document: {name}\n{url}")
}
