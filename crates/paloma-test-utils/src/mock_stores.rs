// SPDX-FileCopyrightText: 2026 Paloma Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory object-store and relay-store mocks for engine tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use paloma_core::{FileRecord, InboxRecord, ObjectStore, OutboxRow, PalomaError, RelayStore};

/// Mock bucket backed by an in-memory listing.
pub struct MockObjectStore {
    entries: Mutex<Vec<FileRecord>>,
    fail_list: AtomicBool,
    fail_url_for: Mutex<Vec<String>>,
}

impl MockObjectStore {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            fail_list: AtomicBool::new(false),
            fail_url_for: Mutex::new(Vec::new()),
        }
    }

    /// Add a listing entry.
    pub fn add_entry(&self, name: &str, created_at: DateTime<Utc>) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(FileRecord {
                name: name.to_string(),
                created_at,
            });
    }

    /// Make `list()` fail until cleared.
    pub fn set_fail_list(&self, fail: bool) {
        self.fail_list.store(fail, Ordering::SeqCst);
    }

    /// Make `public_url()` fail for one object name.
    pub fn fail_url_for(&self, name: &str) {
        self.fail_url_for
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(name.to_string());
    }
}

impl Default for MockObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ObjectStore for MockObjectStore {
    async fn list(&self, prefix: &str, limit: usize) -> Result<Vec<FileRecord>, PalomaError> {
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(PalomaError::Storage {
                message: "injected listing failure".into(),
                source: None,
            });
        }
        let mut entries: Vec<FileRecord> = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|e| e.name.starts_with(prefix))
            .cloned()
            .collect();
        // Newest first, the order the real backend is asked for.
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        entries.truncate(limit);
        Ok(entries)
    }

    async fn public_url(&self, name: &str) -> Result<String, PalomaError> {
        let failing = self
            .fail_url_for
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .any(|n| n == name);
        if failing {
            return Err(PalomaError::Storage {
                message: format!("injected URL resolution failure for {name}"),
                source: None,
            });
        }
        Ok(format!("https://cdn.test/{name}"))
    }
}

/// Mock outbox/inbox tables.
pub struct MockRelayStore {
    outbox: Mutex<Vec<OutboxRow>>,
    inbox: Mutex<Vec<InboxRecord>>,
    table_missing: AtomicBool,
    fail_insert: AtomicBool,
}

impl MockRelayStore {
    pub fn new() -> Self {
        Self {
            outbox: Mutex::new(Vec::new()),
            inbox: Mutex::new(Vec::new()),
            table_missing: AtomicBool::new(false),
            fail_insert: AtomicBool::new(false),
        }
    }

    /// Seed one outbox row.
    pub fn add_outbox_row(&self, row: OutboxRow) {
        self.outbox
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(row);
    }

    /// Simulate the optional outbox table not existing.
    pub fn set_table_missing(&self, missing: bool) {
        self.table_missing.store(missing, Ordering::SeqCst);
    }

    /// Make inbox inserts fail until cleared.
    pub fn set_fail_insert(&self, fail: bool) {
        self.fail_insert.store(fail, Ordering::SeqCst);
    }

    /// Snapshot of all outbox rows.
    pub fn outbox_rows(&self) -> Vec<OutboxRow> {
        self.outbox
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Snapshot of all archived inbox records.
    pub fn inbox_records(&self) -> Vec<InboxRecord> {
        self.inbox
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Default for MockRelayStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RelayStore for MockRelayStore {
    async fn unsent_outbox(&self, limit: usize) -> Result<Vec<OutboxRow>, PalomaError> {
        if self.table_missing.load(Ordering::SeqCst) {
            return Err(PalomaError::Storage {
                message: "relation \"messages_outbox\" does not exist".into(),
                source: None,
            });
        }
        let mut rows: Vec<OutboxRow> = self
            .outbox
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|r| r.sent_at.is_none())
            .cloned()
            .collect();
        rows.sort_by_key(|r| r.id);
        rows.truncate(limit);
        Ok(rows)
    }

    async fn mark_sent(
        &self,
        id: i64,
        wa_msg_id: Option<&str>,
        sent_at: DateTime<Utc>,
    ) -> Result<(), PalomaError> {
        let mut rows = self.outbox.lock().unwrap_or_else(PoisonError::into_inner);
        match rows.iter_mut().find(|r| r.id == id) {
            Some(row) => {
                row.sent_at = Some(sent_at);
                row.wa_msg_id = wa_msg_id.map(str::to_string);
                Ok(())
            }
            None => Err(PalomaError::Storage {
                message: format!("outbox row {id} not found"),
                source: None,
            }),
        }
    }

    async fn insert_inbox(&self, record: &InboxRecord) -> Result<(), PalomaError> {
        if self.fail_insert.load(Ordering::SeqCst) {
            return Err(PalomaError::Storage {
                message: "injected inbox insert failure".into(),
                source: None,
            });
        }
        self.inbox
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record.clone());
        Ok(())
    }
}
