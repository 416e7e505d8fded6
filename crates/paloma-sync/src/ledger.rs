// SPDX-FileCopyrightText: 2026 Paloma Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable set of already-delivered file names.
//!
//! The ledger is a flat JSON array on disk. Load is best-effort: a missing or
//! unreadable file initializes an empty set, favoring a possible duplicate
//! send after rare corruption over refusing to start. Every insert is flushed
//! through a temp file + atomic rename before the caller proceeds, so a crash
//! mid-batch loses at most the in-flight item.

use std::collections::BTreeSet;
use std::io::Write;
use std::path::PathBuf;

use paloma_core::PalomaError;
use tracing::{debug, warn};

/// Local durable record of which files have already been forwarded.
pub struct SentLedger {
    path: PathBuf,
    names: BTreeSet<String>,
}

impl SentLedger {
    /// Loads the ledger from `path`, initializing empty when the file is
    /// missing or unreadable.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let names = match std::fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<BTreeSet<String>>(&raw) {
                Ok(names) => names,
                Err(e) => {
                    warn!(
                        path = %path.display(),
                        error = %e,
                        "ledger file malformed, starting empty (duplicates possible)"
                    );
                    BTreeSet::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeSet::new(),
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "ledger file unreadable, starting empty (duplicates possible)"
                );
                BTreeSet::new()
            }
        };
        debug!(count = names.len(), "sent-item ledger loaded");
        Self { path, names }
    }

    /// Whether `name` has already been delivered.
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Number of recorded deliveries.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Records a delivered name and flushes the full set to disk before
    /// returning. Names are never removed.
    pub fn insert(&mut self, name: &str) -> Result<(), PalomaError> {
        if !self.names.insert(name.to_string()) {
            return Ok(());
        }
        self.flush()
    }

    fn flush(&self) -> Result<(), PalomaError> {
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        std::fs::create_dir_all(&dir).map_err(|e| {
            PalomaError::storage(
                format!("failed to create ledger directory {}", dir.display()),
                e,
            )
        })?;

        let raw = serde_json::to_vec(&self.names)
            .map_err(|e| PalomaError::storage("failed to serialize ledger", e))?;

        // Temp file in the target directory so the rename stays atomic.
        let mut tmp = tempfile::NamedTempFile::new_in(&dir)
            .map_err(|e| PalomaError::storage("failed to create ledger temp file", e))?;
        tmp.write_all(&raw)
            .map_err(|e| PalomaError::storage("failed to write ledger", e))?;
        tmp.persist(&self.path).map_err(|e| {
            PalomaError::storage(
                format!("failed to persist ledger {}", self.path.display()),
                e,
            )
        })?;
        Ok(())
    }
}
