// SPDX-FileCopyrightText: 2026 Paloma Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable storage for transport session credentials.
//!
//! Credentials are a set of small named JSON blobs mirrored to a directory,
//! read once at startup and rewritten on every rotation event. Each write
//! goes through a temp file in the same directory followed by an atomic
//! rename, so a crash mid-write never clobbers the previously persisted
//! blob.

use std::io::Write;
use std::path::PathBuf;

use paloma_core::{Credentials, CredentialUpdate, PalomaError};
use tracing::{debug, warn};

/// Persists and reloads transport session credentials across restarts.
pub struct CredentialStore {
    dir: PathBuf,
}

impl CredentialStore {
    /// Creates a store rooted at `dir`. The directory is created lazily on
    /// the first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Loads all credential blobs from disk.
    ///
    /// Load is best-effort: a missing directory yields an empty set (first
    /// run, not yet paired) and an unreadable or malformed blob is skipped
    /// with a warning rather than failing startup.
    pub fn load(&self) -> Credentials {
        let mut creds = Credentials::default();

        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) => {
                debug!(
                    dir = %self.dir.display(),
                    error = %e,
                    "credential directory not readable, starting unpaired"
                );
                return creds;
            }
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            match std::fs::read_to_string(&path) {
                Ok(raw) => match serde_json::from_str(&raw) {
                    Ok(value) => {
                        creds.files.insert(name, value);
                    }
                    Err(e) => {
                        warn!(file = %name, error = %e, "skipping malformed credential blob");
                    }
                },
                Err(e) => {
                    warn!(file = %name, error = %e, "skipping unreadable credential blob");
                }
            }
        }

        debug!(count = creds.files.len(), "credentials loaded");
        creds
    }

    /// Persists one rotated credential blob, atomically replacing any
    /// previous version of the same file.
    pub fn store(&self, update: &CredentialUpdate) -> Result<(), PalomaError> {
        std::fs::create_dir_all(&self.dir).map_err(|e| {
            PalomaError::storage(
                format!("failed to create credential directory {}", self.dir.display()),
                e,
            )
        })?;

        let name = sanitize_file_name(&update.file);
        let target = self.dir.join(&name);

        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir).map_err(|e| {
            PalomaError::storage("failed to create credential temp file", e)
        })?;
        let raw = serde_json::to_vec(&update.data)
            .map_err(|e| PalomaError::storage("failed to serialize credential blob", e))?;
        tmp.write_all(&raw)
            .map_err(|e| PalomaError::storage("failed to write credential blob", e))?;
        tmp.persist(&target).map_err(|e| {
            PalomaError::storage(
                format!("failed to persist credential blob {}", target.display()),
                e,
            )
        })?;

        debug!(file = %name, "credential blob persisted");
        Ok(())
    }
}

/// Restricts a credential file name to a safe flat-file character set.
fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '-'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn update(file: &str, value: serde_json::Value) -> CredentialUpdate {
        CredentialUpdate {
            file: file.to_string(),
            data: value,
        }
    }

    #[test]
    fn load_missing_directory_yields_empty_set() {
        let dir = tempdir().unwrap();
        let store = CredentialStore::new(dir.path().join("absent"));
        assert!(store.load().is_empty());
    }

    #[test]
    fn store_then_load_round_trips() {
        let dir = tempdir().unwrap();
        let store = CredentialStore::new(dir.path());

        store
            .store(&update("creds.json", serde_json::json!({"epoch": 7})))
            .unwrap();
        store
            .store(&update("keys.json", serde_json::json!(["a", "b"])))
            .unwrap();

        let creds = store.load();
        assert_eq!(creds.files.len(), 2);
        assert_eq!(creds.files["creds.json"]["epoch"], 7);
        assert_eq!(creds.files["keys.json"][1], "b");
    }

    #[test]
    fn store_overwrites_previous_blob() {
        let dir = tempdir().unwrap();
        let store = CredentialStore::new(dir.path());

        store
            .store(&update("creds.json", serde_json::json!({"epoch": 1})))
            .unwrap();
        store
            .store(&update("creds.json", serde_json::json!({"epoch": 2})))
            .unwrap();

        let creds = store.load();
        assert_eq!(creds.files.len(), 1);
        assert_eq!(creds.files["creds.json"]["epoch"], 2);
    }

    #[test]
    fn malformed_blob_is_skipped_not_fatal() {
        let dir = tempdir().unwrap();
        let store = CredentialStore::new(dir.path());

        store
            .store(&update("good.json", serde_json::json!(1)))
            .unwrap();
        std::fs::write(dir.path().join("bad.json"), b"{not json").unwrap();

        let creds = store.load();
        assert_eq!(creds.files.len(), 1);
        assert!(creds.files.contains_key("good.json"));
    }

    #[test]
    fn file_names_are_sanitized() {
        assert_eq!(sanitize_file_name("creds.json"), "creds.json");
        assert_eq!(sanitize_file_name("../escape"), "..-escape");
        assert_eq!(
            sanitize_file_name("app-state-sync-key_1.json"),
            "app-state-sync-key_1.json"
        );
    }
}
