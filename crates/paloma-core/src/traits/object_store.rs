// SPDX-FileCopyrightText: 2026 Paloma Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Object storage adapter trait for the document bucket collaborator.

use async_trait::async_trait;

use crate::error::PalomaError;
use crate::types::FileRecord;

/// Adapter for the storage bucket holding uploaded documents.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Lists up to `limit` entries under `prefix`, newest first.
    async fn list(&self, prefix: &str, limit: usize) -> Result<Vec<FileRecord>, PalomaError>;

    /// Resolves the public-facing URL for a stored object.
    async fn public_url(&self, name: &str) -> Result<String, PalomaError>;
}
