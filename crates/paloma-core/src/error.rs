// SPDX-FileCopyrightText: 2026 Paloma Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Paloma relay.

use thiserror::Error;

/// The primary error type used across all Paloma adapter traits and core operations.
#[derive(Debug, Error)]
pub enum PalomaError {
    /// Configuration errors (missing required keys, invalid values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (bucket listing, table query, ledger/credential I/O).
    #[error("storage error: {message}")]
    Storage {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Transport errors (gateway socket failure, send rejection, ack timeout).
    #[error("transport error: {message}")]
    Transport {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A send was attempted while the session is not open.
    #[error("transport session is not open")]
    NotConnected,

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl PalomaError {
    /// Builds a storage error from a message and an underlying cause.
    pub fn storage(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Storage {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Builds a transport error from a message and an underlying cause.
    pub fn transport(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Transport {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_variants_construct_and_display() {
        let config = PalomaError::Config("missing supabase.url".into());
        assert!(config.to_string().contains("configuration error"));

        let storage = PalomaError::storage("listing failed", std::io::Error::other("boom"));
        assert!(storage.to_string().contains("listing failed"));

        let transport = PalomaError::Transport {
            message: "socket closed".into(),
            source: None,
        };
        assert!(transport.to_string().contains("socket closed"));

        assert_eq!(
            PalomaError::NotConnected.to_string(),
            "transport session is not open"
        );

        let internal = PalomaError::Internal("oops".into());
        assert!(internal.to_string().contains("oops"));
    }

    #[test]
    fn storage_helper_preserves_source() {
        let err = PalomaError::storage("query failed", std::io::Error::other("cause"));
        match err {
            PalomaError::Storage { source, .. } => assert!(source.is_some()),
            other => panic!("expected Storage, got {other:?}"),
        }
    }
}
