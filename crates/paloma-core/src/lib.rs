// SPDX-FileCopyrightText: 2026 Paloma Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Paloma relay.
//!
//! This crate provides the foundational trait definitions, error types, and
//! common types used throughout the Paloma workspace. The transport, storage,
//! and relational collaborators all implement traits defined here.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::PalomaError;
pub use types::{
    CloseReason, ConnectionState, Credentials, CredentialUpdate, FileRecord, InboundEnvelope,
    InboxRecord, Jid, MessageBatch, MessageContent, MessageId, OutboxRow, SendReceipt,
    TransportEvent,
};

// Re-export all adapter traits at crate root.
pub use traits::{
    ObjectStore, RelayStore, SendCapability, Transport, TransportSender, TransportSession,
};
