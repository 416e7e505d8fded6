// SPDX-FileCopyrightText: 2026 Paloma Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across adapter traits and the Paloma relay.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// A chat address (user or group) on the messaging transport.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Jid(pub String);

impl std::fmt::Display for Jid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Delivery identifier assigned by the transport for a sent message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

/// Receipt returned by a successful send.
///
/// The transport may not expose a message identifier for every delivery;
/// callers that record receipts must tolerate its absence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendReceipt {
    pub message_id: Option<MessageId>,
}

/// Lifecycle state of the transport session. Exactly one live instance,
/// published by the connection manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    Disconnected,
    Pairing,
    Open,
    Closing,
}

/// Why the transport session closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseReason {
    /// The account was unpaired. Terminal: reconnecting is pointless until
    /// an operator re-pairs.
    LoggedOut,
    /// Any other cause (network failure, server reset, socket drop).
    Other(String),
}

impl CloseReason {
    /// Terminal closes halt the connection manager permanently.
    pub fn is_terminal(&self) -> bool {
        matches!(self, CloseReason::LoggedOut)
    }
}

impl std::fmt::Display for CloseReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CloseReason::LoggedOut => write!(f, "logged out"),
            CloseReason::Other(detail) => write!(f, "{detail}"),
        }
    }
}

/// Opaque session credentials: a set of small named JSON blobs, mirrored to
/// a directory on disk. Content is owned by the transport; Paloma only
/// stores and replays it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Credentials {
    pub files: BTreeMap<String, serde_json::Value>,
}

impl Credentials {
    /// True when no credential material is present (first run, not yet paired).
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Applies a single rotation event to the in-memory set.
    pub fn apply(&mut self, update: &CredentialUpdate) {
        self.files.insert(update.file.clone(), update.data.clone());
    }
}

/// One credential-rotation event: a named blob to overwrite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CredentialUpdate {
    pub file: String,
    pub data: serde_json::Value,
}

/// Read-only projection of one storage bucket listing entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// A pending-or-sent outbound message row.
///
/// Rows with `sent_at` unset are delivery candidates; the outbox engine sets
/// `sent_at` and `wa_msg_id` in place after a successful send.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboxRow {
    pub id: i64,
    #[serde(default)]
    pub to: Option<Jid>,
    pub message: String,
    #[serde(default)]
    pub sent_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub wa_msg_id: Option<String>,
}

/// Append-only archive entry for one inbound chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboxRecord {
    pub from_jid: Jid,
    pub to_jid: Jid,
    pub message: String,
    pub received_at: DateTime<Utc>,
}

/// Payload of one inbound message, shaped by what the transport decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageContent {
    Text(String),
    ExtendedText(String),
    ImageCaption(String),
    VideoCaption(String),
    Unsupported,
}

impl MessageContent {
    /// Best-available text, in priority order: plain text, extended text,
    /// image caption, video caption. `None` for unsupported shapes.
    pub fn text(&self) -> Option<&str> {
        match self {
            MessageContent::Text(t)
            | MessageContent::ExtendedText(t)
            | MessageContent::ImageCaption(t)
            | MessageContent::VideoCaption(t) => Some(t),
            MessageContent::Unsupported => None,
        }
    }
}

/// One inbound message as delivered by the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundEnvelope {
    pub from: Jid,
    pub to: Jid,
    pub timestamp: DateTime<Utc>,
    pub content: MessageContent,
}

/// A batch of inbound messages. `live` distinguishes fresh notifications
/// from history-replay batches delivered during session bring-up.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageBatch {
    pub live: bool,
    pub items: Vec<InboundEnvelope>,
}

/// Events emitted by a live transport session, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// A fresh pairing challenge to surface to the operator.
    PairingCode(String),
    /// The session reached the open state; sends are accepted from now on.
    Opened { jid: Option<Jid> },
    /// Credential material rotated; must be persisted before the next event.
    CredentialsRotated(CredentialUpdate),
    /// Inbound message batch.
    Messages(MessageBatch),
    /// The session ended.
    Closed { reason: CloseReason },
}
