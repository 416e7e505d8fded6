// SPDX-FileCopyrightText: 2026 Paloma Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Transport adapter trait for the chat messaging collaborator.
//!
//! The transport owns the wire protocol, encryption, and multi-device
//! session handling. Paloma sees only session bring-up, an event stream,
//! and a send capability.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::PalomaError;
use crate::types::{Credentials, Jid, SendReceipt, TransportEvent};

/// A live session: its event stream plus the handle used to send through it.
///
/// The event receiver yields [`TransportEvent`]s in arrival order; the stream
/// ending without a `Closed` event must be treated as an abnormal close by
/// the consumer.
pub struct TransportSession {
    pub events: mpsc::Receiver<TransportEvent>,
    pub sender: std::sync::Arc<dyn TransportSender>,
}

/// Factory for transport sessions. One call is one connection attempt;
/// reconnection policy lives with the caller.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Brings up a session with the given credentials (empty on first pairing).
    async fn connect(&self, creds: &Credentials) -> Result<TransportSession, PalomaError>;
}

/// Send capability of a live session.
#[async_trait]
pub trait TransportSender: Send + Sync {
    /// Sends a text message and returns the delivery receipt.
    async fn send_text(&self, to: &Jid, body: &str) -> Result<SendReceipt, PalomaError>;

    /// Best-effort close of the underlying session, used during shutdown.
    async fn close(&self);
}
