// SPDX-FileCopyrightText: 2026 Paloma Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Send capability handed to components that deliver messages.
//!
//! The sync engines depend on this narrow interface rather than on the
//! connection manager itself, so the live session handle is never shared
//! as mutable global state.

use async_trait::async_trait;

use crate::error::PalomaError;
use crate::types::{ConnectionState, Jid, SendReceipt};

/// Capability interface exposed by the connection manager once constructed.
///
/// `send_text` must fail fast with [`PalomaError::NotConnected`] whenever the
/// session is not in the [`Open`](ConnectionState::Open) state.
#[async_trait]
pub trait SendCapability: Send + Sync {
    /// Current session state as last published by the connection manager.
    fn current_state(&self) -> ConnectionState;

    /// Sends a text message through the live session.
    async fn send_text(&self, to: &Jid, body: &str) -> Result<SendReceipt, PalomaError>;
}
