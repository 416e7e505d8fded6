// SPDX-FileCopyrightText: 2026 Paloma Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WhatsApp transport adapter for the Paloma relay.
//!
//! Implements [`paloma_core::Transport`] against a WhatsApp Web gateway
//! sidecar reachable over WebSocket. The sidecar owns the protocol's
//! encryption and multi-device session handling; this crate exchanges small
//! JSON frames with it: pairing challenges, session state changes, rotated
//! credentials, inbound message batches, and correlated send receipts.

pub mod socket;
pub mod wire;

pub use socket::WhatsAppTransport;
