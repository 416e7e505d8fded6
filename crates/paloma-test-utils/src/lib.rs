// SPDX-FileCopyrightText: 2026 Paloma Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock adapters for deterministic Paloma tests.
//!
//! `MockTransport` scripts connection-manager sessions, `MockSender` stands
//! in for the live send capability, and the store mocks hold the bucket
//! listing and outbox/inbox tables in memory with failure injection.

pub mod mock_sender;
pub mod mock_stores;
pub mod mock_transport;

pub use mock_sender::MockSender;
pub use mock_stores::{MockObjectStore, MockRelayStore};
pub use mock_transport::{MockTransport, ScriptedSession, SentMessage};
