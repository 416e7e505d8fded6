// SPDX-FileCopyrightText: 2026 Paloma Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Transport session lifecycle for the Paloma relay.
//!
//! Provides the [`CredentialStore`] (durable pairing credentials) and the
//! [`ConnectionManager`] state machine (pairing, open, reconnect-with-backoff,
//! terminal logout) together with the [`SendHandle`] capability consumed by
//! the sync engines.

pub mod creds;
pub mod manager;

pub use creds::CredentialStore;
pub use manager::{ConnectionManager, ManagerHandles, ReconnectPolicy, SendHandle};
