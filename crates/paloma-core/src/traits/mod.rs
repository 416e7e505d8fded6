// SPDX-FileCopyrightText: 2026 Paloma Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter traits implemented by Paloma's external collaborators.

pub mod object_store;
pub mod relay_store;
pub mod send;
pub mod transport;

pub use object_store::ObjectStore;
pub use relay_store::RelayStore;
pub use send::SendCapability;
pub use transport::{Transport, TransportSender, TransportSession};
