// SPDX-FileCopyrightText: 2026 Paloma Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Polling-and-delivery engines for the Paloma relay.
//!
//! Two independent periodic engines share one send capability: the
//! [`BucketSync`] engine forwards newly uploaded documents (deduplicated
//! through the durable [`SentLedger`]) and the [`OutboxSync`] engine delivers
//! pending outbox rows. The [`InboxArchiver`] consumes the inbound event
//! stream and appends archive records.

pub mod bucket;
pub mod inbox;
pub mod ledger;
pub mod outbox;
pub mod scheduler;

pub use bucket::{BucketSync, BucketSyncConfig};
pub use inbox::InboxArchiver;
pub use ledger::SentLedger;
pub use outbox::{OutboxSync, OutboxSyncConfig};
