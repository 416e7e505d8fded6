// SPDX-FileCopyrightText: 2026 Paloma Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Supabase backend adapters for the Paloma relay.
//!
//! Implements [`paloma_core::ObjectStore`] over the storage API and
//! [`paloma_core::RelayStore`] over PostgREST, sharing one authenticated
//! HTTP client. Network and auth details stay inside this crate; the engines
//! see only the core traits.

pub mod bucket;
pub mod client;
pub mod table;

pub use bucket::BucketStore;
pub use client::SupabaseClient;
pub use table::TableStore;
