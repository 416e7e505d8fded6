// SPDX-FileCopyrightText: 2026 Paloma Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Merge order: compiled defaults, then `./paloma.toml`, then `PALOMA_*`
//! environment variables. The relay is deployed environment-first; the TOML
//! file is an optional convenience for local runs.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::PalomaConfig;

/// Load configuration from `./paloma.toml` (if present) with env overrides.
pub fn load_config() -> Result<PalomaConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(PalomaConfig::default()))
        .merge(Toml::file("paloma.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no file lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<PalomaConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(PalomaConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<PalomaConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(PalomaConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names: `PALOMA_SUPABASE_SERVICE_KEY` must map
/// to `supabase.service_key`, not `supabase.service.key`.
fn env_provider() -> Env {
    Env::prefixed("PALOMA_").map(|key| {
        // `key` is the lowercased env var name with prefix stripped.
        // Example: PALOMA_WHATSAPP_GROUP_JID -> "whatsapp_group_jid"
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("relay_", "relay.", 1)
            .replacen("supabase_", "supabase.", 1)
            .replacen("whatsapp_", "whatsapp.", 1)
            .replacen("sync_", "sync.", 1)
            .replacen("pair_", "pair.", 1)
            .replacen("reconnect_", "reconnect.", 1);
        mapped.into()
    })
}
