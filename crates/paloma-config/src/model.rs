// SPDX-FileCopyrightText: 2026 Paloma Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Paloma relay.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Paloma configuration.
///
/// Loaded environment-first via `PALOMA_*` variables, layered over an
/// optional `paloma.toml` and compiled defaults. Required keys are enforced
/// by post-deserialization validation, not by serde.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PalomaConfig {
    /// Process identity and logging settings.
    #[serde(default)]
    pub relay: RelayConfig,

    /// Storage/database backend settings.
    #[serde(default)]
    pub supabase: SupabaseConfig,

    /// Messaging transport settings.
    #[serde(default)]
    pub whatsapp: WhatsAppConfig,

    /// Polling engine settings.
    #[serde(default)]
    pub sync: SyncConfig,

    /// Pairing presentation page settings.
    #[serde(default)]
    pub pair: PairConfig,

    /// Transport reconnect backoff policy.
    #[serde(default)]
    pub reconnect: ReconnectConfig,
}

/// Process identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RelayConfig {
    /// Display name used in logs.
    #[serde(default = "default_relay_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            name: default_relay_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_relay_name() -> String {
    "paloma".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Storage/database backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SupabaseConfig {
    /// Project base URL. Required.
    #[serde(default)]
    pub url: Option<String>,

    /// Service-role API key. Required.
    #[serde(default)]
    pub service_key: Option<String>,

    /// Bucket holding uploaded documents.
    #[serde(default = "default_bucket")]
    pub bucket: String,

    /// Listing prefix inside the bucket.
    #[serde(default)]
    pub prefix: String,
}

impl Default for SupabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            service_key: None,
            bucket: default_bucket(),
            prefix: String::new(),
        }
    }
}

fn default_bucket() -> String {
    "documents".to_string()
}

/// Messaging transport configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WhatsAppConfig {
    /// WebSocket URL of the WhatsApp Web gateway sidecar. Required.
    #[serde(default)]
    pub gateway_url: Option<String>,

    /// Default destination group JID. Required.
    #[serde(default)]
    pub group_jid: Option<String>,

    /// Directory holding the paired-session credential files.
    #[serde(default = "default_credentials_dir")]
    pub credentials_dir: String,

    /// Seconds to wait for a delivery receipt before a send fails.
    #[serde(default = "default_ack_timeout_secs")]
    pub ack_timeout_secs: u64,
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            gateway_url: None,
            group_jid: None,
            credentials_dir: default_credentials_dir(),
            ack_timeout_secs: default_ack_timeout_secs(),
        }
    }
}

fn default_credentials_dir() -> String {
    dirs::data_dir()
        .map(|p| p.join("paloma").join("credentials"))
        .unwrap_or_else(|| std::path::PathBuf::from("credentials"))
        .to_string_lossy()
        .into_owned()
}

fn default_ack_timeout_secs() -> u64 {
    30
}

/// Polling engine configuration, shared by both sync engines.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SyncConfig {
    /// Poll period in seconds for both engines.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Maximum bucket listing page size per cycle.
    #[serde(default = "default_page_limit")]
    pub page_limit: usize,

    /// Maximum outbox rows selected per cycle.
    #[serde(default = "default_outbox_batch")]
    pub outbox_batch: usize,

    /// Recognized document suffix; other names are ignored.
    #[serde(default = "default_doc_suffix")]
    pub doc_suffix: String,

    /// Path of the sent-item ledger file.
    #[serde(default = "default_ledger_path")]
    pub ledger_path: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            page_limit: default_page_limit(),
            outbox_batch: default_outbox_batch(),
            doc_suffix: default_doc_suffix(),
            ledger_path: default_ledger_path(),
        }
    }
}

fn default_interval_secs() -> u64 {
    60
}

fn default_page_limit() -> usize {
    100
}

fn default_outbox_batch() -> usize {
    50
}

fn default_doc_suffix() -> String {
    ".pdf".to_string()
}

fn default_ledger_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("paloma").join("sent.json"))
        .unwrap_or_else(|| std::path::PathBuf::from("sent.json"))
        .to_string_lossy()
        .into_owned()
}

/// Pairing presentation page configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PairConfig {
    /// Address to bind the pairing page to.
    #[serde(default = "default_pair_host")]
    pub host: String,

    /// Port for the pairing page.
    #[serde(default = "default_pair_port")]
    pub port: u16,
}

impl Default for PairConfig {
    fn default() -> Self {
        Self {
            host: default_pair_host(),
            port: default_pair_port(),
        }
    }
}

fn default_pair_host() -> String {
    "127.0.0.1".to_string()
}

fn default_pair_port() -> u16 {
    3310
}

/// Transport reconnect backoff policy.
///
/// Applied to every non-terminal session close: the delay starts at
/// `initial_ms`, multiplies per attempt, and is capped at `max_ms` with a
/// random jitter fraction on top.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ReconnectConfig {
    /// First retry delay in milliseconds.
    #[serde(default = "default_reconnect_initial_ms")]
    pub initial_ms: u64,

    /// Upper bound for the retry delay in milliseconds.
    #[serde(default = "default_reconnect_max_ms")]
    pub max_ms: u64,

    /// Per-attempt delay multiplier.
    #[serde(default = "default_reconnect_multiplier")]
    pub multiplier: f64,

    /// Jitter fraction in `[0.0, 1.0]` added to each delay.
    #[serde(default = "default_reconnect_jitter")]
    pub jitter: f64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_ms: default_reconnect_initial_ms(),
            max_ms: default_reconnect_max_ms(),
            multiplier: default_reconnect_multiplier(),
            jitter: default_reconnect_jitter(),
        }
    }
}

fn default_reconnect_initial_ms() -> u64 {
    1_000
}

fn default_reconnect_max_ms() -> u64 {
    60_000
}

fn default_reconnect_multiplier() -> f64 {
    2.0
}

fn default_reconnect_jitter() -> f64 {
    0.25
}
