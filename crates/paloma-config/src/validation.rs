// SPDX-FileCopyrightText: 2026 Paloma Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Enforces the required-key contract (the model keeps required values as
//! `Option` so that defaults can load cleanly) and semantic constraints that
//! cannot be expressed via serde attributes.

use crate::diagnostic::{env_var_for, ConfigError};
use crate::model::PalomaConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &PalomaConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    // Required keys: backend URL/key and transport addressing.
    require_present(&mut errors, "supabase.url", config.supabase.url.as_deref());
    require_present(
        &mut errors,
        "supabase.service_key",
        config.supabase.service_key.as_deref(),
    );
    require_present(
        &mut errors,
        "whatsapp.gateway_url",
        config.whatsapp.gateway_url.as_deref(),
    );
    require_present(
        &mut errors,
        "whatsapp.group_jid",
        config.whatsapp.group_jid.as_deref(),
    );

    if let Some(url) = config.supabase.url.as_deref()
        && !url.is_empty()
        && !url.starts_with("http://")
        && !url.starts_with("https://")
    {
        errors.push(ConfigError::Validation {
            message: format!("supabase.url `{url}` must start with http:// or https://"),
        });
    }

    if let Some(url) = config.whatsapp.gateway_url.as_deref()
        && !url.is_empty()
        && !url.starts_with("ws://")
        && !url.starts_with("wss://")
    {
        errors.push(ConfigError::Validation {
            message: format!("whatsapp.gateway_url `{url}` must start with ws:// or wss://"),
        });
    }

    if config.sync.interval_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "sync.interval_secs must be at least 1".to_string(),
        });
    }

    if config.sync.page_limit == 0 {
        errors.push(ConfigError::Validation {
            message: "sync.page_limit must be at least 1".to_string(),
        });
    }

    if config.sync.outbox_batch == 0 {
        errors.push(ConfigError::Validation {
            message: "sync.outbox_batch must be at least 1".to_string(),
        });
    }

    if !config.sync.doc_suffix.starts_with('.') {
        errors.push(ConfigError::Validation {
            message: format!(
                "sync.doc_suffix must start with `.`, got `{}`",
                config.sync.doc_suffix
            ),
        });
    }

    if config.reconnect.multiplier < 1.0 {
        errors.push(ConfigError::Validation {
            message: format!(
                "reconnect.multiplier must be at least 1.0, got {}",
                config.reconnect.multiplier
            ),
        });
    }

    if !(0.0..=1.0).contains(&config.reconnect.jitter) {
        errors.push(ConfigError::Validation {
            message: format!(
                "reconnect.jitter must be within [0.0, 1.0], got {}",
                config.reconnect.jitter
            ),
        });
    }

    if config.reconnect.max_ms < config.reconnect.initial_ms {
        errors.push(ConfigError::Validation {
            message: format!(
                "reconnect.max_ms ({}) must not be below reconnect.initial_ms ({})",
                config.reconnect.max_ms, config.reconnect.initial_ms
            ),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Push a `MissingKey` error when a required value is absent or blank.
fn require_present(errors: &mut Vec<ConfigError>, key: &str, value: Option<&str>) {
    let missing = match value {
        None => true,
        Some(v) => v.trim().is_empty(),
    };
    if missing {
        errors.push(ConfigError::MissingKey {
            key: key.to_string(),
            env_var: env_var_for(key),
        });
    }
}
