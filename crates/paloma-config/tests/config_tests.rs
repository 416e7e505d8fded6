// SPDX-FileCopyrightText: 2026 Paloma Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the full load-and-validate pipeline.

use paloma_config::{load_and_validate_str, ConfigError};

const MINIMAL: &str = r#"
[supabase]
url = "https://example.supabase.co"
service_key = "service-key"

[whatsapp]
gateway_url = "ws://127.0.0.1:4500"
group_jid = "12345-67890@g.us"
"#;

#[test]
fn minimal_config_loads_and_validates() {
    let config = load_and_validate_str(MINIMAL).expect("minimal config should be valid");
    assert_eq!(config.supabase.bucket, "documents");
    assert_eq!(config.sync.interval_secs, 60);
    assert_eq!(config.sync.doc_suffix, ".pdf");
    assert_eq!(config.pair.port, 3310);
    assert_eq!(config.reconnect.initial_ms, 1_000);
}

#[test]
fn empty_config_fails_with_missing_keys() {
    let errors = load_and_validate_str("").unwrap_err();
    assert_eq!(
        errors
            .iter()
            .filter(|e| matches!(e, ConfigError::MissingKey { .. }))
            .count(),
        4
    );
}

#[test]
fn typo_in_section_key_gets_suggestion() {
    let toml = format!("{MINIMAL}\n[sync]\nintervall_secs = 5\n");
    let errors = load_and_validate_str(&toml).unwrap_err();
    let unknown = errors
        .iter()
        .find_map(|e| match e {
            ConfigError::UnknownKey { key, suggestion, .. } => Some((key, suggestion)),
            _ => None,
        })
        .expect("should report the unknown key");
    assert_eq!(unknown.0, "intervall_secs");
    assert_eq!(unknown.1.as_deref(), Some("interval_secs"));
}

#[test]
fn overrides_round_trip_through_full_pipeline() {
    let toml = format!(
        "{MINIMAL}\n[sync]\ninterval_secs = 5\npage_limit = 10\n\n[reconnect]\ninitial_ms = 250\nmax_ms = 2000\n"
    );
    let config = load_and_validate_str(&toml).expect("should be valid");
    assert_eq!(config.sync.interval_secs, 5);
    assert_eq!(config.sync.page_limit, 10);
    assert_eq!(config.reconnect.initial_ms, 250);
    assert_eq!(config.reconnect.max_ms, 2000);
}

#[test]
fn semantic_validation_runs_after_deserialization() {
    let toml = format!("{MINIMAL}\n[sync]\ndoc_suffix = \"pdf\"\n");
    let errors = load_and_validate_str(&toml).unwrap_err();
    assert!(errors
        .iter()
        .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("doc_suffix"))));
}
