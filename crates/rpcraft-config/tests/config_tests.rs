// SPDX-FileCopyrightText: 2026 RPCraft Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the RPCraft configuration system.

use rpcraft_config::{load_and_validate_str, load_config_from_str};

/// Valid TOML with all known fields deserializes successfully.
#[test]
fn valid_toml_deserializes_into_config() {
    let toml = r#"
[app]
log_level = "debug"

[remote]
base_url = "https://project.example.co/rest/v1"
api_key = "anon-key-123"
timeout_secs = 15

[storage]
snapshot_path = "/tmp/rpcraft-state.json"
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.app.log_level, "debug");
    assert_eq!(
        config.remote.base_url.as_deref(),
        Some("https://project.example.co/rest/v1")
    );
    assert_eq!(config.remote.api_key.as_deref(), Some("anon-key-123"));
    assert_eq!(config.remote.timeout_secs, 15);
    assert_eq!(config.storage.snapshot_path, "/tmp/rpcraft-state.json");
}

/// Empty TOML falls back to compiled defaults, which are valid.
#[test]
fn empty_toml_uses_defaults() {
    let config = load_and_validate_str("").expect("defaults should validate");
    assert_eq!(config.app.log_level, "info");
    assert_eq!(config.remote.timeout_secs, 30);
    assert!(config.remote.base_url.is_none());
}

/// Unknown fields are rejected rather than silently ignored.
#[test]
fn unknown_field_is_rejected() {
    let toml = r#"
[remote]
base_url = "https://project.example.co/rest/v1"
api_key = "anon"
retries = 5
"#;
    let result = load_config_from_str(toml);
    assert!(result.is_err(), "unknown `retries` key should be rejected");
}

/// A type mismatch surfaces as a parse error, not a panic.
#[test]
fn type_mismatch_is_a_parse_error() {
    let toml = r#"
[remote]
timeout_secs = "thirty"
"#;
    let errors = load_and_validate_str(toml).unwrap_err();
    assert!(!errors.is_empty());
}

/// Validation failures are collected, not fail-fast.
#[test]
fn validation_errors_are_collected() {
    let toml = r#"
[app]
log_level = "loud"

[remote]
base_url = "not-a-url"
api_key = "anon"
timeout_secs = 0
"#;
    let errors = load_and_validate_str(toml).unwrap_err();
    assert_eq!(errors.len(), 3, "got: {errors:?}");
}
