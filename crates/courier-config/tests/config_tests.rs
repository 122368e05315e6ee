// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Courier configuration system.

use courier_config::diagnostic::ConfigError;
use courier_config::model::DeliveryTarget;
use courier_config::{load_and_validate_str, load_config_from_path, load_config_from_str};

/// A full configuration with every section deserializes successfully.
#[test]
fn valid_toml_deserializes_into_courier_config() {
    let toml = r#"
[log]
level = "debug"

[dispatch]
chunk_size = 50
poll_interval_ms = 250
request_timeout_secs = 5
exclude_stores = ["archive"]
max_attempts = 3

[special_chars]
"ç" = "c"
"à" = "a"

[supported_backends.kannel]
identity_validation_regex = "^256[0-9]+$"

[supported_backends.yo]

[backends.vumi]
engine = "vumi"
sendsms_url = "http://vumi.local:9000/send/"
context = { conversation_key = "abc" }

[[stores]]
name = "default"
database_path = "/tmp/default.db"
router_url = "http://kannel/send?to=%(recipient)s&text=%(text)s"

[notify]
admins = ["ops@example.com"]
from = "courier@example.com"
"#;

    let config = load_and_validate_str(toml).expect("valid config");
    assert_eq!(config.log.level, "debug");
    assert_eq!(config.dispatch.chunk_size, 50);
    assert_eq!(config.dispatch.poll_interval_ms, 250);
    assert_eq!(config.dispatch.request_timeout_secs, 5);
    assert_eq!(config.dispatch.max_attempts, Some(3));
    assert_eq!(config.special_chars.get("ç").map(String::as_str), Some("c"));

    let supported = config.supported_backends.as_ref().expect("allowlist");
    assert_eq!(supported.len(), 2);
    assert!(supported["yo"].identity_validation_regex.is_none());

    assert_eq!(
        config.backends["vumi"].context.get("conversation_key").map(String::as_str),
        Some("abc")
    );
    assert!(matches!(
        config.stores[0].router_url,
        DeliveryTarget::Template(_)
    ));
    assert_eq!(config.notify.from.as_deref(), Some("courier@example.com"));
}

/// An empty document yields the compiled defaults.
#[test]
fn empty_toml_uses_defaults() {
    let config = load_config_from_str("").expect("defaults");
    assert_eq!(config.log.level, "info");
    assert_eq!(config.dispatch.chunk_size, 400);
    assert_eq!(config.dispatch.poll_interval_ms, 500);
    assert_eq!(config.dispatch.request_timeout_secs, 15);
    assert!(config.dispatch.max_attempts.is_none());
    assert!(config.supported_backends.is_none());
    assert!(config.stores.is_empty());
}

/// A typo in [dispatch] is reported with a suggestion.
#[test]
fn unknown_dispatch_key_suggests_correction() {
    let toml = r#"
[dispatch]
chunk_szie = 10
"#;

    let errors = load_and_validate_str(toml).expect_err("should reject unknown field");
    assert_eq!(errors.len(), 1);
    match &errors[0] {
        ConfigError::UnknownKey {
            key, suggestion, ..
        } => {
            assert_eq!(key, "chunk_szie");
            assert_eq!(suggestion.as_deref(), Some("chunk_size"));
        }
        other => panic!("expected UnknownKey, got {other:?}"),
    }
}

/// Unknown keys point at the key itself, in a section or at the top level.
#[test]
fn unknown_keys_are_located_in_the_source() {
    let toml = "[log]\nlevel = \"info\"\n\n[dispatch]\nchunk_szie = 10\n";
    let errors = load_and_validate_str(toml).expect_err("should reject unknown field");
    match &errors[0] {
        ConfigError::UnknownKey { key, span, .. } => {
            assert_eq!(key, "chunk_szie");
            let span = span.expect("section key should be located");
            assert_eq!(span.offset(), toml.find("chunk_szie").unwrap());
            assert_eq!(span.len(), "chunk_szie".len());
        }
        other => panic!("expected UnknownKey, got {other:?}"),
    }

    let toml = "stors = 1\n";
    let errors = load_and_validate_str(toml).expect_err("should reject unknown field");
    match &errors[0] {
        ConfigError::UnknownKey {
            key,
            suggestion,
            span,
            ..
        } => {
            assert_eq!(key, "stors");
            assert_eq!(suggestion.as_deref(), Some("stores"));
            assert_eq!(span.map(|s| s.offset()), Some(0));
        }
        other => panic!("expected UnknownKey, got {other:?}"),
    }
}

/// A store without a router_url is reported as a missing key.
#[test]
fn store_without_router_url_is_rejected() {
    let toml = r#"
[[stores]]
name = "default"
database_path = "/tmp/default.db"
"#;

    let err = load_config_from_str(toml).expect_err("router_url is required");
    assert!(
        err.to_string().contains("router_url"),
        "error should name router_url, got: {err}"
    );
}

/// Validation errors come back through the high-level entry point.
#[test]
fn validation_errors_surface_from_load_and_validate() {
    let toml = r#"
[dispatch]
chunk_size = 0

[supported_backends.kannel]
identity_validation_regex = "(unclosed"
"#;

    let errors = load_and_validate_str(toml).expect_err("invalid config");
    assert_eq!(errors.len(), 2);
    assert!(
        errors
            .iter()
            .all(|e| matches!(e, ConfigError::Validation { .. }))
    );
}

/// Environment variables override file values using the section mapping.
#[test]
fn env_overrides_file_values() {
    figment::Jail::expect_with(|jail| {
        jail.create_file(
            "courier.toml",
            r#"
[dispatch]
chunk_size = 10

[notify]
smtp_host = "mail.local"
"#,
        )?;
        jail.set_env("COURIER_DISPATCH_CHUNK_SIZE", "25");
        jail.set_env("COURIER_LOG_LEVEL", "trace");

        let config = load_config_from_path(std::path::Path::new("courier.toml"))?;
        assert_eq!(config.dispatch.chunk_size, 25);
        assert_eq!(config.log.level, "trace");
        assert_eq!(config.notify.smtp_host, "mail.local");
        Ok(())
    });
}
