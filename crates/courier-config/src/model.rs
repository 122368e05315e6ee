// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Courier dispatch engine.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Top-level Courier configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CourierConfig {
    /// Logging settings.
    #[serde(default)]
    pub log: LogConfig,

    /// Polling, chunking, and transport settings.
    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// Literal character substitutions applied to message text before sending.
    #[serde(default)]
    pub special_chars: BTreeMap<String, String>,

    /// Backend allowlist with optional identity validation rules.
    /// `None` disables the allowlist entirely.
    #[serde(default)]
    pub supported_backends: Option<BTreeMap<String, SupportedBackendConfig>>,

    /// Backends delivered through a structured request adapter instead of
    /// the store's URL template.
    #[serde(default)]
    pub backends: BTreeMap<String, BackendConfig>,

    /// Message stores polled by the scheduler, in processing order.
    #[serde(default)]
    pub stores: Vec<StoreConfig>,

    /// Administrator notification settings.
    #[serde(default)]
    pub notify: NotifyConfig,
}

impl CourierConfig {
    /// Returns the configured stores minus the excluded ones, in order.
    pub fn active_stores(&self) -> impl Iterator<Item = &StoreConfig> {
        self.stores
            .iter()
            .filter(|store| !self.dispatch.exclude_stores.contains(&store.name))
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Dispatch loop configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DispatchConfig {
    /// Maximum number of batch messages considered per store per cycle.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Pause between two full passes over all stores, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Timeout applied to each delivery request, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Store names skipped by the scheduler.
    #[serde(default)]
    pub exclude_stores: Vec<String>,

    /// Failed attempts after which a message is dead-lettered.
    /// `None` retries forever.
    #[serde(default)]
    pub max_attempts: Option<u32>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            poll_interval_ms: default_poll_interval_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            exclude_stores: Vec::new(),
            max_attempts: None,
        }
    }
}

fn default_chunk_size() -> usize {
    400
}

fn default_poll_interval_ms() -> u64 {
    500
}

fn default_request_timeout_secs() -> u64 {
    15
}

/// Allowlist entry for a backend.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SupportedBackendConfig {
    /// Case-insensitive pattern every identity on this backend must contain
    /// a match for. Messages failing it are cancelled before delivery.
    #[serde(default)]
    pub identity_validation_regex: Option<String>,
}

/// Structured adapter configuration for one backend.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BackendConfig {
    /// Adapter engine name (`vumi`, `http_form`).
    pub engine: String,

    /// Endpoint the adapter posts to.
    #[serde(default, alias = "sendsms_url")]
    pub url: Option<String>,

    /// HTTP basic auth user.
    #[serde(default, alias = "sendsms_user")]
    pub username: Option<String>,

    /// HTTP basic auth password.
    #[serde(default, alias = "sendsms_pass")]
    pub password: Option<String>,

    /// Form field carrying the recipients (`http_form` only).
    #[serde(default)]
    pub to_field: Option<String>,

    /// Form field carrying the text (`http_form` only).
    #[serde(default)]
    pub text_field: Option<String>,

    /// Extra backend-specific values passed to the adapter.
    #[serde(default)]
    pub context: BTreeMap<String, String>,
}

/// One message store and where its messages are delivered.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    /// Store name, used in logs and notifications.
    pub name: String,

    /// Path to the store's SQLite database file.
    pub database_path: String,

    /// Delivery URL template(s) for backends without a structured adapter.
    pub router_url: DeliveryTarget,
}

/// A URL template, or a per-backend map of templates with a `default` fallback.
///
/// Templates use `%(name)s` placeholders: `backend`, `recipient`, `text`,
/// `priority`, plus any extra parameters supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum DeliveryTarget {
    Template(String),
    PerBackend(BTreeMap<String, String>),
}

impl DeliveryTarget {
    /// Key of the fallback entry in a per-backend map.
    pub const DEFAULT_KEY: &'static str = "default";

    /// Resolves the template for a backend: the backend's own entry, then
    /// `default`. A plain template applies to every backend.
    pub fn template_for(&self, backend: &str) -> Option<&str> {
        match self {
            DeliveryTarget::Template(template) => Some(template),
            DeliveryTarget::PerBackend(map) => map
                .get(backend)
                .or_else(|| map.get(Self::DEFAULT_KEY))
                .map(String::as_str),
        }
    }
}

/// Administrator notification configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct NotifyConfig {
    /// Email addresses alerted on per-store failures. Empty disables email.
    #[serde(default)]
    pub admins: Vec<String>,

    /// Sender address for alert emails.
    #[serde(default)]
    pub from: Option<String>,

    /// SMTP relay host.
    #[serde(default = "default_smtp_host")]
    pub smtp_host: String,

    /// SMTP relay port.
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,

    /// SMTP username, if the relay requires authentication.
    #[serde(default)]
    pub smtp_username: Option<String>,

    /// SMTP password, if the relay requires authentication.
    #[serde(default)]
    pub smtp_password: Option<String>,

    /// Prefix prepended to every alert subject.
    #[serde(default = "default_subject_prefix")]
    pub subject_prefix: String,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            admins: Vec::new(),
            from: None,
            smtp_host: default_smtp_host(),
            smtp_port: default_smtp_port(),
            smtp_username: None,
            smtp_password: None,
            subject_prefix: default_subject_prefix(),
        }
    }
}

fn default_smtp_host() -> String {
    "localhost".to_string()
}

fn default_smtp_port() -> u16 {
    25
}

fn default_subject_prefix() -> String {
    "[Courier] ".to_string()
}
