// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Backend allowlist and per-backend identity rules.

use std::collections::BTreeMap;

use courier_config::SupportedBackendConfig;
use courier_core::CourierError;
use regex::{Regex, RegexBuilder};

/// Which backends may deliver, and which identities they accept.
///
/// Without an allowlist every backend is allowed and none has a rule.
#[derive(Debug, Clone, Default)]
pub struct BackendPolicy {
    allowlist: Option<BTreeMap<String, Option<Regex>>>,
}

impl BackendPolicy {
    /// A policy with no allowlist.
    pub fn allow_all() -> Self {
        Self::default()
    }

    /// Compiles `[supported_backends.*]`. Identity rules are case-insensitive
    /// and match anywhere in the identity unless anchored.
    pub fn from_config(
        supported: Option<&BTreeMap<String, SupportedBackendConfig>>,
    ) -> Result<Self, CourierError> {
        let Some(supported) = supported else {
            return Ok(Self::allow_all());
        };

        let mut allowlist = BTreeMap::new();
        for (backend, config) in supported {
            let rule = match &config.identity_validation_regex {
                Some(pattern) => Some(
                    RegexBuilder::new(pattern)
                        .case_insensitive(true)
                        .build()
                        .map_err(|e| {
                            CourierError::Config(format!(
                                "supported_backends.{backend}.identity_validation_regex: {e}"
                            ))
                        })?,
                ),
                None => None,
            };
            allowlist.insert(backend.clone(), rule);
        }

        Ok(Self {
            allowlist: Some(allowlist),
        })
    }

    /// Returns true when an allowlist is configured.
    pub fn has_allowlist(&self) -> bool {
        self.allowlist.is_some()
    }

    /// Returns false only when an allowlist exists and omits the backend.
    pub fn is_supported(&self, backend: &str) -> bool {
        self.allowlist
            .as_ref()
            .is_none_or(|list| list.contains_key(backend))
    }

    /// The identity rule configured for a backend, if any.
    pub fn identity_rule(&self, backend: &str) -> Option<&Regex> {
        self.allowlist
            .as_ref()
            .and_then(|list| list.get(backend))
            .and_then(Option::as_ref)
    }

    /// Every backend with an identity rule, in name order.
    pub fn rules(&self) -> impl Iterator<Item = (&str, &Regex)> {
        self.allowlist.iter().flat_map(|list| {
            list.iter()
                .filter_map(|(backend, rule)| rule.as_ref().map(|r| (backend.as_str(), r)))
        })
    }
}

/// Returns true when an identity contains an ASCII letter.
///
/// Backends without an identity rule only deliver to identities without
/// letters.
pub fn has_letters(identity: &str) -> bool {
    identity.bytes().any(|b| b.is_ascii_alphabetic())
}
