// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as compilable identity patterns, unique store names, and non-empty
//! delivery templates.

use std::collections::HashSet;

use crate::diagnostic::ConfigError;
use crate::model::{CourierConfig, DeliveryTarget};

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &CourierConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.dispatch.chunk_size == 0 {
        errors.push(ConfigError::Validation {
            message: "dispatch.chunk_size must be at least 1".to_string(),
        });
    }

    if config.dispatch.request_timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "dispatch.request_timeout_secs must be at least 1".to_string(),
        });
    }

    if config.dispatch.max_attempts == Some(0) {
        errors.push(ConfigError::Validation {
            message: "dispatch.max_attempts must be at least 1 when set".to_string(),
        });
    }

    validate_stores(config, &mut errors);

    if let Some(supported) = &config.supported_backends {
        for (backend, rule) in supported {
            let Some(pattern) = &rule.identity_validation_regex else {
                continue;
            };
            if let Err(e) = regex::Regex::new(pattern) {
                errors.push(ConfigError::Validation {
                    message: format!(
                        "supported_backends.{backend}.identity_validation_regex does not compile: {e}"
                    ),
                });
            }
        }
    }

    for (backend, adapter) in &config.backends {
        if adapter.engine.trim().is_empty() {
            errors.push(ConfigError::Validation {
                message: format!("backends.{backend}.engine must not be empty"),
            });
        }
        if adapter.url.as_deref().is_none_or(|url| url.trim().is_empty()) {
            errors.push(ConfigError::Validation {
                message: format!("backends.{backend}.url (or sendsms_url) is required"),
            });
        }
    }

    if !config.notify.admins.is_empty() && config.notify.from.is_none() {
        errors.push(ConfigError::Validation {
            message: "notify.from is required when notify.admins is set".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_stores(config: &CourierConfig, errors: &mut Vec<ConfigError>) {
    let mut seen = HashSet::new();

    for (index, store) in config.stores.iter().enumerate() {
        if store.name.trim().is_empty() {
            errors.push(ConfigError::Validation {
                message: format!("stores[{index}].name must not be empty"),
            });
        } else if !seen.insert(store.name.as_str()) {
            errors.push(ConfigError::Validation {
                message: format!("duplicate store name `{}`", store.name),
            });
        }

        if store.database_path.trim().is_empty() {
            errors.push(ConfigError::Validation {
                message: format!("stores.{}.database_path must not be empty", store.name),
            });
        }

        match &store.router_url {
            DeliveryTarget::Template(template) if template.trim().is_empty() => {
                errors.push(ConfigError::Validation {
                    message: format!("stores.{}.router_url must not be empty", store.name),
                });
            }
            DeliveryTarget::PerBackend(map) => {
                for (backend, template) in map {
                    if template.trim().is_empty() {
                        errors.push(ConfigError::Validation {
                            message: format!(
                                "stores.{}.router_url.{backend} must not be empty",
                                store.name
                            ),
                        });
                    }
                }
            }
            DeliveryTarget::Template(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BackendConfig, StoreConfig, SupportedBackendConfig};
    use std::collections::BTreeMap;

    fn store(name: &str) -> StoreConfig {
        StoreConfig {
            name: name.to_string(),
            database_path: format!("/tmp/{name}.db"),
            router_url: DeliveryTarget::Template("http://router/%(text)s".to_string()),
        }
    }

    fn messages(result: Result<(), Vec<ConfigError>>) -> Vec<String> {
        result
            .unwrap_err()
            .into_iter()
            .map(|e| e.to_string())
            .collect()
    }

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&CourierConfig::default()).is_ok());
    }

    #[test]
    fn zero_chunk_size_rejected() {
        let mut config = CourierConfig::default();
        config.dispatch.chunk_size = 0;
        let errs = messages(validate_config(&config));
        assert_eq!(errs.len(), 1);
        assert!(errs[0].contains("chunk_size"));
    }

    #[test]
    fn zero_max_attempts_rejected() {
        let mut config = CourierConfig::default();
        config.dispatch.max_attempts = Some(0);
        let errs = messages(validate_config(&config));
        assert!(errs[0].contains("max_attempts"));
    }

    #[test]
    fn duplicate_store_names_rejected() {
        let mut config = CourierConfig::default();
        config.stores = vec![store("default"), store("default")];
        let errs = messages(validate_config(&config));
        assert!(errs.iter().any(|e| e.contains("duplicate store name")));
    }

    #[test]
    fn empty_per_backend_template_rejected() {
        let mut config = CourierConfig::default();
        let mut s = store("default");
        let mut map = BTreeMap::new();
        map.insert("default".to_string(), "  ".to_string());
        s.router_url = DeliveryTarget::PerBackend(map);
        config.stores = vec![s];
        let errs = messages(validate_config(&config));
        assert!(errs[0].contains("router_url.default"));
    }

    #[test]
    fn bad_identity_regex_rejected() {
        let mut config = CourierConfig::default();
        let mut supported = BTreeMap::new();
        supported.insert(
            "kannel".to_string(),
            SupportedBackendConfig {
                identity_validation_regex: Some("([0-9".to_string()),
            },
        );
        config.supported_backends = Some(supported);
        let errs = messages(validate_config(&config));
        assert!(errs[0].contains("supported_backends.kannel"));
    }

    #[test]
    fn structured_backend_requires_url() {
        let mut config = CourierConfig::default();
        config.backends.insert(
            "vumi".to_string(),
            BackendConfig {
                engine: "vumi".to_string(),
                ..Default::default()
            },
        );
        let errs = messages(validate_config(&config));
        assert!(errs[0].contains("backends.vumi.url"));
    }

    #[test]
    fn admins_without_sender_rejected() {
        let mut config = CourierConfig::default();
        config.notify.admins = vec!["ops@example.com".to_string()];
        let errs = messages(validate_config(&config));
        assert!(errs[0].contains("notify.from"));
    }

    #[test]
    fn errors_are_collected_not_fail_fast() {
        let mut config = CourierConfig::default();
        config.dispatch.chunk_size = 0;
        config.dispatch.request_timeout_secs = 0;
        config.stores = vec![store("")];
        let errs = messages(validate_config(&config));
        assert_eq!(errs.len(), 3);
    }
}
