// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `courier check-config` command implementation.

use courier_config::{CourierConfig, DeliveryTarget};
use courier_core::CourierError;
use courier_dispatch::{BackendPolicy, BackendRegistry, Sanitizer};

/// Builds every startup component that can fail on configuration alone and
/// describes the resolved setup. Stores are not opened.
pub fn describe_config(config: &CourierConfig) -> Result<String, CourierError> {
    let adapters = BackendRegistry::from_config(&config.backends)?;
    let policy = BackendPolicy::from_config(config.supported_backends.as_ref())?;
    let sanitizer = Sanitizer::new(&config.special_chars)?;

    let mut lines = vec!["courier: configuration is valid".to_string(), "stores:".to_string()];
    if config.stores.is_empty() {
        lines.push("  (none)".to_string());
    }
    for store in &config.stores {
        let excluded = if config.dispatch.exclude_stores.contains(&store.name) {
            " (excluded)"
        } else {
            ""
        };
        lines.push(format!("  {}{excluded}: {}", store.name, store.database_path));
        match &store.router_url {
            DeliveryTarget::Template(template) => {
                lines.push(format!("    router_url = {template}"));
            }
            DeliveryTarget::PerBackend(map) => {
                for (backend, template) in map {
                    lines.push(format!("    router_url.{backend} = {template}"));
                }
            }
        }
    }

    lines.push("structured backends:".to_string());
    if adapters.is_empty() {
        lines.push("  (none)".to_string());
    }
    for name in adapters.names() {
        if let Some(registered) = adapters.get(name) {
            lines.push(format!("  {name}: {}", registered.adapter.engine()));
        }
    }

    match &config.supported_backends {
        Some(supported) => {
            lines.push("allowed backends:".to_string());
            for backend in supported.keys() {
                let rule = policy
                    .identity_rule(backend)
                    .map(|r| format!(" (identities matching {})", r.as_str()))
                    .unwrap_or_default();
                lines.push(format!("  {backend}{rule}"));
            }
        }
        None => lines.push("allowed backends: all".to_string()),
    }

    if !sanitizer.is_noop() {
        lines.push(format!("text substitutions: {}", config.special_chars.len()));
    }

    Ok(lines.join("\n"))
}
