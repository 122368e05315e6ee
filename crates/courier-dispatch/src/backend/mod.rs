// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Backend resolution: structured adapters and the allowlist policy.
//!
//! The [`BackendRegistry`] maps backend names to adapters built once at
//! startup by engine factories. The [`BackendPolicy`] answers whether a
//! backend is allowed and which identity rule applies to it. The two are
//! configured independently (`[backends.*]` and `[supported_backends.*]`).

pub mod form;
pub mod policy;
pub mod vumi;

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use courier_config::BackendConfig;
use courier_core::CourierError;
use tracing::info;

use crate::error::DeliveryError;
use crate::request::OutboundRequest;

pub use policy::BackendPolicy;

/// Builds the request for a backend that needs method or body control.
pub trait BackendAdapter: Send + Sync {
    /// Engine name this adapter was created from.
    fn engine(&self) -> &str;

    /// Prepares the request delivering `text` to every identity.
    fn prepare_request(
        &self,
        priority: i32,
        text: &str,
        identities: &[String],
        context: &BTreeMap<String, String>,
    ) -> Result<OutboundRequest, DeliveryError>;
}

/// Creates adapters for one engine from backend configuration.
pub trait AdapterFactory: Send + Sync {
    /// The engine name matched against `backends.<name>.engine`.
    fn engine(&self) -> &str;

    /// Create an adapter for the named backend.
    fn create(
        &self,
        backend: &str,
        config: &BackendConfig,
    ) -> Result<Arc<dyn BackendAdapter>, CourierError>;
}

/// Factories for the engines compiled into this crate.
pub fn builtin_factories() -> Vec<Box<dyn AdapterFactory>> {
    vec![
        Box::new(vumi::VumiFactory),
        Box::new(form::HttpFormFactory),
    ]
}

/// An adapter together with the context configured for its backend.
#[derive(Clone)]
pub struct RegisteredBackend {
    pub adapter: Arc<dyn BackendAdapter>,
    pub context: BTreeMap<String, String>,
}

impl std::fmt::Debug for RegisteredBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredBackend")
            .field("engine", &self.adapter.engine())
            .field("context", &self.context)
            .finish()
    }
}

/// Structured adapters keyed by backend name.
#[derive(Debug, Default, Clone)]
pub struct BackendRegistry {
    backends: HashMap<String, RegisteredBackend>,
}

impl BackendRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the registry from `[backends.*]` using the built-in engines.
    pub fn from_config(backends: &BTreeMap<String, BackendConfig>) -> Result<Self, CourierError> {
        Self::with_factories(backends, &builtin_factories())
    }

    /// Builds the registry from `[backends.*]` using the given factories.
    ///
    /// An engine name no factory provides is a configuration error.
    pub fn with_factories(
        backends: &BTreeMap<String, BackendConfig>,
        factories: &[Box<dyn AdapterFactory>],
    ) -> Result<Self, CourierError> {
        let mut registry = Self::new();

        for (name, config) in backends {
            let factory = factories
                .iter()
                .find(|f| f.engine() == config.engine)
                .ok_or_else(|| {
                    let known: Vec<&str> = factories.iter().map(|f| f.engine()).collect();
                    CourierError::Config(format!(
                        "backends.{name}: unknown engine `{}` (known engines: {})",
                        config.engine,
                        known.join(", ")
                    ))
                })?;
            let adapter = factory.create(name, config)?;
            info!(backend = %name, engine = %config.engine, "registered backend adapter");
            registry.register(name, adapter, config.context.clone());
        }

        Ok(registry)
    }

    /// Register (or replace) the adapter for a backend.
    pub fn register(
        &mut self,
        backend: impl Into<String>,
        adapter: Arc<dyn BackendAdapter>,
        context: BTreeMap<String, String>,
    ) {
        self.backends
            .insert(backend.into(), RegisteredBackend { adapter, context });
    }

    pub fn get(&self, backend: &str) -> Option<&RegisteredBackend> {
        self.backends.get(backend)
    }

    pub fn contains(&self, backend: &str) -> bool {
        self.backends.contains_key(backend)
    }

    /// Registered backend names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.backends.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(engine: &str) -> BackendConfig {
        BackendConfig {
            engine: engine.to_string(),
            url: Some("http://gateway/send".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn from_config_uses_builtin_engines() {
        let mut backends = BTreeMap::new();
        backends.insert("vumi".to_string(), config("vumi"));
        backends.insert("africastalking".to_string(), config("http_form"));

        let registry = BackendRegistry::from_config(&backends).unwrap();
        assert_eq!(registry.names(), vec!["africastalking", "vumi"]);
        assert_eq!(registry.get("vumi").unwrap().adapter.engine(), "vumi");
        assert_eq!(
            registry.get("africastalking").unwrap().adapter.engine(),
            "http_form"
        );
        assert!(!registry.contains("kannel"));
    }

    #[test]
    fn unknown_engine_is_rejected() {
        let mut backends = BTreeMap::new();
        backends.insert("smpp".to_string(), config("smpp"));

        let err = BackendRegistry::from_config(&backends).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("unknown engine `smpp`"), "got: {msg}");
        assert!(msg.contains("vumi"));
    }

    #[test]
    fn context_is_kept_with_adapter() {
        let mut cfg = config("vumi");
        cfg.context
            .insert("conversation_key".to_string(), "abc".to_string());
        let mut backends = BTreeMap::new();
        backends.insert("vumi".to_string(), cfg);

        let registry = BackendRegistry::from_config(&backends).unwrap();
        assert_eq!(
            registry.get("vumi").unwrap().context.get("conversation_key"),
            Some(&"abc".to_string())
        );
    }
}
