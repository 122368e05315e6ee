// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Generic form POST adapter for HTTP gateways.

use std::collections::BTreeMap;
use std::sync::Arc;

use courier_config::BackendConfig;
use courier_core::CourierError;

use super::{AdapterFactory, BackendAdapter};
use crate::error::DeliveryError;
use crate::request::{BasicAuth, Body, OutboundRequest};

pub const ENGINE: &str = "http_form";

const DEFAULT_TO_FIELD: &str = "to";
const DEFAULT_TEXT_FIELD: &str = "text";

/// Posts recipients (comma separated) and text as form fields, followed by
/// the backend's context entries.
#[derive(Debug, Clone)]
pub struct HttpFormAdapter {
    url: String,
    auth: Option<BasicAuth>,
    to_field: String,
    text_field: String,
}

impl HttpFormAdapter {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            auth: None,
            to_field: DEFAULT_TO_FIELD.to_string(),
            text_field: DEFAULT_TEXT_FIELD.to_string(),
        }
    }

    pub fn with_fields(mut self, to_field: impl Into<String>, text_field: impl Into<String>) -> Self {
        self.to_field = to_field.into();
        self.text_field = text_field.into();
        self
    }

    pub fn with_auth(mut self, auth: Option<BasicAuth>) -> Self {
        self.auth = auth;
        self
    }
}

impl BackendAdapter for HttpFormAdapter {
    fn engine(&self) -> &str {
        ENGINE
    }

    fn prepare_request(
        &self,
        _priority: i32,
        text: &str,
        identities: &[String],
        context: &BTreeMap<String, String>,
    ) -> Result<OutboundRequest, DeliveryError> {
        if identities.is_empty() {
            return Err(DeliveryError::Adapter {
                backend: ENGINE.to_string(),
                message: "no recipients".to_string(),
            });
        }

        let mut fields = vec![
            (self.to_field.clone(), identities.join(",")),
            (self.text_field.clone(), text.to_string()),
        ];
        fields.extend(
            context
                .iter()
                .filter(|(k, _)| **k != self.to_field && **k != self.text_field)
                .map(|(k, v)| (k.clone(), v.clone())),
        );

        Ok(OutboundRequest::Post {
            url: self.url.clone(),
            headers: Vec::new(),
            auth: self.auth.clone(),
            body: Body::Form(fields),
        })
    }
}

pub struct HttpFormFactory;

impl AdapterFactory for HttpFormFactory {
    fn engine(&self) -> &str {
        ENGINE
    }

    fn create(
        &self,
        backend: &str,
        config: &BackendConfig,
    ) -> Result<Arc<dyn BackendAdapter>, CourierError> {
        let url = config.url.clone().ok_or_else(|| {
            CourierError::Config(format!("backends.{backend}: http_form requires url"))
        })?;
        let auth = config.username.clone().map(|username| BasicAuth {
            username,
            password: config.password.clone(),
        });
        let adapter = HttpFormAdapter::new(url)
            .with_fields(
                config.to_field.as_deref().unwrap_or(DEFAULT_TO_FIELD),
                config.text_field.as_deref().unwrap_or(DEFAULT_TEXT_FIELD),
            )
            .with_auth(auth);
        Ok(Arc::new(adapter))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(req: OutboundRequest) -> Vec<(String, String)> {
        match req {
            OutboundRequest::Post {
                body: Body::Form(fields),
                ..
            } => fields,
            other => panic!("expected form POST, got {other:?}"),
        }
    }

    #[test]
    fn posts_default_fields_then_context() {
        let adapter = HttpFormAdapter::new("http://gateway/send");
        let mut context = BTreeMap::new();
        context.insert("username".to_string(), "sandbox".to_string());

        let req = adapter
            .prepare_request(
                1,
                "hi there",
                &["+256700000001".to_string(), "+256700000002".to_string()],
                &context,
            )
            .unwrap();
        assert_eq!(
            fields(req),
            vec![
                ("to".to_string(), "+256700000001,+256700000002".to_string()),
                ("text".to_string(), "hi there".to_string()),
                ("username".to_string(), "sandbox".to_string()),
            ]
        );
    }

    #[test]
    fn factory_applies_configured_field_names() {
        let config = BackendConfig {
            engine: ENGINE.to_string(),
            url: Some("http://gateway/send".to_string()),
            username: Some("api".to_string()),
            to_field: Some("destination".to_string()),
            text_field: Some("message".to_string()),
            ..Default::default()
        };
        let adapter = HttpFormFactory.create("at", &config).unwrap();
        let req = adapter
            .prepare_request(1, "x", &["1".to_string()], &BTreeMap::new())
            .unwrap();

        let OutboundRequest::Post { auth, .. } = &req else {
            panic!("expected POST");
        };
        assert_eq!(auth.as_ref().unwrap().username, "api");
        let names: Vec<String> = fields(req).into_iter().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["destination", "message"]);
    }

    #[test]
    fn empty_recipient_list_is_an_adapter_error() {
        let adapter = HttpFormAdapter::new("http://gateway/send");
        let err = adapter
            .prepare_request(1, "x", &[], &BTreeMap::new())
            .unwrap_err();
        assert!(matches!(err, DeliveryError::Adapter { .. }));
    }
}
