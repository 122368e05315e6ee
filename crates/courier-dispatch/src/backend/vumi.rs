// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Vumi HTTP API adapter: one JSON POST per chunk.

use std::collections::BTreeMap;
use std::sync::Arc;

use courier_config::BackendConfig;
use courier_core::CourierError;
use serde_json::{Map, Value, json};

use super::{AdapterFactory, BackendAdapter};
use crate::error::DeliveryError;
use crate::request::{BasicAuth, Body, OutboundRequest};

pub const ENGINE: &str = "vumi";

/// Posts `{content, to_addr, priority, ...context}` to the send URL.
#[derive(Debug, Clone)]
pub struct VumiAdapter {
    url: String,
    auth: Option<BasicAuth>,
}

impl VumiAdapter {
    pub fn new(url: impl Into<String>, username: Option<String>, password: Option<String>) -> Self {
        Self {
            url: url.into(),
            auth: username.map(|username| BasicAuth { username, password }),
        }
    }
}

impl BackendAdapter for VumiAdapter {
    fn engine(&self) -> &str {
        ENGINE
    }

    fn prepare_request(
        &self,
        priority: i32,
        text: &str,
        identities: &[String],
        context: &BTreeMap<String, String>,
    ) -> Result<OutboundRequest, DeliveryError> {
        let mut payload: Map<String, Value> = context
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();
        payload.insert("content".to_string(), json!(text));
        payload.insert("to_addr".to_string(), json!(identities));
        payload.insert("priority".to_string(), json!(priority));

        Ok(OutboundRequest::Post {
            url: self.url.clone(),
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            auth: self.auth.clone(),
            body: Body::Json(Value::Object(payload)),
        })
    }
}

pub struct VumiFactory;

impl AdapterFactory for VumiFactory {
    fn engine(&self) -> &str {
        ENGINE
    }

    fn create(
        &self,
        backend: &str,
        config: &BackendConfig,
    ) -> Result<Arc<dyn BackendAdapter>, CourierError> {
        let url = config.url.clone().ok_or_else(|| {
            CourierError::Config(format!("backends.{backend}: vumi requires sendsms_url"))
        })?;
        Ok(Arc::new(VumiAdapter::new(
            url,
            config.username.clone(),
            config.password.clone(),
        )))
    }
}
