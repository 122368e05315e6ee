// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP transport for delivery requests.

use std::time::Duration;

use async_trait::async_trait;
use courier_core::CourierError;
use tracing::debug;

use crate::error::DeliveryError;
use crate::request::{Body, OutboundRequest};

/// Performs a delivery request and reports the response status code.
///
/// Any response, whatever its status, is `Ok`. Errors mean no status was
/// obtained (network failure, timeout).
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    async fn send(&self, request: &OutboundRequest) -> Result<u16, DeliveryError>;
}

/// reqwest-backed transport with a fixed per-request timeout.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpTransport {
    /// Creates a transport whose requests time out after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, CourierError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("courier/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CourierError::Delivery {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self { client, timeout })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn map_error(&self, e: reqwest::Error) -> DeliveryError {
        if e.is_timeout() {
            DeliveryError::Timeout {
                duration: self.timeout,
            }
        } else {
            DeliveryError::Transport {
                message: e.to_string(),
                source: Some(Box::new(e)),
            }
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &OutboundRequest) -> Result<u16, DeliveryError> {
        let builder = match request {
            OutboundRequest::Get { url } => self.client.get(url.as_str()),
            OutboundRequest::Post {
                url,
                headers,
                auth,
                body,
            } => {
                let mut builder = self.client.post(url.as_str());
                for (name, value) in headers {
                    builder = builder.header(name.as_str(), value.as_str());
                }
                if let Some(auth) = auth {
                    builder = builder.basic_auth(&auth.username, auth.password.as_ref());
                }
                match body {
                    Body::Form(fields) => builder.form(fields),
                    Body::Json(value) => builder.json(value),
                }
            }
        };

        let response = builder.send().await.map_err(|e| self.map_error(e))?;
        let status = response.status().as_u16();
        debug!(method = request.method(), url = request.url(), status, "delivery response");
        Ok(status)
    }
}
