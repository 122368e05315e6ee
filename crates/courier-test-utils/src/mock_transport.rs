// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock transport with scripted responses.
//!
//! `MockTransport` implements `Transport` by popping scripted results from a
//! FIFO queue and recording every request it receives. When the queue is
//! empty it answers with the default status (200).

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use courier_dispatch::{DeliveryError, OutboundRequest, Transport};

/// A scripted transport result.
#[derive(Debug, Clone)]
pub enum Scripted {
    Status(u16),
    Timeout,
    Unreachable,
}

/// A transport that never touches the network.
#[derive(Debug, Clone)]
pub struct MockTransport {
    script: Arc<Mutex<VecDeque<Scripted>>>,
    requests: Arc<Mutex<Vec<OutboundRequest>>>,
    default_status: u16,
}

impl MockTransport {
    /// Create a transport that answers 200 to everything.
    pub fn new() -> Self {
        Self::with_default_status(200)
    }

    /// Create a transport that answers `status` once the script runs out.
    pub fn with_default_status(status: u16) -> Self {
        Self {
            script: Arc::new(Mutex::new(VecDeque::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
            default_status: status,
        }
    }

    /// Queue a response status.
    pub async fn push_status(&self, status: u16) {
        self.script.lock().await.push_back(Scripted::Status(status));
    }

    /// Queue a scripted result.
    pub async fn push(&self, result: Scripted) {
        self.script.lock().await.push_back(result);
    }

    /// Every request received so far, in order.
    pub async fn requests(&self) -> Vec<OutboundRequest> {
        self.requests.lock().await.clone()
    }

    /// Number of requests received so far.
    pub async fn request_count(&self) -> usize {
        self.requests.lock().await.len()
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: &OutboundRequest) -> Result<u16, DeliveryError> {
        self.requests.lock().await.push(request.clone());
        let next = self
            .script
            .lock()
            .await
            .pop_front()
            .unwrap_or(Scripted::Status(self.default_status));
        debug!(method = request.method(), url = request.url(), result = ?next, "mock transport answered");
        match next {
            Scripted::Status(status) => Ok(status),
            Scripted::Timeout => Err(DeliveryError::Timeout {
                duration: Duration::from_secs(15),
            }),
            Scripted::Unreachable => Err(DeliveryError::Transport {
                message: "connection refused".to_string(),
                source: None,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get(url: &str) -> OutboundRequest {
        OutboundRequest::Get {
            url: url.to_string(),
        }
    }

    #[tokio::test]
    async fn script_then_default() {
        let transport = MockTransport::new();
        transport.push_status(500).await;
        transport.push(Scripted::Timeout).await;

        assert_eq!(transport.send(&get("http://a")).await.unwrap(), 500);
        assert!(matches!(
            transport.send(&get("http://b")).await,
            Err(DeliveryError::Timeout { .. })
        ));
        assert_eq!(transport.send(&get("http://c")).await.unwrap(), 200);

        let urls: Vec<String> = transport
            .requests()
            .await
            .iter()
            .map(|r| r.url().to_string())
            .collect();
        assert_eq!(urls, vec!["http://a", "http://b", "http://c"]);
    }
}
