// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sends one chunk and applies the resulting status transition.
//!
//! A chunk gets exactly one bulk status update per attempt. Delivery errors
//! never escape: they requeue the chunk and are logged. Only store failures
//! are returned to the caller.

use std::sync::Arc;

use courier_config::DeliveryTarget;
use courier_core::{CourierError, Message, MessageId, MessageStatus, MessageStore};
use tracing::{error, info, warn};

use crate::backend::BackendPolicy;
use crate::backend::policy::has_letters;
use crate::error::DeliveryError;
use crate::request::RequestBuilder;
use crate::transport::Transport;

/// What happened to a chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkOutcome {
    /// The gateway accepted the request (2xx).
    Sent { count: usize },
    /// The gateway refused the request for good (403).
    Discarded { count: usize },
    /// The backend is not on the allowlist. No request was made.
    Blocked { count: usize },
    /// Any other status or a delivery error. The messages stay queued,
    /// except `dead_lettered` ones that reached the attempt bound.
    Requeued {
        count: usize,
        dead_lettered: usize,
        reason: String,
    },
    /// No message was left to send after identity exclusion.
    Skipped,
}

/// Maps a response status to the status every message of the chunk takes.
///
/// `None` means the chunk is requeued.
pub fn classify(status: u16) -> Option<MessageStatus> {
    match status {
        _ if status / 100 == 2 => Some(MessageStatus::Sent),
        403 => Some(MessageStatus::Discarded),
        _ => None,
    }
}

/// Delivers chunks through a transport.
pub struct Dispatcher {
    builder: RequestBuilder,
    policy: BackendPolicy,
    transport: Arc<dyn Transport>,
    max_attempts: Option<u32>,
}

impl Dispatcher {
    pub fn new(builder: RequestBuilder, policy: BackendPolicy, transport: Arc<dyn Transport>) -> Self {
        Self {
            builder,
            policy,
            transport,
            max_attempts: None,
        }
    }

    /// Bound on failed attempts before a message is dead-lettered.
    pub fn with_max_attempts(mut self, max_attempts: Option<u32>) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn policy(&self) -> &BackendPolicy {
        &self.policy
    }

    pub fn builder(&self) -> &RequestBuilder {
        &self.builder
    }

    /// Sends the messages `ids`, all on `backend`, as one request.
    pub async fn send_chunk(
        &self,
        store: &dyn MessageStore,
        target: &DeliveryTarget,
        ids: &[MessageId],
        backend: &str,
        priority: i32,
    ) -> Result<ChunkOutcome, CourierError> {
        if ids.is_empty() {
            return Ok(ChunkOutcome::Skipped);
        }

        if !self.policy.is_supported(backend) {
            let count = store.update_status(ids, MessageStatus::Blocked).await?;
            info!(store = store.name(), backend, count, "blocked messages on unsupported backend");
            return Ok(ChunkOutcome::Blocked { count });
        }

        let mut messages = store.messages_by_ids(ids).await?;
        if self.policy.identity_rule(backend).is_none() {
            messages.retain(|m| !has_letters(&m.connection.identity));
        }
        if messages.is_empty() {
            info!(store = store.name(), backend, "no deliverable identities left in chunk");
            return Ok(ChunkOutcome::Skipped);
        }

        let chunk_ids: Vec<MessageId> = messages.iter().map(|m| m.id).collect();

        let status = match self.deliver(target, backend, &messages, priority).await {
            Ok(status) => status,
            Err(e) => {
                if e.is_configuration() {
                    error!(store = store.name(), backend, error = %e, "message not sent, queued for later delivery");
                } else {
                    warn!(store = store.name(), backend, error = %e, "message not sent, queued for later delivery");
                }
                return self.requeue(store, &chunk_ids, e.to_string()).await;
            }
        };

        match classify(status) {
            Some(MessageStatus::Sent) => {
                let count = store.update_status(&chunk_ids, MessageStatus::Sent).await?;
                info!(store = store.name(), backend, status, count, "messages sent");
                Ok(ChunkOutcome::Sent { count })
            }
            Some(new_status) => {
                let count = store.update_status(&chunk_ids, new_status).await?;
                info!(store = store.name(), backend, status, count, "messages discarded by gateway");
                Ok(ChunkOutcome::Discarded { count })
            }
            None => {
                warn!(store = store.name(), backend, status, "message not sent, queued for later delivery");
                self.requeue(store, &chunk_ids, format!("gateway returned status {status}"))
                    .await
            }
        }
    }

    async fn deliver(
        &self,
        target: &DeliveryTarget,
        backend: &str,
        messages: &[Message],
        priority: i32,
    ) -> Result<u16, DeliveryError> {
        let recipients: Vec<String> = messages
            .iter()
            .map(|m| m.connection.identity.clone())
            .collect();
        // Chunks share one text; the first message in id order carries it.
        let text = messages.first().map_or("", |m| m.text.as_str());

        let request = self
            .builder
            .build(target, backend, &recipients, text, priority, &[])?;
        self.transport.send(&request).await
    }

    async fn requeue(
        &self,
        store: &dyn MessageStore,
        ids: &[MessageId],
        reason: String,
    ) -> Result<ChunkOutcome, CourierError> {
        let dead_lettered = store.record_failed_attempt(ids, self.max_attempts).await?;
        if dead_lettered > 0 {
            warn!(
                store = store.name(),
                count = dead_lettered,
                max_attempts = self.max_attempts,
                "messages reached the attempt bound and were marked failed"
            );
        }
        Ok(ChunkOutcome::Requeued {
            count: ids.len(),
            dead_lettered,
            reason,
        })
    }
}
