// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory message store for deterministic testing.
//!
//! `MemoryStore` implements `MessageStore` with the same selection and
//! ordering rules as the SQLite store. `begin` snapshots the rows and
//! `rollback` restores the snapshot, so scheduler tests can observe
//! transaction boundaries without a database.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use courier_core::{
    BatchId, BatchStatus, Connection, CourierError, Message, MessageBatch, MessageId,
    MessageStatus, MessageStore, stringify,
};
use courier_storage::NewMessage;

#[derive(Debug, Clone, Default)]
struct Rows {
    messages: BTreeMap<MessageId, Message>,
    batches: BTreeMap<BatchId, MessageBatch>,
}

#[derive(Debug, Default)]
struct State {
    rows: Rows,
    snapshot: Option<Rows>,
    next_id: i64,
    fail_updates: bool,
    commits: usize,
    rollbacks: usize,
    releases: usize,
}

/// A message store kept entirely in memory.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    name: String,
    state: Arc<Mutex<State>>,
}

impl MemoryStore {
    /// Create an empty store with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Arc::new(Mutex::new(State::default())),
        }
    }

    /// Insert a queued batch.
    pub async fn add_batch(&self, name: &str, priority: i32) -> BatchId {
        let mut state = self.state.lock().await;
        state.next_id += 1;
        let id = BatchId(state.next_id);
        state.rows.batches.insert(
            id,
            MessageBatch {
                id,
                name: name.to_string(),
                status: BatchStatus::Queued,
                priority,
            },
        );
        id
    }

    /// Insert a message row.
    pub async fn add_message(&self, new: NewMessage) -> MessageId {
        let mut state = self.state.lock().await;
        state.next_id += 1;
        let id = MessageId(state.next_id);
        state.rows.messages.insert(
            id,
            Message {
                id,
                text: stringify(&new.text).into_owned(),
                direction: new.direction,
                status: new.status,
                priority: new.priority,
                connection: Connection::new(new.identity, new.backend),
                batch_id: new.batch_id,
                attempts: 0,
            },
        );
        id
    }

    /// Current status of a message.
    ///
    /// # Panics
    /// Panics when the message does not exist.
    pub async fn status(&self, id: MessageId) -> MessageStatus {
        let state = self.state.lock().await;
        match state.rows.messages.get(&id) {
            Some(msg) => msg.status,
            None => panic!("message {id} not in store {}", self.name),
        }
    }

    /// Current status of a batch.
    ///
    /// # Panics
    /// Panics when the batch does not exist.
    pub async fn batch_status(&self, id: BatchId) -> BatchStatus {
        let state = self.state.lock().await;
        match state.rows.batches.get(&id) {
            Some(batch) => batch.status,
            None => panic!("batch {id} not in store {}", self.name),
        }
    }

    /// Make every following status write fail with a storage error.
    pub async fn fail_updates(&self, fail: bool) {
        self.state.lock().await.fail_updates = fail;
    }

    pub async fn commits(&self) -> usize {
        self.state.lock().await.commits
    }

    pub async fn rollbacks(&self) -> usize {
        self.state.lock().await.rollbacks
    }

    pub async fn releases(&self) -> usize {
        self.state.lock().await.releases
    }

    fn write_error(&self) -> CourierError {
        debug!(store = %self.name, "injected write failure");
        CourierError::storage(std::io::Error::other(format!(
            "store {} rejected the write",
            self.name
        )))
    }
}

fn sorted(mut messages: Vec<Message>) -> Vec<Message> {
    messages.sort_by(|a, b| a.dispatch_key().cmp(&b.dispatch_key()));
    messages
}

#[async_trait]
impl MessageStore for MemoryStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn begin(&self) -> Result<(), CourierError> {
        let mut state = self.state.lock().await;
        if state.snapshot.is_none() {
            state.snapshot = Some(state.rows.clone());
        }
        Ok(())
    }

    async fn commit(&self) -> Result<(), CourierError> {
        let mut state = self.state.lock().await;
        state.snapshot = None;
        state.commits += 1;
        Ok(())
    }

    async fn rollback(&self) -> Result<(), CourierError> {
        let mut state = self.state.lock().await;
        if let Some(rows) = state.snapshot.take() {
            state.rows = rows;
        }
        state.rollbacks += 1;
        Ok(())
    }

    async fn release(&self) -> Result<(), CourierError> {
        self.state.lock().await.releases += 1;
        Ok(())
    }

    async fn clear_blocking_batches(&self) -> Result<usize, CourierError> {
        let mut state = self.state.lock().await;
        let Rows { messages, batches } = &mut state.rows;
        let mut cleared = 0;
        for batch in batches.values_mut() {
            let has_queued = messages
                .values()
                .any(|m| m.batch_id == Some(batch.id) && m.status == MessageStatus::Queued);
            if batch.status == BatchStatus::Queued && !has_queued {
                batch.status = BatchStatus::Cleared;
                cleared += 1;
            }
        }
        Ok(cleared)
    }

    async fn next_queued_batch(&self) -> Result<Option<MessageBatch>, CourierError> {
        let state = self.state.lock().await;
        Ok(state
            .rows
            .batches
            .values()
            .filter(|b| b.status == BatchStatus::Queued)
            .min_by_key(|b| (std::cmp::Reverse(b.priority), b.id))
            .cloned())
    }

    async fn queued_batch_messages(
        &self,
        batch: BatchId,
        backend: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Vec<Message>, CourierError> {
        let state = self.state.lock().await;
        let matching = state
            .rows
            .messages
            .values()
            .filter(|m| {
                m.batch_id == Some(batch)
                    && m.status == MessageStatus::Queued
                    && m.direction == courier_core::Direction::Outbound
                    && backend.is_none_or(|b| m.connection.backend == b)
            })
            .cloned()
            .collect();
        let mut messages = sorted(matching);
        if let Some(limit) = limit {
            messages.truncate(limit);
        }
        Ok(messages)
    }

    async fn next_unbatched_message(&self) -> Result<Option<Message>, CourierError> {
        let state = self.state.lock().await;
        Ok(state
            .rows
            .messages
            .values()
            .filter(|m| {
                m.batch_id.is_none()
                    && m.status == MessageStatus::Queued
                    && m.direction == courier_core::Direction::Outbound
                    && !m.has_blank_text()
            })
            .min_by(|a, b| a.dispatch_key().cmp(&b.dispatch_key()))
            .cloned())
    }

    async fn messages_by_ids(&self, ids: &[MessageId]) -> Result<Vec<Message>, CourierError> {
        let state = self.state.lock().await;
        let mut found: Vec<Message> = ids
            .iter()
            .filter_map(|id| state.rows.messages.get(id).cloned())
            .collect();
        found.sort_by_key(|m| m.id);
        found.dedup_by_key(|m| m.id);
        Ok(found)
    }

    async fn update_status(
        &self,
        ids: &[MessageId],
        status: MessageStatus,
    ) -> Result<usize, CourierError> {
        let mut state = self.state.lock().await;
        if state.fail_updates {
            return Err(self.write_error());
        }
        let mut updated = 0;
        for id in ids {
            if let Some(msg) = state.rows.messages.get_mut(id) {
                msg.status = status;
                updated += 1;
            }
        }
        Ok(updated)
    }

    async fn record_failed_attempt(
        &self,
        ids: &[MessageId],
        max_attempts: Option<u32>,
    ) -> Result<usize, CourierError> {
        let mut state = self.state.lock().await;
        if state.fail_updates {
            return Err(self.write_error());
        }
        let mut failed = 0;
        for id in ids {
            let Some(msg) = state.rows.messages.get_mut(id) else {
                continue;
            };
            match max_attempts {
                None => msg.status = MessageStatus::Queued,
                Some(max) => {
                    msg.attempts += 1;
                    if msg.attempts >= max {
                        msg.status = MessageStatus::Failed;
                        failed += 1;
                    } else {
                        msg.status = MessageStatus::Queued;
                    }
                }
            }
        }
        Ok(failed)
    }

    async fn batch_is_complete(&self, batch: BatchId) -> Result<bool, CourierError> {
        let state = self.state.lock().await;
        Ok(state
            .rows
            .messages
            .values()
            .filter(|m| m.batch_id == Some(batch))
            .all(|m| m.status.completes_batch()))
    }

    async fn set_batch_status(
        &self,
        batch: BatchId,
        status: BatchStatus,
    ) -> Result<(), CourierError> {
        let mut state = self.state.lock().await;
        if state.fail_updates {
            return Err(self.write_error());
        }
        if let Some(b) = state.rows.batches.get_mut(&batch) {
            b.status = status;
        }
        Ok(())
    }

    async fn get_message(&self, id: MessageId) -> Result<Option<Message>, CourierError> {
        Ok(self.state.lock().await.rows.messages.get(&id).cloned())
    }

    async fn get_batch(&self, id: BatchId) -> Result<Option<MessageBatch>, CourierError> {
        Ok(self.state.lock().await.rows.batches.get(&id).cloned())
    }
}
