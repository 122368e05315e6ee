// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message/batch repository trait.
//!
//! One implementation instance addresses one store. Every query that
//! returns several messages returns them in dispatch order: priority
//! ascending, status code, backend name, then id ascending.

use async_trait::async_trait;

use crate::error::CourierError;
use crate::types::{BatchId, BatchStatus, Message, MessageBatch, MessageId, MessageStatus};

/// Repository of outbound messages and their batches for a single store.
#[async_trait]
pub trait MessageStore: Send + Sync + 'static {
    /// Returns the configured name of this store.
    fn name(&self) -> &str;

    /// Opens the per-cycle transaction.
    async fn begin(&self) -> Result<(), CourierError>;

    /// Commits the per-cycle transaction.
    async fn commit(&self) -> Result<(), CourierError>;

    /// Rolls back the per-cycle transaction after a processing failure.
    async fn rollback(&self) -> Result<(), CourierError>;

    /// Releases idle resources between polling passes.
    async fn release(&self) -> Result<(), CourierError> {
        Ok(())
    }

    /// Moves every queued batch that owns no queued message to
    /// [`BatchStatus::Cleared`]. Returns the number of batches cleared.
    async fn clear_blocking_batches(&self) -> Result<usize, CourierError>;

    /// Returns the queued batch with the highest priority, ties broken by
    /// ascending id.
    async fn next_queued_batch(&self) -> Result<Option<MessageBatch>, CourierError>;

    /// Returns the batch's queued outbound messages in dispatch order,
    /// optionally restricted to one backend and capped at `limit`.
    async fn queued_batch_messages(
        &self,
        batch: BatchId,
        backend: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Vec<Message>, CourierError>;

    /// Returns the first queued outbound message without a batch whose text
    /// is not blank, in dispatch order.
    async fn next_unbatched_message(&self) -> Result<Option<Message>, CourierError>;

    /// Fetches the given messages, ordered by ascending id.
    async fn messages_by_ids(&self, ids: &[MessageId]) -> Result<Vec<Message>, CourierError>;

    /// Sets the status of every given message. Returns the number of rows updated.
    async fn update_status(
        &self,
        ids: &[MessageId],
        status: MessageStatus,
    ) -> Result<usize, CourierError>;

    /// Returns the given messages to the queue after a transient failure.
    ///
    /// When `max_attempts` is set, the attempt counter is incremented and
    /// messages reaching the bound become [`MessageStatus::Failed`]. Returns
    /// the number of messages moved to `Failed`.
    async fn record_failed_attempt(
        &self,
        ids: &[MessageId],
        max_attempts: Option<u32>,
    ) -> Result<usize, CourierError>;

    /// Returns true when every message of the batch is Sent or Cancelled.
    async fn batch_is_complete(&self, batch: BatchId) -> Result<bool, CourierError>;

    /// Sets the status of a batch.
    async fn set_batch_status(&self, batch: BatchId, status: BatchStatus)
    -> Result<(), CourierError>;

    /// Fetches a single message.
    async fn get_message(&self, id: MessageId) -> Result<Option<Message>, CourierError>;

    /// Fetches a single batch.
    async fn get_batch(&self, id: BatchId) -> Result<Option<MessageBatch>, CourierError>;
}
