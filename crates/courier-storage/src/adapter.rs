// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the MessageStore trait.

use async_trait::async_trait;
use tracing::debug;

use courier_config::StoreConfig;
use courier_core::{
    BatchId, BatchStatus, CourierError, Message, MessageBatch, MessageId, MessageStatus,
    MessageStore,
};

use crate::database::Database;
use crate::queries;

/// One named store backed by its own SQLite database.
///
/// Delegates every operation to the typed query modules. The per-cycle
/// transaction lives on the database's single connection, so every query
/// issued between [`MessageStore::begin`] and [`MessageStore::commit`] runs
/// inside it.
#[derive(Clone)]
pub struct SqliteStore {
    name: String,
    db: Database,
}

impl SqliteStore {
    /// Wraps an already opened database.
    pub fn new(name: impl Into<String>, db: Database) -> Self {
        Self {
            name: name.into(),
            db,
        }
    }

    /// Opens the database configured for a store.
    pub async fn open(config: &StoreConfig) -> Result<Self, CourierError> {
        let db = Database::open(&config.database_path).await?;
        debug!(store = %config.name, path = %config.database_path, "SQLite store opened");
        Ok(Self::new(config.name.clone(), db))
    }

    /// Returns the underlying database handle.
    pub fn database(&self) -> &Database {
        &self.db
    }
}

#[async_trait]
impl MessageStore for SqliteStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn begin(&self) -> Result<(), CourierError> {
        self.db.begin().await
    }

    async fn commit(&self) -> Result<(), CourierError> {
        self.db.commit().await
    }

    async fn rollback(&self) -> Result<(), CourierError> {
        self.db.rollback().await
    }

    async fn release(&self) -> Result<(), CourierError> {
        self.db.checkpoint().await
    }

    async fn clear_blocking_batches(&self) -> Result<usize, CourierError> {
        queries::batches::clear_blocking_batches(&self.db).await
    }

    async fn next_queued_batch(&self) -> Result<Option<MessageBatch>, CourierError> {
        queries::batches::next_queued_batch(&self.db).await
    }

    async fn queued_batch_messages(
        &self,
        batch: BatchId,
        backend: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Vec<Message>, CourierError> {
        queries::messages::queued_batch_messages(&self.db, batch, backend, limit).await
    }

    async fn next_unbatched_message(&self) -> Result<Option<Message>, CourierError> {
        queries::messages::next_unbatched_message(&self.db).await
    }

    async fn messages_by_ids(&self, ids: &[MessageId]) -> Result<Vec<Message>, CourierError> {
        queries::messages::messages_by_ids(&self.db, ids).await
    }

    async fn update_status(
        &self,
        ids: &[MessageId],
        status: MessageStatus,
    ) -> Result<usize, CourierError> {
        queries::messages::update_status(&self.db, ids, status).await
    }

    async fn record_failed_attempt(
        &self,
        ids: &[MessageId],
        max_attempts: Option<u32>,
    ) -> Result<usize, CourierError> {
        queries::messages::record_failed_attempt(&self.db, ids, max_attempts).await
    }

    async fn batch_is_complete(&self, batch: BatchId) -> Result<bool, CourierError> {
        queries::batches::batch_is_complete(&self.db, batch).await
    }

    async fn set_batch_status(
        &self,
        batch: BatchId,
        status: BatchStatus,
    ) -> Result<(), CourierError> {
        queries::batches::set_batch_status(&self.db, batch, status).await
    }

    async fn get_message(&self, id: MessageId) -> Result<Option<Message>, CourierError> {
        queries::messages::get_message(&self.db, id).await
    }

    async fn get_batch(&self, id: BatchId) -> Result<Option<MessageBatch>, CourierError> {
        queries::batches::get_batch(&self.db, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewMessage;
    use courier_config::DeliveryTarget;
    use tempfile::tempdir;

    fn store_config(path: &str) -> StoreConfig {
        StoreConfig {
            name: "default".to_string(),
            database_path: path.to_string(),
            router_url: DeliveryTarget::Template("http://router/%(text)s".to_string()),
        }
    }

    #[tokio::test]
    async fn open_uses_configured_name_and_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("default.db");
        let store = SqliteStore::open(&store_config(path.to_str().unwrap()))
            .await
            .unwrap();
        assert_eq!(store.name(), "default");
        assert!(path.exists());
    }

    #[tokio::test]
    async fn rollback_discards_cycle_changes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("default.db");
        let store = SqliteStore::open(&store_config(path.to_str().unwrap()))
            .await
            .unwrap();
        let id = queries::messages::insert_message(
            store.database(),
            &NewMessage::outbound("256700000001", "kannel", "hi"),
        )
        .await
        .unwrap();

        store.begin().await.unwrap();
        store.update_status(&[id], MessageStatus::Sent).await.unwrap();
        store.rollback().await.unwrap();
        let msg = store.get_message(id).await.unwrap().unwrap();
        assert_eq!(msg.status, MessageStatus::Queued);

        store.begin().await.unwrap();
        store.update_status(&[id], MessageStatus::Sent).await.unwrap();
        store.commit().await.unwrap();
        store.release().await.unwrap();
        let msg = store.get_message(id).await.unwrap().unwrap();
        assert_eq!(msg.status, MessageStatus::Sent);
    }
}
