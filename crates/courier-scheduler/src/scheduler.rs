// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The polling loop and the per-store dispatch cycle.
//!
//! Each pass visits the stores in configuration order. One store is fully
//! processed, inside its own transaction, before the next one starts. A
//! failure while processing a store rolls that store back, alerts the
//! administrators, and does not stop the pass.

use std::sync::Arc;
use std::time::Duration;

use courier_config::{DeliveryTarget, DispatchConfig};
use courier_core::{BatchId, BatchStatus, CourierError, MessageBatch, MessageStore, Notifier};
use courier_dispatch::{ChunkOutcome, Dispatcher, build_chunks, cancel_invalid_identities};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Loop tuning taken from `[dispatch]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerSettings {
    /// Maximum batch messages considered per store per cycle.
    pub chunk_size: usize,
    /// Pause between two passes.
    pub poll_interval: Duration,
}

impl From<&DispatchConfig> for SchedulerSettings {
    fn from(config: &DispatchConfig) -> Self {
        Self {
            chunk_size: config.chunk_size,
            poll_interval: Duration::from_millis(config.poll_interval_ms),
        }
    }
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self::from(&DispatchConfig::default())
    }
}

/// What one cycle did to one store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Batches moved to Cleared by reconciliation.
    pub cleared: usize,
    /// The batch selected this cycle, if any.
    pub batch: Option<BatchId>,
    /// Batch messages cancelled for invalid identities.
    pub cancelled: usize,
    /// Outcome of every batch chunk, in dispatch order.
    pub chunks: Vec<ChunkOutcome>,
    /// Whether the selected batch reached Sent.
    pub batch_completed: bool,
    /// Outcome of the unbatched message, if one was selected.
    pub unbatched: Option<ChunkOutcome>,
}

/// What one pass over all stores did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassReport {
    /// Stores whose cycle committed, with their report.
    pub completed: Vec<(String, CycleReport)>,
    /// Stores whose cycle was rolled back.
    pub failed: Vec<String>,
}

/// Drives dispatch across every configured store.
pub struct Scheduler {
    stores: Vec<(Arc<dyn MessageStore>, DeliveryTarget)>,
    dispatcher: Arc<Dispatcher>,
    notifier: Arc<dyn Notifier>,
    settings: SchedulerSettings,
}

impl Scheduler {
    /// Creates a scheduler over `stores`, processed in the given order.
    pub fn new(
        stores: Vec<(Arc<dyn MessageStore>, DeliveryTarget)>,
        dispatcher: Arc<Dispatcher>,
        notifier: Arc<dyn Notifier>,
        settings: SchedulerSettings,
    ) -> Self {
        Self {
            stores,
            dispatcher,
            notifier,
            settings,
        }
    }

    pub fn settings(&self) -> SchedulerSettings {
        self.settings
    }

    pub fn store_names(&self) -> Vec<&str> {
        self.stores.iter().map(|(store, _)| store.name()).collect()
    }

    /// Runs passes until `cancel` fires. A pass in progress is finished
    /// before the loop exits.
    pub async fn run(&self, cancel: CancellationToken) -> Result<(), CourierError> {
        info!(
            stores = self.stores.len(),
            chunk_size = self.settings.chunk_size,
            poll_interval = ?self.settings.poll_interval,
            "scheduler running"
        );

        while !cancel.is_cancelled() {
            self.run_once().await;

            tokio::select! {
                _ = cancel.cancelled() => {}
                _ = tokio::time::sleep(self.settings.poll_interval) => {}
            }
        }

        info!("scheduler stopped");
        Ok(())
    }

    /// Runs one pass over every store, then releases idle store resources.
    pub async fn run_once(&self) -> PassReport {
        let mut report = PassReport::default();

        for (store, target) in &self.stores {
            let name = store.name().to_string();
            match self.process_store(store.as_ref(), target).await {
                Ok(cycle) => report.completed.push((name, cycle)),
                Err(e) => {
                    error!(store = %name, error = %e, "store processing failed, rolled back");
                    self.alert(&name, &e).await;
                    report.failed.push(name);
                }
            }
        }

        for (store, _) in &self.stores {
            if let Err(e) = store.release().await {
                warn!(store = store.name(), error = %e, "failed to release store resources");
            }
        }

        report
    }

    /// Runs one cycle on a store inside a transaction.
    pub async fn process_store(
        &self,
        store: &dyn MessageStore,
        target: &DeliveryTarget,
    ) -> Result<CycleReport, CourierError> {
        store.begin().await?;

        let result = match self.cycle(store, target).await {
            Ok(report) => store.commit().await.map(|()| report),
            Err(e) => Err(e),
        };

        if result.is_err() {
            if let Err(e) = store.rollback().await {
                warn!(store = store.name(), error = %e, "rollback failed");
            }
        }
        result
    }

    async fn cycle(
        &self,
        store: &dyn MessageStore,
        target: &DeliveryTarget,
    ) -> Result<CycleReport, CourierError> {
        let mut report = CycleReport {
            cleared: store.clear_blocking_batches().await?,
            ..CycleReport::default()
        };
        if report.cleared > 0 {
            info!(store = store.name(), count = report.cleared, "cleared batches without queued messages");
        }

        match store.next_queued_batch().await? {
            Some(batch) => self.process_batch(store, target, &batch, &mut report).await?,
            None => debug!(store = store.name(), "no queued batches"),
        }

        match store.next_unbatched_message().await? {
            Some(message) => {
                let outcome = self
                    .dispatcher
                    .send_chunk(
                        store,
                        target,
                        &[message.id],
                        &message.connection.backend,
                        message.priority,
                    )
                    .await?;
                report.unbatched = Some(outcome);
            }
            None => debug!(store = store.name(), "no unbatched messages"),
        }

        Ok(report)
    }

    async fn process_batch(
        &self,
        store: &dyn MessageStore,
        target: &DeliveryTarget,
        batch: &MessageBatch,
        report: &mut CycleReport,
    ) -> Result<(), CourierError> {
        debug!(store = store.name(), batch_id = %batch.id, priority = batch.priority, "processing batch");
        report.batch = Some(batch.id);
        report.cancelled =
            cancel_invalid_identities(store, batch.id, self.dispatcher.policy()).await?;

        let messages = store
            .queued_batch_messages(batch.id, None, Some(self.settings.chunk_size))
            .await?;

        for chunk in build_chunks(&messages) {
            let outcome = self
                .dispatcher
                .send_chunk(store, target, &chunk.ids, &chunk.backend, batch.priority)
                .await?;
            report.chunks.push(outcome);
        }

        if store.batch_is_complete(batch.id).await? {
            store.set_batch_status(batch.id, BatchStatus::Sent).await?;
            info!(store = store.name(), batch_id = %batch.id, name = %batch.name, "batch complete");
            report.batch_completed = true;
        }
        Ok(())
    }

    async fn alert(&self, store: &str, err: &CourierError) {
        let subject = format!("dispatch failed for store {store}");
        let body = format!("Processing of store {store} was rolled back.\n\n{err}");
        if let Err(e) = self.notifier.notify(&subject, &body).await {
            warn!(notifier = self.notifier.name(), error = %e, "failed to notify administrators");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_follow_dispatch_config() {
        let config = DispatchConfig {
            chunk_size: 10,
            poll_interval_ms: 250,
            ..DispatchConfig::default()
        };
        let settings = SchedulerSettings::from(&config);
        assert_eq!(settings.chunk_size, 10);
        assert_eq!(settings.poll_interval, Duration::from_millis(250));
    }

    #[test]
    fn default_settings_match_config_defaults() {
        let settings = SchedulerSettings::default();
        assert_eq!(settings.chunk_size, 400);
        assert_eq!(settings.poll_interval, Duration::from_millis(500));
    }
}
