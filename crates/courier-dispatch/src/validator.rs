// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cancels batch messages whose identity fails their backend's rule.

use courier_core::{BatchId, CourierError, MessageId, MessageStatus, MessageStore};
use tracing::info;

use crate::backend::BackendPolicy;

/// For every backend with an identity rule, cancels the batch's queued
/// outbound messages on that backend whose identity does not match.
///
/// Backends without a rule are left alone. Returns the number cancelled.
pub async fn cancel_invalid_identities(
    store: &dyn MessageStore,
    batch: BatchId,
    policy: &BackendPolicy,
) -> Result<usize, CourierError> {
    let mut cancelled = 0;

    for (backend, rule) in policy.rules() {
        let queued = store
            .queued_batch_messages(batch, Some(backend), None)
            .await?;
        let invalid: Vec<MessageId> = queued
            .iter()
            .filter(|m| !rule.is_match(&m.connection.identity))
            .map(|m| m.id)
            .collect();

        if invalid.is_empty() {
            continue;
        }

        let updated = store.update_status(&invalid, MessageStatus::Cancelled).await?;
        info!(
            store = store.name(),
            batch_id = %batch,
            backend,
            count = updated,
            "cancelled messages with invalid identities"
        );
        cancelled += updated;
    }

    Ok(cancelled)
}
