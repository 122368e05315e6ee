// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Batch queries.

use courier_core::{BatchId, BatchStatus, CourierError, MessageBatch};
use rusqlite::{OptionalExtension, Row, params};

use super::parse_code;
use crate::database::{Database, map_tr_err};

fn row_to_batch(row: &Row<'_>) -> Result<MessageBatch, rusqlite::Error> {
    let status: String = row.get(2)?;
    Ok(MessageBatch {
        id: BatchId(row.get(0)?),
        name: row.get(1)?,
        status: parse_code(2, &status)?,
        priority: row.get(3)?,
    })
}

/// Insert a queued batch. Returns the generated id.
pub async fn insert_batch(db: &Database, name: &str, priority: i32) -> Result<BatchId, CourierError> {
    let name = name.to_string();
    db.connection()
        .call(move |conn| -> Result<BatchId, rusqlite::Error> {
            conn.execute(
                "INSERT INTO batches (name, status, priority) VALUES (?1, 'Q', ?2)",
                params![name, priority],
            )?;
            Ok(BatchId(conn.last_insert_rowid()))
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_batch(db: &Database, id: BatchId) -> Result<Option<MessageBatch>, CourierError> {
    db.connection()
        .call(move |conn| -> Result<Option<MessageBatch>, rusqlite::Error> {
            conn.query_row(
                "SELECT id, name, status, priority FROM batches WHERE id = ?1",
                params![id.0],
                row_to_batch,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Clear queued batches that own no queued message, whatever its direction.
pub async fn clear_blocking_batches(db: &Database) -> Result<usize, CourierError> {
    db.connection()
        .call(|conn| -> Result<usize, rusqlite::Error> {
            conn.execute(
                "UPDATE batches SET status = 'C'
                 WHERE status = 'Q'
                   AND NOT EXISTS (
                       SELECT 1 FROM messages m WHERE m.batch_id = batches.id AND m.status = 'Q'
                   )",
                [],
            )
        })
        .await
        .map_err(map_tr_err)
}

/// The queued batch with the highest priority, oldest first on ties.
pub async fn next_queued_batch(db: &Database) -> Result<Option<MessageBatch>, CourierError> {
    db.connection()
        .call(|conn| -> Result<Option<MessageBatch>, rusqlite::Error> {
            conn.query_row(
                "SELECT id, name, status, priority FROM batches
                 WHERE status = 'Q'
                 ORDER BY priority DESC, id ASC
                 LIMIT 1",
                [],
                row_to_batch,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// True when no message of the batch is outside Sent/Cancelled.
pub async fn batch_is_complete(db: &Database, id: BatchId) -> Result<bool, CourierError> {
    db.connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            let pending: i64 = conn.query_row(
                "SELECT COUNT(*) FROM messages WHERE batch_id = ?1 AND status NOT IN ('S', 'C')",
                params![id.0],
                |row| row.get(0),
            )?;
            Ok(pending == 0)
        })
        .await
        .map_err(map_tr_err)
}

pub async fn set_batch_status(
    db: &Database,
    id: BatchId,
    status: BatchStatus,
) -> Result<(), CourierError> {
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "UPDATE batches SET status = ?1 WHERE id = ?2",
                params![status.to_string(), id.0],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}
