// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message queries: dispatch-order selection and bulk status transitions.

use courier_core::{
    BatchId, Connection, CourierError, Message, MessageId, MessageStatus, stringify,
};
use rusqlite::types::{Type, Value};
use rusqlite::{OptionalExtension, Row, params, params_from_iter};

use super::{MAX_BOUND_IDS, parse_code, placeholders};
use crate::database::{Database, map_tr_err};
use crate::models::NewMessage;

const MESSAGE_COLUMNS: &str =
    "id, text, direction, status, priority, identity, backend, batch_id, attempts";

const DISPATCH_ORDER: &str = "ORDER BY priority ASC, status ASC, backend ASC, id ASC";

const NOW: &str = "strftime('%Y-%m-%dT%H:%M:%fZ', 'now')";

fn row_to_message(row: &Row<'_>) -> Result<Message, rusqlite::Error> {
    let raw = row
        .get_ref(1)?
        .as_bytes()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(1, Type::Blob, Box::new(e)))?;
    let direction: String = row.get(2)?;
    let status: String = row.get(3)?;

    Ok(Message {
        id: MessageId(row.get(0)?),
        text: stringify(raw).into_owned(),
        direction: parse_code(2, &direction)?,
        status: parse_code(3, &status)?,
        priority: row.get(4)?,
        connection: Connection::new(row.get::<_, String>(5)?, row.get::<_, String>(6)?),
        batch_id: row.get::<_, Option<i64>>(7)?.map(BatchId),
        attempts: row.get(8)?,
    })
}

fn id_values(ids: &[MessageId]) -> Vec<i64> {
    ids.iter().map(|id| id.0).collect()
}

/// Insert a message. Returns the generated id.
pub async fn insert_message(db: &Database, msg: &NewMessage) -> Result<MessageId, CourierError> {
    let msg = msg.clone();
    let text = match String::from_utf8(msg.text) {
        Ok(text) => Value::Text(text),
        Err(e) => Value::Blob(e.into_bytes()),
    };
    db.connection()
        .call(move |conn| -> Result<MessageId, rusqlite::Error> {
            conn.execute(
                "INSERT INTO messages (text, direction, status, priority, identity, backend, batch_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    text,
                    msg.direction.as_ref(),
                    msg.status.as_ref(),
                    msg.priority,
                    msg.identity,
                    msg.backend,
                    msg.batch_id.map(|b| b.0),
                ],
            )?;
            Ok(MessageId(conn.last_insert_rowid()))
        })
        .await
        .map_err(map_tr_err)
}

/// Get a single message by id.
pub async fn get_message(db: &Database, id: MessageId) -> Result<Option<Message>, CourierError> {
    db.connection()
        .call(move |conn| -> Result<Option<Message>, rusqlite::Error> {
            conn.query_row(
                &format!("SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = ?1"),
                params![id.0],
                row_to_message,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Get the given messages ordered by ascending id. Unknown ids are skipped.
pub async fn messages_by_ids(
    db: &Database,
    ids: &[MessageId],
) -> Result<Vec<Message>, CourierError> {
    let ids = id_values(ids);
    db.connection()
        .call(move |conn| -> Result<Vec<Message>, rusqlite::Error> {
            let mut messages = Vec::with_capacity(ids.len());
            for chunk in ids.chunks(MAX_BOUND_IDS) {
                let sql = format!(
                    "SELECT {MESSAGE_COLUMNS} FROM messages WHERE id IN ({}) ORDER BY id ASC",
                    placeholders(chunk.len())
                );
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt.query_map(params_from_iter(chunk.iter()), row_to_message)?;
                for row in rows {
                    messages.push(row?);
                }
            }
            messages.sort_by_key(|m| m.id);
            Ok(messages)
        })
        .await
        .map_err(map_tr_err)
}

/// Get a batch's queued outbound messages in dispatch order.
///
/// `backend` restricts the selection to one backend; `limit` caps the count.
pub async fn queued_batch_messages(
    db: &Database,
    batch: BatchId,
    backend: Option<&str>,
    limit: Option<usize>,
) -> Result<Vec<Message>, CourierError> {
    let backend = backend.map(str::to_string);
    // SQLite treats a negative LIMIT as unbounded.
    let limit = limit.map_or(-1, |l| i64::try_from(l).unwrap_or(i64::MAX));
    db.connection()
        .call(move |conn| -> Result<Vec<Message>, rusqlite::Error> {
            let mut stmt = conn.prepare(&format!(
                "SELECT {MESSAGE_COLUMNS} FROM messages
                 WHERE batch_id = ?1 AND status = 'Q' AND direction = 'O'
                   AND (?2 IS NULL OR backend = ?2)
                 {DISPATCH_ORDER} LIMIT ?3"
            ))?;
            let rows = stmt.query_map(params![batch.0, backend, limit], row_to_message)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Get the first queued outbound message without a batch and with non-blank text.
pub async fn next_unbatched_message(db: &Database) -> Result<Option<Message>, CourierError> {
    db.connection()
        .call(|conn| -> Result<Option<Message>, rusqlite::Error> {
            conn.query_row(
                &format!(
                    "SELECT {MESSAGE_COLUMNS} FROM messages
                     WHERE batch_id IS NULL AND status = 'Q' AND direction = 'O'
                       AND text <> '' AND text <> ' '
                     {DISPATCH_ORDER} LIMIT 1"
                ),
                [],
                row_to_message,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Set the status of every given message. Returns the number of rows updated.
pub async fn update_status(
    db: &Database,
    ids: &[MessageId],
    status: MessageStatus,
) -> Result<usize, CourierError> {
    let ids = id_values(ids);
    db.connection()
        .call(move |conn| -> Result<usize, rusqlite::Error> {
            let mut updated = 0;
            for chunk in ids.chunks(MAX_BOUND_IDS) {
                let sql = format!(
                    "UPDATE messages SET status = ?, updated_at = {NOW} WHERE id IN ({})",
                    placeholders(chunk.len())
                );
                let mut values = vec![Value::Text(status.to_string())];
                values.extend(chunk.iter().map(|id| Value::Integer(*id)));
                updated += conn.execute(&sql, params_from_iter(values))?;
            }
            Ok(updated)
        })
        .await
        .map_err(map_tr_err)
}

/// Requeue messages after a transient failure.
///
/// Without a bound the messages simply return to `Q`. With one, attempts are
/// counted and messages reaching the bound move to `F`. Returns the number
/// moved to `F`.
pub async fn record_failed_attempt(
    db: &Database,
    ids: &[MessageId],
    max_attempts: Option<u32>,
) -> Result<usize, CourierError> {
    let ids = id_values(ids);
    db.connection()
        .call(move |conn| -> Result<usize, rusqlite::Error> {
            let mut failed = 0;
            for chunk in ids.chunks(MAX_BOUND_IDS) {
                let in_list = placeholders(chunk.len());
                let chunk_values = || chunk.iter().map(|id| Value::Integer(*id));

                let Some(max) = max_attempts else {
                    conn.execute(
                        &format!(
                            "UPDATE messages SET status = 'Q', updated_at = {NOW} WHERE id IN ({in_list})"
                        ),
                        params_from_iter(chunk_values()),
                    )?;
                    continue;
                };

                let mut values = vec![Value::Integer(i64::from(max))];
                values.extend(chunk_values());
                failed += conn.execute(
                    &format!(
                        "UPDATE messages SET attempts = attempts + 1, status = 'F', updated_at = {NOW}
                         WHERE attempts + 1 >= ? AND id IN ({in_list})"
                    ),
                    params_from_iter(values),
                )?;
                conn.execute(
                    &format!(
                        "UPDATE messages SET attempts = attempts + 1, status = 'Q', updated_at = {NOW}
                         WHERE status <> 'F' AND id IN ({in_list})"
                    ),
                    params_from_iter(chunk_values()),
                )?;
            }
            Ok(failed)
        })
        .await
        .map_err(map_tr_err)
}
