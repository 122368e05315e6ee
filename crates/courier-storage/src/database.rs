// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background thread.
//! Do NOT create additional Connection instances for writes.

use courier_core::CourierError;
use tracing::debug;

use crate::migrations;

const PRAGMAS: &str = "
    PRAGMA journal_mode = WAL;
    PRAGMA synchronous = NORMAL;
    PRAGMA foreign_keys = ON;
    PRAGMA busy_timeout = 5000;
    PRAGMA temp_store = MEMORY;
";

/// Handle to one store's SQLite database.
#[derive(Clone)]
pub struct Database {
    conn: tokio_rusqlite::Connection,
    path: String,
}

impl Database {
    /// Opens the database at `path`, applies PRAGMAs, and runs pending migrations.
    pub async fn open(path: &str) -> Result<Self, CourierError> {
        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(CourierError::storage)?;

        conn.call(|conn| -> Result<(), rusqlite::Error> { conn.execute_batch(PRAGMAS) })
            .await
            .map_err(map_tr_err)?;

        conn.call(|conn| -> Result<(), CourierError> { migrations::run_migrations(conn) })
            .await
            .map_err(CourierError::storage)?;

        debug!(path, "database opened");
        Ok(Self {
            conn,
            path: path.to_string(),
        })
    }

    /// Returns the underlying tokio-rusqlite connection.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Returns the path this database was opened from.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Opens a transaction unless one is already active.
    pub async fn begin(&self) -> Result<(), CourierError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                if conn.is_autocommit() {
                    conn.execute_batch("BEGIN")?;
                }
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }

    /// Commits the active transaction, if any.
    pub async fn commit(&self) -> Result<(), CourierError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                if !conn.is_autocommit() {
                    conn.execute_batch("COMMIT")?;
                }
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }

    /// Rolls back the active transaction, if any.
    pub async fn rollback(&self) -> Result<(), CourierError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                if !conn.is_autocommit() {
                    conn.execute_batch("ROLLBACK")?;
                }
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }

    /// Runs a passive WAL checkpoint so readers are not starved between passes.
    pub async fn checkpoint(&self) -> Result<(), CourierError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.query_row("PRAGMA wal_checkpoint(PASSIVE);", [], |_| Ok(()))
            })
            .await
            .map_err(map_tr_err)
    }

    /// Checkpoints the WAL and closes the connection.
    pub async fn close(self) -> Result<(), CourierError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.query_row("PRAGMA wal_checkpoint(TRUNCATE);", [], |_| Ok(()))
            })
            .await
            .map_err(map_tr_err)?;
        self.conn.close().await.map_err(CourierError::storage)?;
        debug!(path = %self.path, "database closed");
        Ok(())
    }
}

/// Convert a tokio-rusqlite error into CourierError::Storage.
pub(crate) fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> CourierError {
    CourierError::Storage {
        source: Box::new(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn open_creates_schema() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.db");
        let db = Database::open(path.to_str().unwrap()).await.unwrap();

        let tables: Vec<String> = db
            .connection()
            .call(|conn| -> Result<Vec<String>, rusqlite::Error> {
                let mut stmt = conn.prepare(
                    "SELECT name FROM sqlite_master WHERE type = 'table' AND name IN ('batches', 'messages') ORDER BY name",
                )?;
                let names = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>();
                names
            })
            .await
            .unwrap();
        assert_eq!(tables, vec!["batches", "messages"]);
    }

    #[tokio::test]
    async fn reopen_is_idempotent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.db");
        let db = Database::open(path.to_str().unwrap()).await.unwrap();
        db.close().await.unwrap();
        let db = Database::open(path.to_str().unwrap()).await.unwrap();
        db.checkpoint().await.unwrap();
    }

    #[tokio::test]
    async fn nested_begin_is_a_no_op() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.db");
        let db = Database::open(path.to_str().unwrap()).await.unwrap();
        db.begin().await.unwrap();
        db.begin().await.unwrap();
        db.commit().await.unwrap();
        db.commit().await.unwrap();
        db.rollback().await.unwrap();
    }
}
