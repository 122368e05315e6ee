// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Insert models for rows created outside the dispatch engine.
//!
//! The engine itself never creates messages; these exist for the ingestion
//! path and for tests that seed a store.

use courier_core::{BatchId, Direction, MessageStatus};

/// A message row to insert.
#[derive(Debug, Clone)]
pub struct NewMessage {
    /// Raw text bytes. Valid UTF-8 is stored as TEXT, anything else as a BLOB.
    pub text: Vec<u8>,
    pub identity: String,
    pub backend: String,
    pub priority: i32,
    pub direction: Direction,
    pub status: MessageStatus,
    pub batch_id: Option<BatchId>,
}

impl NewMessage {
    /// A queued outbound message with priority 1 and no batch.
    pub fn outbound(
        identity: impl Into<String>,
        backend: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into().into_bytes(),
            identity: identity.into(),
            backend: backend.into(),
            priority: 1,
            direction: Direction::Outbound,
            status: MessageStatus::Queued,
            batch_id: None,
        }
    }

    pub fn in_batch(mut self, batch: BatchId) -> Self {
        self.batch_id = Some(batch);
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_status(mut self, status: MessageStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    pub fn with_raw_text(mut self, bytes: Vec<u8>) -> Self {
        self.text = bytes;
        self
    }
}
