// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared by the store, dispatch, and scheduler crates.
//!
//! Status enums serialize to the single-letter codes persisted in the
//! message tables (`Q`, `S`, `B`, ...), so `to_string()` and `FromStr`
//! are the storage representation.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Identifier of a message row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MessageId(pub i64);

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a message batch row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BatchId(pub i64);

impl std::fmt::Display for BatchId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Direction of a message relative to this relay.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr, Serialize, Deserialize,
)]
pub enum Direction {
    #[strum(serialize = "O")]
    Outbound,
    #[strum(serialize = "I")]
    Inbound,
}

/// Delivery status of a single message.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    AsRefStr,
    Serialize,
    Deserialize,
)]
pub enum MessageStatus {
    #[strum(serialize = "Q")]
    Queued,
    #[strum(serialize = "S")]
    Sent,
    #[strum(serialize = "B")]
    Blocked,
    #[strum(serialize = "K")]
    Discarded,
    #[strum(serialize = "C")]
    Cancelled,
    /// Dead letter: the configured attempt bound was reached.
    #[strum(serialize = "F")]
    Failed,
}

impl MessageStatus {
    /// Returns true for statuses no transition leaves.
    pub fn is_terminal(self) -> bool {
        !matches!(self, MessageStatus::Queued)
    }

    /// Returns true for statuses that count toward batch completion.
    pub fn completes_batch(self) -> bool {
        matches!(self, MessageStatus::Sent | MessageStatus::Cancelled)
    }
}

/// Status of a message batch.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr, Serialize, Deserialize,
)]
pub enum BatchStatus {
    #[strum(serialize = "Q")]
    Queued,
    #[strum(serialize = "S")]
    Sent,
    /// Queued batch left without queued messages, reconciled so it no
    /// longer blocks selection.
    #[strum(serialize = "C")]
    Cleared,
}

/// Destination of a message: an identity on a named backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Connection {
    /// Destination address, usually a phone number.
    pub identity: String,
    /// Name of the backend (gateway) that delivers to this identity.
    pub backend: String,
}

impl Connection {
    pub fn new(identity: impl Into<String>, backend: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            backend: backend.into(),
        }
    }
}

/// A message row as seen by the dispatch engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub text: String,
    pub direction: Direction,
    pub status: MessageStatus,
    pub priority: i32,
    pub connection: Connection,
    /// Owning batch, if any.
    pub batch_id: Option<BatchId>,
    /// Failed delivery attempts recorded so far.
    pub attempts: u32,
}

impl Message {
    /// Sort key used for every dispatch ordering: priority, status,
    /// backend name, then id for FIFO tie-breaks.
    pub fn dispatch_key(&self) -> (i32, &str, &str, MessageId) {
        (
            self.priority,
            self.status.as_ref(),
            self.connection.backend.as_str(),
            self.id,
        )
    }

    /// Returns true when the text is empty or a single blank.
    pub fn has_blank_text(&self) -> bool {
        self.text.is_empty() || self.text == " "
    }
}

/// A named, prioritized group of outbound messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageBatch {
    pub id: BatchId,
    pub name: String,
    pub status: BatchStatus,
    pub priority: i32,
}
