// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Courier outbound dispatch engine.
//!
//! This crate provides the domain types, the error type, and the
//! collaborator traits (message store, notifier) that the storage,
//! dispatch, and scheduler crates are written against.

pub mod error;
pub mod text;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::CourierError;
pub use text::stringify;
pub use types::{
    BatchId, BatchStatus, Connection, Direction, Message, MessageBatch, MessageId, MessageStatus,
};

pub use traits::{MessageStore, Notifier};

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn message(id: i64, priority: i32, backend: &str) -> Message {
        Message {
            id: MessageId(id),
            text: "hello".into(),
            direction: Direction::Outbound,
            status: MessageStatus::Queued,
            priority,
            connection: Connection::new("256700000001", backend),
            batch_id: None,
            attempts: 0,
        }
    }

    #[test]
    fn message_status_codes_round_trip() {
        let variants = [
            (MessageStatus::Queued, "Q"),
            (MessageStatus::Sent, "S"),
            (MessageStatus::Blocked, "B"),
            (MessageStatus::Discarded, "K"),
            (MessageStatus::Cancelled, "C"),
            (MessageStatus::Failed, "F"),
        ];

        for (status, code) in variants {
            assert_eq!(status.to_string(), code);
            assert_eq!(MessageStatus::from_str(code).expect("should parse"), status);
        }
    }

    #[test]
    fn batch_status_codes_round_trip() {
        for (status, code) in [
            (BatchStatus::Queued, "Q"),
            (BatchStatus::Sent, "S"),
            (BatchStatus::Cleared, "C"),
        ] {
            assert_eq!(status.to_string(), code);
            assert_eq!(BatchStatus::from_str(code).expect("should parse"), status);
        }
    }

    #[test]
    fn only_queued_is_non_terminal() {
        assert!(!MessageStatus::Queued.is_terminal());
        assert!(MessageStatus::Sent.is_terminal());
        assert!(MessageStatus::Blocked.is_terminal());
        assert!(MessageStatus::Discarded.is_terminal());
        assert!(MessageStatus::Cancelled.is_terminal());
        assert!(MessageStatus::Failed.is_terminal());
    }

    #[test]
    fn batch_completion_counts_sent_and_cancelled_only() {
        assert!(MessageStatus::Sent.completes_batch());
        assert!(MessageStatus::Cancelled.completes_batch());
        assert!(!MessageStatus::Blocked.completes_batch());
        assert!(!MessageStatus::Discarded.completes_batch());
        assert!(!MessageStatus::Queued.completes_batch());
    }

    #[test]
    fn dispatch_key_orders_priority_then_backend_then_id() {
        let mut msgs = vec![
            message(4, 2, "alpha"),
            message(3, 1, "zeta"),
            message(1, 1, "zeta"),
            message(2, 1, "alpha"),
        ];
        msgs.sort_by(|a, b| a.dispatch_key().cmp(&b.dispatch_key()));
        let ids: Vec<i64> = msgs.iter().map(|m| m.id.0).collect();
        assert_eq!(ids, vec![2, 1, 3, 4]);
    }

    #[test]
    fn blank_text_detection() {
        let mut msg = message(1, 1, "fake");
        assert!(!msg.has_blank_text());
        msg.text = " ".into();
        assert!(msg.has_blank_text());
        msg.text = String::new();
        assert!(msg.has_blank_text());
    }

    #[test]
    fn courier_error_variants_render() {
        let err = CourierError::UnsupportedBackend {
            backend: "warid".into(),
        };
        assert_eq!(err.to_string(), "unsupported backend: warid");

        let err = CourierError::storage(std::io::Error::other("disk full"));
        assert!(err.to_string().contains("disk full"));
    }
}
