// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Partitions queued messages into same-backend chunks.

use courier_core::{Message, MessageId};

/// A contiguous run of messages sharing one backend, delivered in one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub backend: String,
    pub ids: Vec<MessageId>,
}

/// Orders messages by priority, status, backend name and id, then splits
/// the ordering into maximal runs with the same backend.
///
/// Chunks come back in dispatch order and never reorder messages across a
/// chunk boundary.
pub fn build_chunks(messages: &[Message]) -> Vec<Chunk> {
    let mut ordered: Vec<&Message> = messages.iter().collect();
    ordered.sort_by(|a, b| a.dispatch_key().cmp(&b.dispatch_key()));

    let mut chunks: Vec<Chunk> = Vec::new();
    for msg in ordered {
        let backend = msg.connection.backend.as_str();
        match chunks.last_mut() {
            Some(chunk) if chunk.backend == backend => chunk.ids.push(msg.id),
            _ => chunks.push(Chunk {
                backend: backend.to_string(),
                ids: vec![msg.id],
            }),
        }
    }
    chunks
}
