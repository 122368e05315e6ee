// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator traits the dispatch engine is written against.
//!
//! All traits use `#[async_trait]` for dynamic dispatch compatibility, so
//! the scheduler can hold a heterogeneous list of stores behind
//! `Arc<dyn MessageStore>`.

pub mod notifier;
pub mod store;

pub use notifier::Notifier;
pub use store::MessageStore;
