// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Courier integration tests.
//!
//! Provides mock collaborators and test harness infrastructure for fast,
//! deterministic, CI-runnable tests without gateways or databases.
//!
//! # Components
//!
//! - [`MemoryStore`] - In-memory message store with transaction snapshots
//! - [`MockTransport`] - Transport with scripted statuses and recorded requests
//! - [`RecordingNotifier`] - Notifier that captures alerts
//! - [`TestHarness`] - Wires the above into a `Dispatcher`

pub mod harness;
pub mod memory_store;
pub mod mock_notifier;
pub mod mock_transport;

pub use harness::{KANNEL_TEMPLATE, TempSqliteStore, TestHarness};
pub use memory_store::MemoryStore;
pub use mock_notifier::{Alert, RecordingNotifier};
pub use mock_transport::{MockTransport, Scripted};
