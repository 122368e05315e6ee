// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Administrator notification trait.

use async_trait::async_trait;

use crate::error::CourierError;

/// Best-effort alert sink for unrecoverable per-store failures.
///
/// Callers log and ignore errors returned from [`Notifier::notify`].
#[async_trait]
pub trait Notifier: Send + Sync + 'static {
    /// Returns the human-readable name of this notifier.
    fn name(&self) -> &str;

    /// Sends an alert with the given subject and body.
    async fn notify(&self, subject: &str, body: &str) -> Result<(), CourierError>;
}
