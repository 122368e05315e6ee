// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Notifier used when no administrators are configured.

use async_trait::async_trait;
use courier_core::{CourierError, Notifier};
use tracing::error;

/// Writes alerts to the log at error level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    fn name(&self) -> &str {
        "log"
    }

    async fn notify(&self, subject: &str, body: &str) -> Result<(), CourierError> {
        error!(subject, body, "administrator alert");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    #[tokio::test]
    #[traced_test]
    async fn alerts_go_to_the_log() {
        LogNotifier
            .notify("dispatch failed for store default", "rolled back")
            .await
            .unwrap();
        assert!(logs_contain("administrator alert"));
        assert!(logs_contain("dispatch failed for store default"));
    }
}
