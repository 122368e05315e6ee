// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Notifier that records alerts instead of sending them.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use courier_core::{CourierError, Notifier};

/// One recorded alert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub subject: String,
    pub body: String,
}

/// Records every alert. Can be told to fail, to exercise best-effort paths.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    alerts: Arc<Mutex<Vec<Alert>>>,
    failing: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// A notifier whose every `notify` call returns an error.
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub async fn alerts(&self) -> Vec<Alert> {
        self.alerts.lock().await.clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    fn name(&self) -> &str {
        "recording"
    }

    async fn notify(&self, subject: &str, body: &str) -> Result<(), CourierError> {
        self.alerts.lock().await.push(Alert {
            subject: subject.to_string(),
            body: body.to_string(),
        });
        if self.failing {
            return Err(CourierError::Notify {
                message: "mail relay unavailable".to_string(),
            });
        }
        Ok(())
    }
}
