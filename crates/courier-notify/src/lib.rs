// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Administrator notifiers for per-store processing failures.

pub mod email;
pub mod log;

use std::sync::Arc;

use courier_config::NotifyConfig;
use courier_core::{CourierError, Notifier};

pub use email::EmailNotifier;
pub use log::LogNotifier;

/// Email when administrators are configured, the log otherwise.
pub fn from_config(config: &NotifyConfig) -> Result<Arc<dyn Notifier>, CourierError> {
    if config.admins.is_empty() {
        Ok(Arc::new(LogNotifier))
    } else {
        Ok(Arc::new(EmailNotifier::new(config)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn no_admins_selects_log_notifier() {
        let notifier = from_config(&NotifyConfig::default()).unwrap();
        assert_eq!(notifier.name(), "log");
    }

    #[tokio::test]
    async fn admins_select_email_notifier() {
        let config = NotifyConfig {
            admins: vec!["ops@example.com".into()],
            from: Some("courier@example.com".into()),
            ..NotifyConfig::default()
        };
        let notifier = from_config(&config).unwrap();
        assert_eq!(notifier.name(), "email");
    }
}
