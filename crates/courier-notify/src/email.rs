// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SMTP email notifier.

use async_trait::async_trait;
use courier_config::NotifyConfig;
use courier_core::{CourierError, Notifier};
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{debug, info};

/// Mails every alert to the configured administrators through an SMTP relay.
pub struct EmailNotifier {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    admins: Vec<Mailbox>,
    subject_prefix: String,
}

impl EmailNotifier {
    /// Builds the notifier from `[notify]`.
    ///
    /// Fails when `from` is missing or any address does not parse.
    pub fn new(config: &NotifyConfig) -> Result<Self, CourierError> {
        let from = config
            .from
            .as_deref()
            .ok_or_else(|| CourierError::Config("notify.from is required to send alerts".into()))
            .and_then(|addr| parse_mailbox("notify.from", addr))?;
        let admins = config
            .admins
            .iter()
            .map(|addr| parse_mailbox("notify.admins", addr))
            .collect::<Result<Vec<_>, _>>()?;

        let mut builder =
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.smtp_host)
                .port(config.smtp_port);
        if let Some(username) = &config.smtp_username {
            builder = builder.credentials(Credentials::new(
                username.clone(),
                config.smtp_password.clone().unwrap_or_default(),
            ));
        }

        info!(
            relay = %config.smtp_host,
            port = config.smtp_port,
            admins = admins.len(),
            "email notifier configured"
        );

        Ok(Self {
            mailer: builder.build(),
            from,
            admins,
            subject_prefix: config.subject_prefix.clone(),
        })
    }

    /// Builds the alert message sent to every administrator.
    pub fn build_message(&self, subject: &str, body: &str) -> Result<Message, CourierError> {
        let mut builder = Message::builder()
            .from(self.from.clone())
            .subject(format!("{}{subject}", self.subject_prefix))
            .header(ContentType::TEXT_PLAIN);
        for admin in &self.admins {
            builder = builder.to(admin.clone());
        }
        builder.body(body.to_string()).map_err(|e| CourierError::Notify {
            message: format!("failed to build alert email: {e}"),
        })
    }
}

fn parse_mailbox(field: &str, addr: &str) -> Result<Mailbox, CourierError> {
    addr.parse::<Mailbox>()
        .map_err(|e| CourierError::Config(format!("{field}: invalid address `{addr}`: {e}")))
}

#[async_trait]
impl Notifier for EmailNotifier {
    fn name(&self) -> &str {
        "email"
    }

    async fn notify(&self, subject: &str, body: &str) -> Result<(), CourierError> {
        if self.admins.is_empty() {
            return Ok(());
        }
        let message = self.build_message(subject, body)?;
        self.mailer
            .send(message)
            .await
            .map_err(|e| CourierError::Notify {
                message: format!("failed to send alert email: {e}"),
            })?;
        debug!(recipients = self.admins.len(), "alert email sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> NotifyConfig {
        NotifyConfig {
            admins: vec!["ops@example.com".into(), "oncall@example.com".into()],
            from: Some("courier@example.com".into()),
            ..NotifyConfig::default()
        }
    }

    #[tokio::test]
    async fn message_carries_prefix_and_recipients() {
        let notifier = EmailNotifier::new(&config()).unwrap();
        let message = notifier
            .build_message("dispatch failed for store default", "rolled back")
            .unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();

        assert!(raw.contains("Subject: [Courier] dispatch failed for store default"));
        assert!(raw.contains("From: courier@example.com"));
        assert!(raw.contains("ops@example.com"));
        assert!(raw.contains("oncall@example.com"));
        assert!(raw.contains("rolled back"));
    }

    #[tokio::test]
    async fn missing_sender_is_a_config_error() {
        let mut cfg = config();
        cfg.from = None;
        assert!(matches!(
            EmailNotifier::new(&cfg),
            Err(CourierError::Config(_))
        ));
    }

    #[tokio::test]
    async fn bad_address_is_a_config_error() {
        let mut cfg = config();
        cfg.admins.push("not an address".into());
        let err = EmailNotifier::new(&cfg).err().unwrap();
        assert!(err.to_string().contains("notify.admins"));
    }
}
