use crate::adapters::notifier::{Message, DEFAULT_SUBJECT_PREFIX};
use crate::config::toml_config::{SmtpConfig, SmtpTls};
use crate::domain::model::{DeliveryReport, Notification};
use crate::domain::ports::Notifier;
use crate::utils::error::{Result, SantaError};
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};
use std::time::Duration;

type Transport = AsyncSmtpTransport<Tokio1Executor>;

/// Sends each message through an SMTP server.
pub struct SmtpNotifier {
    transport: Transport,
    sender: String,
    subject_prefix: String,
}

impl SmtpNotifier {
    pub fn new(transport: Transport, sender: impl Into<String>) -> Self {
        Self {
            transport,
            sender: sender.into(),
            subject_prefix: DEFAULT_SUBJECT_PREFIX.to_string(),
        }
    }

    pub fn from_config(settings: &SmtpConfig, sender: impl Into<String>, timeout: Duration) -> Result<Self> {
        let mut builder = match settings.tls {
            SmtpTls::Implicit => Transport::relay(&settings.host)?,
            SmtpTls::Starttls => Transport::starttls_relay(&settings.host)?,
            SmtpTls::Plain => Transport::builder_dangerous(&settings.host),
        };

        if let Some(port) = settings.port {
            builder = builder.port(port);
        }
        if let (Some(username), Some(password)) = (&settings.username, &settings.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        tracing::debug!(
            "SMTP transport for {} ({:?}, port {:?})",
            settings.host,
            settings.tls,
            settings.port
        );
        Ok(Self::new(builder.timeout(Some(timeout)).build(), sender))
    }

    pub fn with_subject_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.subject_prefix = prefix.into();
        self
    }

    async fn send(&self, message: &Message, participant: &str) -> Result<()> {
        let email = build_email(message, participant)?;
        let response = self.transport.send(email).await?;
        tracing::debug!("SMTP response for {}: {:?}", participant, response.code());
        Ok(())
    }
}

fn parse_mailbox(address: &str, participant: &str) -> Result<Mailbox> {
    address.parse().map_err(|e| SantaError::DeliveryError {
        participant: participant.to_string(),
        message: format!("invalid address '{}': {}", address, e),
    })
}

pub(crate) fn build_email(message: &Message, participant: &str) -> Result<lettre::Message> {
    lettre::Message::builder()
        .from(parse_mailbox(&message.from, participant)?)
        .to(parse_mailbox(&message.to, participant)?)
        .subject(message.subject.clone())
        .header(ContentType::TEXT_PLAIN)
        .body(message.body.clone())
        .map_err(|e| SantaError::DeliveryError {
            participant: participant.to_string(),
            message: e.to_string(),
        })
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn notify(&self, notifications: &[Notification]) -> DeliveryReport {
        let mut report = DeliveryReport::default();

        for notification in notifications {
            let message = Message::render(notification, &self.sender, &self.subject_prefix);
            tracing::info!("Sending email to {}...", notification.name);

            match self.send(&message, &notification.name).await {
                Ok(()) => report.delivered.push(notification.name.clone()),
                Err(e) => {
                    tracing::warn!("❌ Could not notify {}: {}", notification.name, e);
                    report.failed.push((notification.name.clone(), e.to_string()));
                }
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notification(name: &str, email: &str, recipient: &str) -> Notification {
        Notification {
            name: name.to_string(),
            email: email.to_string(),
            recipient: recipient.to_string(),
        }
    }

    #[test]
    fn test_build_email_carries_rendered_message() {
        let message = Message::render(
            &notification("Ann", "ann@example.com", "Ben"),
            "santa@example.com",
            DEFAULT_SUBJECT_PREFIX,
        );
        let email = build_email(&message, "Ann").unwrap();
        let raw = String::from_utf8(email.formatted()).unwrap();

        assert!(raw.contains("From: santa@example.com"));
        assert!(raw.contains("To: ann@example.com"));
        assert!(raw.contains("Subject: Secret Santa drawing for Ann"));
        assert!(raw.contains("You have drawn Ben for this year's Secret Santa."));
    }

    #[test]
    fn test_build_email_rejects_bad_address() {
        let message = Message::render(
            &notification("Ann", "not an address", "Ben"),
            "santa@example.com",
            DEFAULT_SUBJECT_PREFIX,
        );
        let err = build_email(&message, "Ann").unwrap_err();
        assert!(matches!(err, SantaError::DeliveryError { ref participant, .. } if participant == "Ann"));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_reported_per_participant() {
        let settings = SmtpConfig {
            host: "127.0.0.1".to_string(),
            port: Some(9),
            username: None,
            password: None,
            tls: SmtpTls::Plain,
        };
        let notifier = SmtpNotifier::from_config(&settings, "santa@example.com", Duration::from_secs(2))
            .unwrap()
            .with_subject_prefix("Wichteln:");

        let report = notifier
            .notify(&[
                notification("Ann", "ann@example.com", "Ben"),
                notification("Ben", "not an address", "Ann"),
            ])
            .await;

        assert!(report.delivered.is_empty());
        assert_eq!(report.failed_names(), vec!["Ann", "Ben"]);
        assert!(report.failed[1].1.contains("invalid address"));
    }

    #[tokio::test]
    async fn test_tls_modes_build_transports() {
        for tls in [SmtpTls::Implicit, SmtpTls::Starttls, SmtpTls::Plain] {
            let settings = SmtpConfig {
                host: "smtp.example.com".to_string(),
                port: None,
                username: Some("santa".to_string()),
                password: Some("secret".to_string()),
                tls,
            };
            assert!(SmtpNotifier::from_config(&settings, "santa@example.com", Duration::from_secs(5)).is_ok());
        }
    }
}
