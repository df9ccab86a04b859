use crate::domain::model::{DeliveryReport, Notification};
use crate::domain::ports::Notifier;
use crate::utils::error::{Result, SantaError};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

pub const DEFAULT_SUBJECT_PREFIX: &str = "Secret Santa drawing for";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl Message {
    pub fn render(notification: &Notification, sender: &str, subject_prefix: &str) -> Self {
        Self {
            from: sender.to_string(),
            to: notification.email.clone(),
            subject: format!("{} {}", subject_prefix, notification.name),
            body: format!(
                "Hello, {}. \n\nYou have drawn {} for this year's Secret Santa.",
                notification.name, notification.recipient
            ),
        }
    }
}

/// Posts each message as JSON to a mail relay endpoint.
pub struct HttpNotifier {
    client: Client,
    endpoint: String,
    sender: String,
    subject_prefix: String,
    api_token: Option<String>,
}

impl HttpNotifier {
    pub fn new(endpoint: impl Into<String>, sender: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
            sender: sender.into(),
            subject_prefix: DEFAULT_SUBJECT_PREFIX.to_string(),
            api_token: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.client = Client::builder().timeout(timeout).build()?;
        Ok(self)
    }

    pub fn with_api_token(mut self, token: Option<String>) -> Self {
        self.api_token = token;
        self
    }

    pub fn with_subject_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.subject_prefix = prefix.into();
        self
    }

    async fn send(&self, message: &Message, participant: &str) -> Result<()> {
        let mut request = self.client.post(&self.endpoint).json(message);
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        tracing::debug!("Relay response for {}: {}", participant, status);

        if !status.is_success() {
            return Err(SantaError::DeliveryError {
                participant: participant.to_string(),
                message: format!("relay responded with {}", status),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl Notifier for HttpNotifier {
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

/// Prints the messages instead of sending them.
pub struct ConsoleNotifier {
    sender: String,
    subject_prefix: String,
}

impl ConsoleNotifier {
    pub fn new(sender: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            subject_prefix: DEFAULT_SUBJECT_PREFIX.to_string(),
        }
    }

    pub fn with_subject_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.subject_prefix = prefix.into();
        self
    }
}

#[async_trait]
impl Notifier for ConsoleNotifier {
    async fn notify(&self, notifications: &[Notification]) -> DeliveryReport {
        let mut report = DeliveryReport::default();
        for notification in notifications {
            let message = Message::render(notification, &self.sender, &self.subject_prefix);
            println!("To: {}\nSubject: {}\n\n{}\n", message.to, message.subject, message.body);
            report.delivered.push(notification.name.clone());
        }
        report
    }
}
