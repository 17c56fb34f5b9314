//! Notification adapters.

use async_trait::async_trait;
use log::info;
use reqwest::Client;
use serde::Serialize;

use crate::domain::error::StockfolioError;
use crate::domain::notification::Notification;
use crate::ports::notify_port::NotifyPort;

/// Writes notifications to the log. Used when no webhook is configured.
pub struct LogNotifier;

#[async_trait]
impl NotifyPort for LogNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), StockfolioError> {
        info!("notify {}: {}", notification.to, notification.subject());
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    to: &'a str,
    subject: &'a str,
    text: &'a str,
}

/// Posts each notification as JSON to an HTTP endpoint (a mail relay, chat hook, ...).
pub struct WebhookNotifier {
    client: Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(client: Client, url: &str) -> Self {
        Self {
            client,
            url: url.to_string(),
        }
    }
}

#[async_trait]
impl NotifyPort for WebhookNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), StockfolioError> {
        let payload = WebhookPayload {
            to: &notification.to,
            subject: notification.subject(),
            text: notification.text(),
        };
        self.client
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| StockfolioError::Internal {
                reason: format!("webhook delivery failed: {}", e),
            })?;
        Ok(())
    }
}
