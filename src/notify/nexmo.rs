// src/notify/nexmo.rs
use async_trait::async_trait;
use chrono::{DateTime, Local};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

use super::{compose_message, http_client, recipient, Notifier, NotifyError};
use crate::core::attendance::types::Classification;
use crate::core::identity::types::ContactInfo;

const NEXMO_SMS_URL: &str = "https://rest.nexmo.com/sms/json";

#[derive(Debug, Deserialize)]
struct SmsResponse {
    #[serde(default)]
    messages: Vec<SmsStatus>,
}

#[derive(Debug, Deserialize)]
struct SmsStatus {
    status: String,
    #[serde(rename = "error-text", default)]
    error_text: Option<String>,
}

pub struct NexmoNotifier {
    http_client: reqwest::Client,
    url: String,
    api_key: String,
    api_secret: String,
    sender: String,
}

impl NexmoNotifier {
    pub fn new(
        api_key: String,
        api_secret: String,
        sender: String,
        timeout: Duration,
    ) -> Result<Self, NotifyError> {
        Ok(Self {
            http_client: http_client(timeout)?,
            url: NEXMO_SMS_URL.to_string(),
            api_key,
            api_secret,
            sender,
        })
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }
}

#[async_trait]
impl Notifier for NexmoNotifier {
    async fn notify(
        &self,
        contact: &ContactInfo,
        classification: Classification,
        at: DateTime<Local>,
    ) -> Result<(), NotifyError> {
        let to = recipient(contact)?;
        let text = compose_message(contact, classification, at);
        let params = [
            ("api_key", self.api_key.as_str()),
            ("api_secret", self.api_secret.as_str()),
            ("to", to),
            ("from", self.sender.as_str()),
            ("text", text.as_str()),
        ];

        debug!("Sending Nexmo SMS to {}", to);
        let response = self
            .http_client
            .post(&self.url)
            .form(&params)
            .send()
            .await
            .map_err(|e| NotifyError::Request(e.to_string()))?;

        let parsed: SmsResponse = response
            .json()
            .await
            .map_err(|e| NotifyError::Request(e.to_string()))?;

        // Delivery status is per message part; the first part decides.
        match parsed.messages.first() {
            Some(first) if first.status == "0" => {
                info!("SMS sent to guardian of {}", contact.name);
                Ok(())
            }
            Some(first) => Err(NotifyError::Rejected(format!(
                "status {}: {}",
                first.status,
                first.error_text.as_deref().unwrap_or("unknown error")
            ))),
            None => Err(NotifyError::Rejected("empty message list".to_string())),
        }
    }

    fn provider(&self) -> &'static str {
        "nexmo"
    }
}
