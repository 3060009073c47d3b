// src/notify/twilio.rs
use async_trait::async_trait;
use chrono::{DateTime, Local};
use reqwest::StatusCode;
use std::time::Duration;
use tracing::{debug, info};

use super::{compose_message, http_client, recipient, Notifier, NotifyError};
use crate::core::attendance::types::Classification;
use crate::core::identity::types::ContactInfo;

const TWILIO_API_BASE: &str = "https://api.twilio.com";

pub struct TwilioNotifier {
    http_client: reqwest::Client,
    base_url: String,
    account_sid: String,
    auth_token: String,
    sender: String,
}

impl TwilioNotifier {
    pub fn new(
        account_sid: String,
        auth_token: String,
        sender: String,
        timeout: Duration,
    ) -> Result<Self, NotifyError> {
        Ok(Self {
            http_client: http_client(timeout)?,
            base_url: TWILIO_API_BASE.to_string(),
            account_sid,
            auth_token,
            sender,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.base_url.trim_end_matches('/'),
            self.account_sid
        )
    }
}

#[async_trait]
impl Notifier for TwilioNotifier {
    async fn notify(
        &self,
        contact: &ContactInfo,
        classification: Classification,
        at: DateTime<Local>,
    ) -> Result<(), NotifyError> {
        let to = recipient(contact)?;
        let body = compose_message(contact, classification, at);
        let params = [("From", self.sender.as_str()), ("To", to), ("Body", body.as_str())];

        debug!("Sending Twilio SMS to {}", to);
        let response = self
            .http_client
            .post(self.messages_url())
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&params)
            .send()
            .await
            .map_err(|e| NotifyError::Request(e.to_string()))?;

        let status = response.status();
        if status != StatusCode::CREATED {
            let error_text = response.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected(format!(
                "HTTP {}: {}",
                status.as_u16(),
                error_text
            )));
        }

        info!("SMS sent to guardian of {}", contact.name);
        Ok(())
    }

    fn provider(&self) -> &'static str {
        "twilio"
    }
}
