// src/notify/mod.rs
use async_trait::async_trait;
use chrono::{DateTime, Local};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

pub mod log;
pub mod nexmo;
pub mod twilio;

pub use self::log::LogNotifier;
pub use nexmo::NexmoNotifier;
pub use twilio::TwilioNotifier;

use crate::core::attendance::types::Classification;
use crate::core::identity::types::ContactInfo;
use crate::utils::config::{NotifierConfig, NotifierProvider};
use crate::utils::error::{NodeError, Result};

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Contact {0} has no phone number")]
    MissingPhone(String),
    #[error("Provider request failed: {0}")]
    Request(String),
    #[error("Provider rejected message: {0}")]
    Rejected(String),
}

/// Outbound channel telling a guardian about an attendance event.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(
        &self,
        contact: &ContactInfo,
        classification: Classification,
        at: DateTime<Local>,
    ) -> std::result::Result<(), NotifyError>;

    fn provider(&self) -> &'static str;
}

pub fn compose_message(
    contact: &ContactInfo,
    classification: Classification,
    at: DateTime<Local>,
) -> String {
    format!(
        "Dear {}, your child {} (Roll: {}) has {} the school at {}.",
        contact.guardian_name.as_deref().unwrap_or("Guardian"),
        contact.name,
        contact.roll_number,
        classification.verb(),
        at.format("%H:%M")
    )
}

/// Phone number to text, or `MissingPhone` when the contact has none.
pub(crate) fn recipient(contact: &ContactInfo) -> std::result::Result<&str, NotifyError> {
    match contact.guardian_phone.as_deref().map(str::trim) {
        Some(phone) if !phone.is_empty() => Ok(phone),
        _ => Err(NotifyError::MissingPhone(contact.name.clone())),
    }
}

pub(crate) fn http_client(timeout: Duration) -> std::result::Result<reqwest::Client, NotifyError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| NotifyError::Request(e.to_string()))
}

/// Accepts every notification and sends nothing.
#[derive(Debug, Default)]
pub struct DisabledNotifier;

#[async_trait]
impl Notifier for DisabledNotifier {
    async fn notify(
        &self,
        _contact: &ContactInfo,
        _classification: Classification,
        _at: DateTime<Local>,
    ) -> std::result::Result<(), NotifyError> {
        Ok(())
    }

    fn provider(&self) -> &'static str {
        "disabled"
    }
}

pub fn build_notifier(config: &NotifierConfig) -> Result<Arc<dyn Notifier>> {
    let timeout = Duration::from_secs(config.timeout_secs);
    let credentials = || -> Result<(String, String, String)> {
        match (&config.api_key, &config.api_secret, &config.sender_id) {
            (Some(key), Some(secret), Some(sender)) => {
                Ok((key.clone(), secret.clone(), sender.clone()))
            }
            _ => Err(NodeError::Config(
                "SMS provider requires api_key, api_secret and sender_id".into(),
            )),
        }
    };

    let notifier: Arc<dyn Notifier> = match config.provider {
        NotifierProvider::Disabled => Arc::new(DisabledNotifier),
        NotifierProvider::Log => Arc::new(LogNotifier),
        NotifierProvider::Twilio => {
            let (key, secret, sender) = credentials()?;
            Arc::new(TwilioNotifier::new(key, secret, sender, timeout)?)
        }
        NotifierProvider::Nexmo => {
            let (key, secret, sender) = credentials()?;
            Arc::new(NexmoNotifier::new(key, secret, sender, timeout)?)
        }
    };

    tracing::info!("Notifications via {}", notifier.provider());
    Ok(notifier)
}
