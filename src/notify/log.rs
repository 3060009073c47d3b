// src/notify/log.rs
use async_trait::async_trait;
use chrono::{DateTime, Local};
use tracing::info;

use super::{compose_message, recipient, Notifier, NotifyError};
use crate::core::attendance::types::Classification;
use crate::core::identity::types::ContactInfo;

/// Writes the message to the log instead of sending it.
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(
        &self,
        contact: &ContactInfo,
        classification: Classification,
        at: DateTime<Local>,
    ) -> Result<(), NotifyError> {
        let to = recipient(contact)?;
        info!(
            to = to,
            identity = %contact.identity_id,
            "{}",
            compose_message(contact, classification, at)
        );
        Ok(())
    }

    fn provider(&self) -> &'static str {
        "log"
    }
}
