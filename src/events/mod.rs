// src/events/mod.rs
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{trace, warn};

use crate::camera::CameraId;
use crate::core::attendance::types::{Classification, RecordId};
use crate::core::identity::types::IdentityId;

/// Topic carrying one message per persisted attendance record.
pub const ATTENDANCE_TOPIC: &str = "attendance_updates";

/// Payload pushed to live viewers after a record is stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceUpdate {
    pub record_id: RecordId,
    pub identity_id: IdentityId,
    pub name: String,
    pub roll_number: String,
    pub camera_id: CameraId,
    pub classification: Classification,
    pub confidence: f32,
    pub timestamp: DateTime<Local>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusMessage {
    pub topic: String,
    pub payload: String,
}

/// Fire-and-forget publication to live subscribers.
///
/// Publishing never fails the caller; a missing audience or an
/// unserializable payload is logged and dropped.
#[cfg_attr(test, mockall::automock)]
pub trait LiveBus: Send + Sync {
    /// Returns how many subscribers received the message.
    fn publish(&self, topic: &str, update: &AttendanceUpdate) -> usize;
}

/// In-process bus over a tokio broadcast channel.
///
/// Slow subscribers lose the oldest messages once `capacity` is exceeded.
pub struct BroadcastBus {
    tx: broadcast::Sender<BusMessage>,
    capacity: usize,
}

impl BroadcastBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx, capacity }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BusMessage> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl LiveBus for BroadcastBus {
    fn publish(&self, topic: &str, update: &AttendanceUpdate) -> usize {
        let payload = match serde_json::to_string(update) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Dropping {} update for record {}: {}", topic, update.record_id, e);
                return 0;
            }
        };

        let message = BusMessage {
            topic: topic.to_string(),
            payload,
        };
        match self.tx.send(message) {
            Ok(receivers) => receivers,
            Err(_) => {
                trace!("No live subscribers for {}", topic);
                0
            }
        }
    }
}
