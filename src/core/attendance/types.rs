// src/core/attendance/types.rs
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::camera::CameraId;
use crate::core::identity::types::IdentityId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub u64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    Entry,
    Exit,
}

impl Classification {
    /// Past-tense verb used in notifications.
    pub fn verb(&self) -> &'static str {
        match self {
            Classification::Entry => "entered",
            Classification::Exit => "left",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Classification::Entry => f.write_str("entry"),
            Classification::Exit => f.write_str("exit"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceEvent {
    pub id: Uuid,
    pub identity_id: IdentityId,
    pub camera_id: CameraId,
    pub classification: Classification,
    pub confidence: f32,
    pub detected_at: DateTime<Local>,
}
