// src/core/recognition/types.rs
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::camera::CameraId;
use crate::core::identity::types::IdentityId;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
    pub left: i32,
}

/// A face found in a frame, not yet matched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceProbe {
    pub bbox: BoundingBox,
    pub embedding: Vec<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    /// `None` when no enrolled identity is within tolerance.
    pub identity: Option<IdentityId>,
    pub confidence: f32,
}

impl Candidate {
    pub fn unknown() -> Self {
        Self {
            identity: None,
            confidence: 0.0,
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.identity.is_none()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecognitionResult {
    pub camera_id: CameraId,
    pub captured_at: DateTime<Local>,
    pub candidates: Vec<Candidate>,
}

impl RecognitionResult {
    /// Known identities whose confidence is strictly above `min_confidence`.
    pub fn recognized(&self, min_confidence: f32) -> impl Iterator<Item = (IdentityId, f32)> + '_ {
        self.candidates.iter().filter_map(move |c| match c.identity {
            Some(id) if c.confidence > min_confidence => Some((id, c.confidence)),
            _ => None,
        })
    }
}
