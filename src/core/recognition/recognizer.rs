// src/core/recognition/recognizer.rs
use async_trait::async_trait;
use chrono::{DateTime, Local};
use std::sync::Arc;

use super::matcher::match_embedding;
use super::types::{FaceProbe, RecognitionResult};
use super::{RecognitionError, Result};
use crate::camera::{CameraId, Frame};
use crate::core::identity::registry::IdentityRegistry;

/// Face detection and embedding, supplied from outside the pipeline.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FaceRecognizer: Send + Sync {
    async fn detect(&self, frame: &Frame) -> Result<Vec<FaceProbe>>;
}

/// Turns frames into recognition results against the registry's current
/// snapshot.
pub struct RecognizerAdapter {
    recognizer: Arc<dyn FaceRecognizer>,
    registry: Arc<IdentityRegistry>,
    tolerance: f32,
}

impl RecognizerAdapter {
    pub fn new(
        recognizer: Arc<dyn FaceRecognizer>,
        registry: Arc<IdentityRegistry>,
        tolerance: f32,
    ) -> Self {
        Self {
            recognizer,
            registry,
            tolerance,
        }
    }

    pub async fn recognize(
        &self,
        camera_id: CameraId,
        frame: &Frame,
        captured_at: DateTime<Local>,
    ) -> Result<RecognitionResult> {
        if frame.is_empty() {
            return Err(RecognitionError::InvalidFrame("empty frame".to_string()));
        }

        let probes = self.recognizer.detect(frame).await?;

        // One snapshot for every probe of this frame, even if a reload lands
        // in the meantime.
        let snapshot = self.registry.current();
        let candidates = probes
            .iter()
            .map(|probe| match_embedding(&probe.embedding, &snapshot, self.tolerance))
            .collect();

        Ok(RecognitionResult {
            camera_id,
            captured_at,
            candidates,
        })
    }
}
