// src/core/recognition/http.rs
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use super::recognizer::FaceRecognizer;
use super::types::FaceProbe;
use super::{RecognitionError, Result};
use crate::camera::Frame;

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    #[serde(default)]
    faces: Vec<FaceProbe>,
}

/// Recognizer backed by a face-embedding sidecar service.
///
/// Posts the JPEG bytes and expects
/// `{"faces": [{"bbox": {...}, "embedding": [...]}]}` back.
pub struct HttpRecognizer {
    http_client: reqwest::Client,
    endpoint: String,
}

impl HttpRecognizer {
    pub fn new(endpoint: String, timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RecognitionError::Backend(e.to_string()))?;

        Ok(Self {
            http_client,
            endpoint,
        })
    }
}

#[async_trait]
impl FaceRecognizer for HttpRecognizer {
    async fn detect(&self, frame: &Frame) -> Result<Vec<FaceProbe>> {
        let response = self
            .http_client
            .post(&self.endpoint)
            .header(reqwest::header::CONTENT_TYPE, "image/jpeg")
            .body(frame.bytes().to_vec())
            .send()
            .await
            .map_err(|e| RecognitionError::Backend(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(RecognitionError::Backend(format!(
                "HTTP {}: {}",
                status.as_u16(),
                error_text
            )));
        }

        let parsed: EmbedResponse = response
            .json()
            .await
            .map_err(|e| RecognitionError::InvalidResponse(e.to_string()))?;

        tracing::trace!(faces = parsed.faces.len(), "Embedding service response");
        Ok(parsed.faces)
    }
}
