// src/camera/mjpeg.rs
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

use super::source::{FrameStream, StreamConnector};
use super::types::{CameraConfig, CameraId, Frame};
use super::{ConnectionError, Result};

const SOI: [u8; 2] = [0xFF, 0xD8];
const EOI: [u8; 2] = [0xFF, 0xD9];
const DEFAULT_MAX_FRAME_BYTES: usize = 8 * 1024 * 1024;

/// Connector for cameras exposing motion-JPEG over HTTP
/// (`multipart/x-mixed-replace`).
///
/// Frames are cut out of the byte stream on JPEG start/end markers, so part
/// headers and boundaries never need parsing.
pub struct MjpegConnector {
    client: reqwest::Client,
    max_frame_bytes: usize,
}

impl MjpegConnector {
    pub fn new(connect_timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| ConnectionError::Client(e.to_string()))?;

        Ok(Self {
            client,
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
        })
    }

    pub fn with_max_frame_bytes(mut self, max_frame_bytes: usize) -> Self {
        self.max_frame_bytes = max_frame_bytes;
        self
    }
}

#[async_trait]
impl StreamConnector for MjpegConnector {
    async fn open(&self, camera: &CameraConfig) -> Result<Box<dyn FrameStream>> {
        let address = camera.stream_address.as_str();
        if !(address.starts_with("http://") || address.starts_with("https://")) {
            return Err(ConnectionError::InvalidAddress(address.to_string()));
        }

        let mut request = self.client.get(address);
        if let Some((username, password)) = camera.basic_auth() {
            request = request.basic_auth(username, Some(password));
        }

        let response = request.send().await.map_err(|e| ConnectionError::Open {
            camera: camera.id,
            reason: e.to_string(),
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ConnectionError::Open {
                camera: camera.id,
                reason: format!("HTTP {}", status),
            });
        }

        debug!("Opened MJPEG stream for camera {} at {}", camera.id, address);
        Ok(Box::new(MjpegStream {
            camera_id: camera.id,
            response: Some(response),
            buffer: Vec::new(),
            max_frame_bytes: self.max_frame_bytes,
        }))
    }
}

struct MjpegStream {
    camera_id: CameraId,
    response: Option<reqwest::Response>,
    buffer: Vec<u8>,
    max_frame_bytes: usize,
}

#[async_trait]
impl FrameStream for MjpegStream {
    async fn next_frame(&mut self) -> Result<Option<Frame>> {
        loop {
            if let Some(jpeg) = extract_jpeg(&mut self.buffer) {
                return Ok(Some(Frame::new(jpeg)));
            }

            let response = match self.response.as_mut() {
                Some(response) => response,
                None => return Ok(None),
            };

            match response.chunk().await {
                Ok(Some(chunk)) => {
                    self.buffer.extend_from_slice(&chunk);
                    if self.buffer.len() > self.max_frame_bytes {
                        return Err(ConnectionError::Read(format!(
                            "camera {} sent {} bytes without a complete frame",
                            self.camera_id,
                            self.buffer.len()
                        )));
                    }
                }
                Ok(None) => {
                    self.response = None;
                    return Ok(None);
                }
                Err(e) => return Err(ConnectionError::Read(e.to_string())),
            }
        }
    }

    async fn close(self: Box<Self>) {
        // Dropping the response closes the connection.
        debug!("Closed MJPEG stream for camera {}", self.camera_id);
    }
}

fn find_marker(haystack: &[u8], marker: [u8; 2], from: usize) -> Option<usize> {
    if haystack.len() < from + 2 {
        return None;
    }
    haystack[from..]
        .windows(2)
        .position(|w| w == marker)
        .map(|pos| pos + from)
}

/// Removes and returns the first complete JPEG in `buffer`, discarding any
/// bytes before it.
fn extract_jpeg(buffer: &mut Vec<u8>) -> Option<Vec<u8>> {
    let start = match find_marker(buffer, SOI, 0) {
        Some(start) => start,
        None => {
            // A trailing 0xFF may be the first half of a marker.
            let keep = usize::from(buffer.last() == Some(&0xFF));
            let drop = buffer.len() - keep;
            buffer.drain(..drop);
            return None;
        }
    };

    match find_marker(buffer, EOI, start + 2) {
        Some(end) => {
            let jpeg = buffer[start..end + 2].to_vec();
            buffer.drain(..end + 2);
            Some(jpeg)
        }
        None => {
            buffer.drain(..start);
            None
        }
    }
}
