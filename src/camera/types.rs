// src/camera/types.rs
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use super::schedule::DetectionWindow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CameraId(pub u64);

impl fmt::Display for CameraId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraConfig {
    pub id: CameraId,
    pub name: String,
    pub stream_address: String,
    #[serde(default)]
    pub credentials: Option<Credentials>,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub schedule: Vec<DetectionWindow>,
}

impl CameraConfig {
    /// Username and password for HTTP basic auth, if any are configured.
    ///
    /// Credentials with an empty username are ignored.
    pub fn basic_auth(&self) -> Option<(&str, &str)> {
        self.credentials
            .as_ref()
            .filter(|c| !c.username.is_empty())
            .map(|c| (c.username.as_str(), c.password.as_str()))
    }
}

/// One encoded (JPEG) frame as read from a camera stream.
///
/// Cloning is cheap; the bytes are shared between the cache and the recognizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    data: Arc<[u8]>,
}

impl Frame {
    pub fn new(data: impl Into<Arc<[u8]>>) -> Self {
        Self { data: data.into() }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerState {
    Disconnected,
    Connecting,
    Streaming,
    Reconnecting,
    Stopped,
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkerState::Disconnected => "disconnected",
            WorkerState::Connecting => "connecting",
            WorkerState::Streaming => "streaming",
            WorkerState::Reconnecting => "reconnecting",
            WorkerState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}
