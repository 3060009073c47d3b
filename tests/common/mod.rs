// tests/common/mod.rs
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Local};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use rollcall::{
    camera::{
        CameraConfig, CameraId, ConnectionError, Frame, FrameStream, StreamConnector,
    },
    core::{
        attendance::Classification,
        identity::{ContactInfo, IdentityId, IdentityRecord},
        recognition::{BoundingBox, FaceProbe, FaceRecognizer, RecognitionError},
    },
    notify::{Notifier, NotifyError},
    storage::MemoryStore,
    utils::config::Config,
    Application, Components,
};

/// Opens streams that replay a per-camera frame list and then stay idle.
///
/// Cameras without a script fail to open.
#[derive(Default)]
pub struct FakeConnector {
    scripts: Mutex<HashMap<CameraId, Vec<Frame>>>,
    opened: Mutex<Vec<CameraId>>,
    closed: Arc<Mutex<Vec<CameraId>>>,
}

impl FakeConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(&self, camera_id: CameraId, frames: Vec<Frame>) {
        self.scripts.lock().insert(camera_id, frames);
    }

    pub fn opened(&self) -> Vec<CameraId> {
        self.opened.lock().clone()
    }

    pub fn closed(&self) -> Vec<CameraId> {
        self.closed.lock().clone()
    }
}

struct FakeStream {
    camera_id: CameraId,
    frames: VecDeque<Frame>,
    closed: Arc<Mutex<Vec<CameraId>>>,
}

#[async_trait]
impl FrameStream for FakeStream {
    async fn next_frame(&mut self) -> rollcall::camera::Result<Option<Frame>> {
        match self.frames.pop_front() {
            Some(frame) => Ok(Some(frame)),
            None => std::future::pending().await,
        }
    }

    async fn close(self: Box<Self>) {
        self.closed.lock().push(self.camera_id);
    }
}

#[async_trait]
impl StreamConnector for FakeConnector {
    async fn open(&self, camera: &CameraConfig) -> rollcall::camera::Result<Box<dyn FrameStream>> {
        self.opened.lock().push(camera.id);
        match self.scripts.lock().get(&camera.id) {
            Some(frames) => Ok(Box::new(FakeStream {
                camera_id: camera.id,
                frames: frames.clone().into(),
                closed: self.closed.clone(),
            })),
            None => Err(ConnectionError::Open {
                camera: camera.id,
                reason: "no route to host".to_string(),
            }),
        }
    }
}

/// Reads the first byte of a frame as a face tag and returns the embedding
/// registered for it. Unregistered tags mean no faces.
#[derive(Default)]
pub struct FakeRecognizer {
    faces: Mutex<HashMap<u8, Vec<f32>>>,
}

impl FakeRecognizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, tag: u8, embedding: Vec<f32>) {
        self.faces.lock().insert(tag, embedding);
    }
}

#[async_trait]
impl FaceRecognizer for FakeRecognizer {
    async fn detect(&self, frame: &Frame) -> Result<Vec<FaceProbe>, RecognitionError> {
        let tag = match frame.bytes().first() {
            Some(tag) => *tag,
            None => return Err(RecognitionError::InvalidFrame("empty".to_string())),
        };
        Ok(self
            .faces
            .lock()
            .get(&tag)
            .map(|embedding| {
                vec![FaceProbe {
                    bbox: BoundingBox {
                        top: 10,
                        right: 60,
                        bottom: 60,
                        left: 10,
                    },
                    embedding: embedding.clone(),
                }]
            })
            .unwrap_or_default())
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(IdentityId, Classification, DateTime<Local>)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<(IdentityId, Classification, DateTime<Local>)> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(
        &self,
        contact: &ContactInfo,
        classification: Classification,
        at: DateTime<Local>,
    ) -> Result<(), NotifyError> {
        self.sent.lock().push((contact.identity_id, classification, at));
        Ok(())
    }

    fn provider(&self) -> &'static str {
        "recording"
    }
}

pub fn identity(id: u64, name: &str, embedding: &[f32]) -> IdentityRecord {
    IdentityRecord {
        id: IdentityId(id),
        name: name.to_string(),
        roll_number: format!("R-{}", id),
        face_encoding: serde_json::to_string(embedding).unwrap(),
    }
}

pub fn contact(id: u64, name: &str) -> ContactInfo {
    ContactInfo {
        identity_id: IdentityId(id),
        name: name.to_string(),
        roll_number: format!("R-{}", id),
        guardian_name: Some("Guardian".to_string()),
        guardian_phone: Some("+15550100".to_string()),
    }
}

pub fn camera(id: u64, name: &str) -> CameraConfig {
    CameraConfig {
        id: CameraId(id),
        name: name.to_string(),
        stream_address: format!("http://cam{}.local/video", id),
        credentials: None,
        location: format!("Block {}", id),
        schedule: Vec::new(),
    }
}

/// A frame carrying `tag` as its face marker.
pub fn tagged_frame(tag: u8) -> Frame {
    Frame::new(vec![tag, 0xFF, 0xD8])
}

/// Defaults tuned for fast tests: every frame analyzed, no pacing, no
/// periodic refresh.
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.pipeline.analyze_every = 1;
    config.pipeline.capture_interval_ms = 0;
    config.pipeline.refresh_interval_secs = 0;
    config.reconnect.initial_delay_ms = 20;
    config.reconnect.max_delay_ms = 100;
    config
}

pub struct TestContext {
    pub app: Application,
    pub store: Arc<MemoryStore>,
    pub connector: Arc<FakeConnector>,
    pub recognizer: Arc<FakeRecognizer>,
    pub notifier: Arc<RecordingNotifier>,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: Config) -> Self {
        let store = Arc::new(MemoryStore::new());
        let connector = Arc::new(FakeConnector::new());
        let recognizer = Arc::new(FakeRecognizer::new());
        let notifier = Arc::new(RecordingNotifier::new());

        let app = Application::with_components(
            config,
            Components {
                config_store: store.clone(),
                attendance_store: store.clone(),
                connector: connector.clone(),
                recognizer: recognizer.clone(),
                notifier: notifier.clone(),
            },
        );

        Self {
            app,
            store,
            connector,
            recognizer,
            notifier,
        }
    }
}

/// Polls `check` until it holds or `timeout` elapses.
pub async fn eventually<F: Fn() -> bool>(timeout: Duration, check: F) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}
