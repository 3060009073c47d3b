// src/camera/mod.rs
use thiserror::Error;

pub mod backoff;
pub mod frame_cache;
pub mod mjpeg;
pub mod schedule;
pub mod source;
pub mod types;
pub mod worker;

pub use frame_cache::{FrameCache, FrameCacheEntry};
pub use source::{FrameStream, StreamConnector};
pub use types::{CameraConfig, CameraId, Credentials, Frame, WorkerState};
pub use worker::{CameraWorker, WorkerContext};

#[derive(Error, Debug)]
pub enum ConnectionError {
    #[error("Failed to open stream for camera {camera}: {reason}")]
    Open { camera: CameraId, reason: String },
    #[error("Stream read failed: {0}")]
    Read(String),
    #[error("Invalid stream address: {0}")]
    InvalidAddress(String),
    #[error("HTTP client error: {0}")]
    Client(String),
}

pub type Result<T> = std::result::Result<T, ConnectionError>;
