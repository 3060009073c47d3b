// src/camera/source.rs
use async_trait::async_trait;

use super::types::{CameraConfig, Frame};
use super::Result;

/// An open connection to one camera.
#[async_trait]
pub trait FrameStream: Send {
    /// Next encoded frame; `Ok(None)` once the stream has ended.
    async fn next_frame(&mut self) -> Result<Option<Frame>>;

    /// Releases the underlying connection.
    async fn close(self: Box<Self>);
}

/// Opens streams for cameras; one connector is shared by all workers.
#[async_trait]
pub trait StreamConnector: Send + Sync {
    async fn open(&self, camera: &CameraConfig) -> Result<Box<dyn FrameStream>>;
}
