// src/camera/worker.rs
use chrono::Local;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use super::backoff::Backoff;
use super::frame_cache::FrameCache;
use super::schedule::detection_enabled;
use super::source::{FrameStream, StreamConnector};
use super::types::{CameraConfig, Frame, WorkerState};
use super::ConnectionError;
use crate::core::attendance::{Admission, AttendanceRecorder, Deduplicator};
use crate::core::recognition::RecognizerAdapter;
use crate::utils::config::ReconnectConfig;
use crate::utils::metrics::PipelineMetrics;

/// Everything a worker shares with the rest of the pipeline.
#[derive(Clone)]
pub struct WorkerContext {
    pub connector: Arc<dyn StreamConnector>,
    pub adapter: Arc<RecognizerAdapter>,
    pub deduplicator: Arc<Deduplicator>,
    pub recorder: Arc<AttendanceRecorder>,
    pub frame_cache: Arc<FrameCache>,
    pub metrics: Arc<PipelineMetrics>,
    pub analyze_every: u64,
    pub min_confidence: f32,
    pub capture_interval: Option<Duration>,
    pub reconnect: ReconnectConfig,
}

enum StreamEnd {
    Shutdown,
    Ended,
    Failed(ConnectionError),
}

/// Owns one camera's connection for the life of the process.
///
/// Open and read failures move the worker to `Reconnecting` and it retries
/// with capped exponential backoff until told to stop. Nothing that goes
/// wrong for this camera is returned to the caller.
pub struct CameraWorker {
    camera: CameraConfig,
    ctx: WorkerContext,
    shutdown: watch::Receiver<bool>,
    state: watch::Sender<WorkerState>,
    backoff: Backoff,
    frame_count: u64,
}

impl CameraWorker {
    pub fn new(
        camera: CameraConfig,
        ctx: WorkerContext,
        shutdown: watch::Receiver<bool>,
        state: watch::Sender<WorkerState>,
    ) -> Self {
        let backoff = Backoff::from_config(&ctx.reconnect);
        Self {
            camera,
            ctx,
            shutdown,
            state,
            backoff,
            frame_count: 0,
        }
    }

    pub async fn run(mut self) {
        info!(camera = %self.camera.id, "Starting worker for {} ({})", self.camera.name, self.camera.location);

        while !*self.shutdown.borrow() {
            self.set_state(WorkerState::Connecting);

            let opened = tokio::select! {
                _ = wait_for_shutdown(&mut self.shutdown) => break,
                opened = self.ctx.connector.open(&self.camera) => opened,
            };

            match opened {
                Ok(mut stream) => {
                    info!(camera = %self.camera.id, "Stream opened");
                    self.set_state(WorkerState::Streaming);

                    let end = self.stream_frames(stream.as_mut()).await;
                    stream.close().await;

                    match end {
                        StreamEnd::Shutdown => break,
                        StreamEnd::Ended => {
                            warn!(camera = %self.camera.id, "Stream ended");
                        }
                        StreamEnd::Failed(e) => {
                            self.ctx.metrics.record_connection_failure();
                            warn!(camera = %self.camera.id, "Stream read failed: {}", e);
                        }
                    }
                }
                Err(e) => {
                    self.ctx.metrics.record_connection_failure();
                    warn!(camera = %self.camera.id, "Failed to open stream: {}", e);
                }
            }

            if !self.wait_before_reconnect().await {
                break;
            }
        }

        self.set_state(WorkerState::Stopped);
        info!(camera = %self.camera.id, "Worker stopped");
    }

    async fn stream_frames(&mut self, stream: &mut dyn FrameStream) -> StreamEnd {
        loop {
            let next = tokio::select! {
                _ = wait_for_shutdown(&mut self.shutdown) => return StreamEnd::Shutdown,
                next = stream.next_frame() => next,
            };

            match next {
                Ok(Some(frame)) => {
                    if self.backoff.attempts() > 0 {
                        debug!(camera = %self.camera.id, "Receiving frames again, resetting backoff");
                        self.backoff.reset();
                    }
                    self.handle_frame(frame).await;
                }
                Ok(None) => return StreamEnd::Ended,
                Err(e) => return StreamEnd::Failed(e),
            }

            if let Some(interval) = self.ctx.capture_interval {
                tokio::select! {
                    _ = wait_for_shutdown(&mut self.shutdown) => return StreamEnd::Shutdown,
                    _ = tokio::time::sleep(interval) => {}
                }
            }
        }
    }

    async fn handle_frame(&mut self, frame: Frame) {
        let captured_at = Local::now();
        self.frame_count += 1;

        // Cached before recognition so viewers stay live while it runs.
        self.ctx
            .frame_cache
            .put(self.camera.id, frame.clone(), captured_at);

        let analyze = self.frame_count % self.ctx.analyze_every.max(1) == 0
            && detection_enabled(&self.camera.schedule, &captured_at);
        self.ctx.metrics.record_frame(analyze);
        if !analyze {
            return;
        }

        let result = match self
            .ctx
            .adapter
            .recognize(self.camera.id, &frame, captured_at)
            .await
        {
            Ok(result) => result,
            Err(e) => {
                self.ctx.metrics.record_recognition_failure();
                warn!(camera = %self.camera.id, "Recognition failed: {}", e);
                return;
            }
        };

        for (identity_id, confidence) in result.recognized(self.ctx.min_confidence) {
            let admission =
                self.ctx
                    .deduplicator
                    .admit(identity_id, self.camera.id, confidence, captured_at);

            match admission {
                Admission::Accept(event) => {
                    self.ctx.metrics.record_admission(true);
                    if let Err(e) = self.ctx.recorder.record(&event).await {
                        // Let a later sighting record the visit instead.
                        self.ctx.deduplicator.revoke(identity_id, event.detected_at);
                        error!(
                            camera = %self.camera.id,
                            identity = %identity_id,
                            "Dropping attendance event: {}",
                            e
                        );
                    }
                }
                Admission::Reject(reason) => {
                    self.ctx.metrics.record_admission(false);
                    debug!(
                        camera = %self.camera.id,
                        identity = %identity_id,
                        "Detection rejected: {:?}",
                        reason
                    );
                }
            }
        }
    }

    /// Sleeps out the backoff delay. Returns false if shutdown arrived first.
    async fn wait_before_reconnect(&mut self) -> bool {
        self.set_state(WorkerState::Reconnecting);
        let delay = self.backoff.next_delay();
        debug!(
            camera = %self.camera.id,
            attempt = self.backoff.attempts(),
            "Reconnecting in {:?}",
            delay
        );

        tokio::select! {
            _ = wait_for_shutdown(&mut self.shutdown) => false,
            _ = tokio::time::sleep(delay) => true,
        }
    }

    fn set_state(&self, state: WorkerState) {
        self.state.send_replace(state);
    }
}

/// Resolves once shutdown is signalled or the signalling side is gone.
async fn wait_for_shutdown(shutdown: &mut watch::Receiver<bool>) {
    while !*shutdown.borrow_and_update() {
        if shutdown.changed().await.is_err() {
            return;
        }
    }
}
