// src/services/orchestrator.rs
use futures::future::join_all;
use std::collections::{HashMap, HashSet};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::camera::{CameraConfig, CameraId, CameraWorker, WorkerContext, WorkerState};

struct WorkerHandle {
    config: CameraConfig,
    shutdown: watch::Sender<bool>,
    state: watch::Receiver<WorkerState>,
    task: JoinHandle<()>,
}

impl WorkerHandle {
    fn signal_stop(&self) {
        self.shutdown.send_replace(true);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerStatus {
    pub camera_id: CameraId,
    pub name: String,
    pub location: String,
    pub state: WorkerState,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    pub started: usize,
    pub stopped: usize,
    pub restarted: usize,
    pub unchanged: usize,
}

#[derive(Default)]
struct Workers {
    running: HashMap<CameraId, WorkerHandle>,
    closed: bool,
}

/// Runs one `CameraWorker` task per configured camera.
pub struct Orchestrator {
    ctx: WorkerContext,
    workers: Mutex<Workers>,
}

impl Orchestrator {
    pub fn new(ctx: WorkerContext) -> Self {
        Self {
            ctx,
            workers: Mutex::new(Workers::default()),
        }
    }

    /// Brings the running worker set in line with `cameras`.
    ///
    /// New cameras get a worker, cameras no longer listed are stopped and
    /// their cached frame dropped, and cameras whose configuration changed
    /// are restarted. Workers for unchanged cameras keep their connection.
    pub async fn reconcile(&self, cameras: Vec<CameraConfig>) -> ReconcileSummary {
        let mut workers = self.workers.lock().await;
        let mut summary = ReconcileSummary::default();
        if workers.closed {
            warn!("Ignoring camera reconcile after shutdown");
            return summary;
        }

        let mut desired: HashMap<CameraId, CameraConfig> = HashMap::with_capacity(cameras.len());
        for camera in cameras {
            if desired.contains_key(&camera.id) {
                warn!(camera = %camera.id, "Duplicate camera id in configuration, keeping the first");
                continue;
            }
            desired.insert(camera.id, camera);
        }

        let mut stopping = Vec::new();
        let mut removed = Vec::new();
        let current: HashSet<CameraId> = workers.running.keys().copied().collect();
        for id in current {
            let replace = match (desired.get(&id), workers.running.get(&id)) {
                (None, _) => {
                    summary.stopped += 1;
                    removed.push(id);
                    info!(camera = %id, "Camera removed, stopping worker");
                    true
                }
                (Some(config), Some(handle)) if *config != handle.config => {
                    summary.restarted += 1;
                    info!(camera = %id, "Camera configuration changed, restarting worker");
                    true
                }
                (Some(_), Some(handle)) if handle.task.is_finished() => {
                    summary.restarted += 1;
                    warn!(camera = %id, "Worker exited unexpectedly, restarting");
                    true
                }
                _ => false,
            };

            if replace {
                if let Some(handle) = workers.running.remove(&id) {
                    handle.signal_stop();
                    stopping.push(handle);
                }
            }
        }

        // Old connections are released before replacements open.
        Self::join(stopping).await;
        for id in removed {
            self.ctx.frame_cache.remove(id);
        }

        for (id, config) in desired {
            if workers.running.contains_key(&id) {
                summary.unchanged += 1;
                continue;
            }
            let handle = self.spawn_worker(config);
            workers.running.insert(id, handle);
        }
        summary.started = workers.running.len() - summary.unchanged - summary.restarted;

        info!(
            started = summary.started,
            stopped = summary.stopped,
            restarted = summary.restarted,
            unchanged = summary.unchanged,
            "Reconciled camera workers"
        );
        summary
    }

    pub async fn statuses(&self) -> Vec<WorkerStatus> {
        let workers = self.workers.lock().await;
        let mut statuses: Vec<WorkerStatus> = workers
            .running
            .iter()
            .map(|(id, handle)| WorkerStatus {
                camera_id: *id,
                name: handle.config.name.clone(),
                location: handle.config.location.clone(),
                state: *handle.state.borrow(),
            })
            .collect();
        statuses.sort_by_key(|s| s.camera_id);
        statuses
    }

    pub async fn worker_count(&self) -> usize {
        self.workers.lock().await.running.len()
    }

    /// Stops every worker and waits for each to release its stream.
    pub async fn shutdown(&self) {
        let handles: Vec<WorkerHandle> = {
            let mut workers = self.workers.lock().await;
            workers.closed = true;
            workers.running.drain().map(|(_, handle)| handle).collect()
        };

        info!("Stopping {} camera workers", handles.len());
        for handle in &handles {
            handle.signal_stop();
        }
        Self::join(handles).await;
    }

    fn spawn_worker(&self, config: CameraConfig) -> WorkerHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (state_tx, state_rx) = watch::channel(WorkerState::Disconnected);
        let worker = CameraWorker::new(config.clone(), self.ctx.clone(), shutdown_rx, state_tx);

        WorkerHandle {
            config,
            shutdown: shutdown_tx,
            state: state_rx,
            task: tokio::spawn(worker.run()),
        }
    }

    async fn join(handles: Vec<WorkerHandle>) {
        let tasks = handles.into_iter().map(|h| {
            let id = h.config.id;
            async move { (id, h.task.await) }
        });
        for (id, result) in join_all(tasks).await {
            if let Err(e) = result {
                warn!(camera = %id, "Worker task ended abnormally: {}", e);
            }
        }
    }
}
