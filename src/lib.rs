pub mod camera;
pub mod core;
pub mod events;
pub mod notify;
pub mod services;
pub mod storage;
pub mod utils;

use chrono::Local;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::{
    camera::{mjpeg::MjpegConnector, FrameCache, StreamConnector, WorkerContext},
    core::{
        attendance::{AttendanceRecorder, Deduplicator},
        identity::IdentityRegistry,
        recognition::{http::HttpRecognizer, FaceRecognizer, RecognizerAdapter},
    },
    events::{BroadcastBus, BusMessage},
    notify::{build_notifier, Notifier},
    services::{Orchestrator, ReconcileSummary, WorkerStatus},
    storage::{AttendanceStore, ConfigStore, JsonFileStore},
    utils::{config::Config, error::Result, metrics::PipelineMetrics, monitoring::Monitor},
};

const CAMERA_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// The external collaborators the pipeline runs against.
pub struct Components {
    pub config_store: Arc<dyn ConfigStore>,
    pub attendance_store: Arc<dyn AttendanceStore>,
    pub connector: Arc<dyn StreamConnector>,
    pub recognizer: Arc<dyn FaceRecognizer>,
    pub notifier: Arc<dyn Notifier>,
}

/// Pieces shared between the application handle and its refresh task.
#[derive(Clone)]
struct Pipeline {
    config_store: Arc<dyn ConfigStore>,
    registry: Arc<IdentityRegistry>,
    deduplicator: Arc<Deduplicator>,
    frame_cache: Arc<FrameCache>,
    orchestrator: Arc<Orchestrator>,
}

impl Pipeline {
    async fn refresh_identities(&self) -> Result<usize> {
        let snapshot = self.registry.load().await?;
        Ok(snapshot.len())
    }

    async fn refresh_cameras(&self) -> Result<ReconcileSummary> {
        let cameras = self.config_store.load_cameras().await?;
        Ok(self.orchestrator.reconcile(cameras).await)
    }

    async fn refresh(&self) {
        if let Err(e) = self.refresh_identities().await {
            warn!("Identity refresh failed: {}", e);
        }
        if let Err(e) = self.refresh_cameras().await {
            warn!("Camera refresh failed: {}", e);
        }

        let pruned = self.deduplicator.prune(Local::now());
        let evicted = self.frame_cache.evict_expired();
        debug!(pruned, evicted, "Housekeeping done");
    }
}

pub struct Application {
    config: Arc<Config>,
    pipeline: Pipeline,
    recorder: Arc<AttendanceRecorder>,
    bus: Arc<BroadcastBus>,
    metrics: Arc<PipelineMetrics>,
    shutdown_tx: watch::Sender<bool>,
    background: Mutex<Vec<JoinHandle<()>>>,
}

impl Application {
    pub async fn new(config: Config) -> Result<Self> {
        info!("Initializing storage at {}...", config.storage.data_dir);
        let store = Arc::new(JsonFileStore::new(&config.storage.data_dir));

        info!("Initializing camera connector...");
        let connector = Arc::new(MjpegConnector::new(CAMERA_CONNECT_TIMEOUT)?);

        info!("Initializing recognizer at {}...", config.recognizer.endpoint);
        let recognizer = Arc::new(HttpRecognizer::new(
            config.recognizer.endpoint.clone(),
            Duration::from_secs(config.recognizer.timeout_secs),
        )?);

        info!("Initializing notifier...");
        let notifier = build_notifier(&config.notifier)?;

        Ok(Self::with_components(
            config,
            Components {
                config_store: store.clone(),
                attendance_store: store,
                connector,
                recognizer,
                notifier,
            },
        ))
    }

    pub fn with_components(config: Config, components: Components) -> Self {
        let config = Arc::new(config);
        let metrics = Arc::new(PipelineMetrics::new());
        let bus = Arc::new(BroadcastBus::new(config.bus.capacity));
        let registry = Arc::new(IdentityRegistry::new(components.config_store.clone()));
        let deduplicator = Arc::new(Deduplicator::from_config(&config.pipeline));
        let frame_cache = Arc::new(FrameCache::new(config.frame_ttl()));

        let recorder = Arc::new(AttendanceRecorder::new(
            components.attendance_store,
            components.notifier,
            bus.clone(),
            registry.clone(),
            metrics.clone(),
        ));

        let ctx = WorkerContext {
            connector: components.connector,
            adapter: Arc::new(RecognizerAdapter::new(
                components.recognizer,
                registry.clone(),
                config.pipeline.tolerance,
            )),
            deduplicator: deduplicator.clone(),
            recorder: recorder.clone(),
            frame_cache: frame_cache.clone(),
            metrics: metrics.clone(),
            analyze_every: config.pipeline.analyze_every,
            min_confidence: config.pipeline.min_confidence,
            capture_interval: config.capture_interval(),
            reconnect: config.reconnect.clone(),
        };

        let (shutdown_tx, _) = watch::channel(false);

        Self {
            pipeline: Pipeline {
                config_store: components.config_store,
                registry,
                deduplicator,
                frame_cache,
                orchestrator: Arc::new(Orchestrator::new(ctx)),
            },
            config,
            recorder,
            bus,
            metrics,
            shutdown_tx,
            background: Mutex::new(Vec::new()),
        }
    }

    pub async fn start(&self) -> Result<()> {
        info!("Loading identities...");
        match self.pipeline.refresh_identities().await {
            Ok(count) => info!("{} identities enrolled", count),
            Err(e) => error!("Starting without identities: {}", e),
        }

        info!("Starting camera workers...");
        match self.pipeline.refresh_cameras().await {
            Ok(summary) => info!("{} camera workers started", summary.started),
            Err(e) => error!("Starting without cameras: {}", e),
        }

        let mut background = self.background.lock();

        if let Some(every) = self.config.refresh_interval() {
            info!("Refreshing cameras and identities every {:?}", every);
            background.push(self.spawn_refresh(every));
        }

        info!("Starting metrics monitor...");
        let monitor = Monitor::new(self.metrics.clone(), self.config.metrics_interval());
        background.push(monitor.start(self.shutdown_tx.subscribe()));

        info!("Application successfully started");
        Ok(())
    }

    fn spawn_refresh(&self, every: Duration) -> JoinHandle<()> {
        let pipeline = self.pipeline.clone();
        let mut shutdown = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            let mut ticker = interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // Startup already loaded everything once.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => pipeline.refresh().await,
                    _ = shutdown.changed() => break,
                }
            }
        })
    }

    /// Reloads enrolled identities; returns how many are active.
    pub async fn refresh_identities(&self) -> Result<usize> {
        self.pipeline.refresh_identities().await
    }

    /// Reloads the camera list and reconciles the running workers.
    pub async fn refresh_cameras(&self) -> Result<ReconcileSummary> {
        self.pipeline.refresh_cameras().await
    }

    pub fn frame_cache(&self) -> Arc<FrameCache> {
        self.pipeline.frame_cache.clone()
    }

    pub fn registry(&self) -> Arc<IdentityRegistry> {
        self.pipeline.registry.clone()
    }

    pub fn metrics(&self) -> Arc<PipelineMetrics> {
        self.metrics.clone()
    }

    /// Live attendance updates for viewers.
    pub fn subscribe(&self) -> broadcast::Receiver<BusMessage> {
        self.bus.subscribe()
    }

    pub async fn statuses(&self) -> Vec<WorkerStatus> {
        self.pipeline.orchestrator.statuses().await
    }

    pub async fn shutdown(&self) -> Result<()> {
        info!("Shutting down application...");
        self.shutdown_tx.send_replace(true);

        info!("Stopping camera workers...");
        self.pipeline.orchestrator.shutdown().await;

        info!("Waiting for pending notifications...");
        self.recorder.flush().await;

        let background: Vec<JoinHandle<()>> = std::mem::take(&mut *self.background.lock());
        for result in futures::future::join_all(background).await {
            if let Err(e) = result {
                warn!("Background task ended abnormally: {}", e);
            }
        }

        info!("Application shutdown complete");
        Ok(())
    }
}
