// tests/integration/orchestrator_tests.rs
use std::sync::Arc;
use std::time::Duration;

use crate::common::{camera, eventually, tagged_frame, FakeConnector, FakeRecognizer, RecordingNotifier};
use rollcall::{
    camera::{CameraId, FrameCache, WorkerContext, WorkerState},
    core::{
        attendance::{AttendanceRecorder, Deduplicator, EntryWindow},
        identity::IdentityRegistry,
        recognition::RecognizerAdapter,
    },
    events::BroadcastBus,
    services::Orchestrator,
    storage::MemoryStore,
    utils::{config::ReconnectConfig, metrics::PipelineMetrics},
};

const WAIT: Duration = Duration::from_secs(5);

fn orchestrator(connector: Arc<FakeConnector>) -> (Orchestrator, Arc<FrameCache>) {
    let store = Arc::new(MemoryStore::new());
    let registry = Arc::new(IdentityRegistry::new(store.clone()));
    let metrics = Arc::new(PipelineMetrics::new());
    let frame_cache = Arc::new(FrameCache::new(Duration::from_secs(60)));

    let ctx = WorkerContext {
        connector,
        adapter: Arc::new(RecognizerAdapter::new(
            Arc::new(FakeRecognizer::new()),
            registry.clone(),
            0.6,
        )),
        deduplicator: Arc::new(Deduplicator::new(Duration::from_secs(30), EntryWindow::default())),
        recorder: Arc::new(AttendanceRecorder::new(
            store,
            Arc::new(RecordingNotifier::new()),
            Arc::new(BroadcastBus::new(8)),
            registry,
            metrics.clone(),
        )),
        frame_cache: frame_cache.clone(),
        metrics,
        analyze_every: 5,
        min_confidence: 0.6,
        capture_interval: None,
        reconnect: ReconnectConfig {
            initial_delay_ms: 20,
            max_delay_ms: 200,
            multiplier: 2.0,
        },
    };

    (Orchestrator::new(ctx), frame_cache)
}

fn opens_of(connector: &FakeConnector, id: u64) -> usize {
    connector
        .opened()
        .iter()
        .filter(|c| **c == CameraId(id))
        .count()
}

#[test_log::test(tokio::test)]
async fn test_reconcile_adds_removes_and_keeps() {
    let connector = Arc::new(FakeConnector::new());
    for id in 1..=3 {
        connector.script(CameraId(id), vec![tagged_frame(0)]);
    }
    let (orchestrator, cache) = orchestrator(connector.clone());

    let summary = orchestrator
        .reconcile(vec![camera(1, "Gate"), camera(2, "Hall")])
        .await;
    assert_eq!(summary.started, 2);

    let probe = connector.clone();
    assert!(eventually(WAIT, || probe.opened().len() == 2).await);
    assert!(eventually(WAIT, || cache.get(CameraId(2)).is_some()).await);

    let summary = orchestrator
        .reconcile(vec![camera(1, "Gate"), camera(3, "Lab")])
        .await;
    assert_eq!(summary.started, 1);
    assert_eq!(summary.stopped, 1);
    assert_eq!(summary.unchanged, 1);

    assert_eq!(connector.closed(), vec![CameraId(2)]);
    assert!(cache.get(CameraId(2)).is_none());

    let ids: Vec<CameraId> = orchestrator
        .statuses()
        .await
        .into_iter()
        .map(|s| s.camera_id)
        .collect();
    assert_eq!(ids, vec![CameraId(1), CameraId(3)]);

    // Camera 1 kept its first connection.
    assert_eq!(opens_of(&connector, 1), 1);

    orchestrator.shutdown().await;
}

#[test_log::test(tokio::test)]
async fn test_changed_config_restarts_worker() {
    let connector = Arc::new(FakeConnector::new());
    connector.script(CameraId(1), vec![tagged_frame(0)]);
    let (orchestrator, _cache) = orchestrator(connector.clone());

    orchestrator.reconcile(vec![camera(1, "Gate")]).await;
    let probe = connector.clone();
    assert!(eventually(WAIT, || opens_of(&probe, 1) == 1).await);

    let mut moved = camera(1, "Gate");
    moved.stream_address = "http://cam1-new.local/video".to_string();
    let summary = orchestrator.reconcile(vec![moved]).await;
    assert_eq!(summary.restarted, 1);
    assert_eq!(summary.started, 0);

    assert!(eventually(WAIT, || opens_of(&probe, 1) == 2).await);
    assert_eq!(connector.closed(), vec![CameraId(1)]);

    orchestrator.shutdown().await;
}

#[test_log::test(tokio::test)]
async fn test_shutdown_stops_streaming_and_retrying_workers() {
    let connector = Arc::new(FakeConnector::new());
    connector.script(CameraId(1), vec![tagged_frame(0)]);
    let (orchestrator, _cache) = orchestrator(connector.clone());

    orchestrator
        .reconcile(vec![camera(1, "Gate"), camera(2, "Offline")])
        .await;

    let probe = connector.clone();
    assert!(eventually(WAIT, || opens_of(&probe, 2) >= 2).await);

    let statuses = orchestrator.statuses().await;
    assert_eq!(statuses[0].state, WorkerState::Streaming);
    assert_eq!(statuses[1].name, "Offline");

    tokio::time::timeout(WAIT, orchestrator.shutdown())
        .await
        .expect("shutdown completes promptly");

    assert_eq!(connector.closed(), vec![CameraId(1)]);
    assert_eq!(orchestrator.worker_count().await, 0);

    // A late refresh must not revive workers.
    let summary = orchestrator.reconcile(vec![camera(1, "Gate")]).await;
    assert_eq!(summary.started, 0);
    assert_eq!(orchestrator.worker_count().await, 0);
}

#[test_log::test(tokio::test)]
async fn test_duplicate_camera_ids_start_one_worker() {
    let connector = Arc::new(FakeConnector::new());
    connector.script(CameraId(4), vec![tagged_frame(0)]);
    let (orchestrator, _cache) = orchestrator(connector.clone());

    let summary = orchestrator
        .reconcile(vec![camera(4, "Front"), camera(4, "Front again")])
        .await;
    assert_eq!(summary.started, 1);

    let statuses = orchestrator.statuses().await;
    assert_eq!(statuses.len(), 1);
    assert_eq!(statuses[0].name, "Front");

    orchestrator.shutdown().await;
}
