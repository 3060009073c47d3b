// tests/integration/pipeline_tests.rs
use std::time::Duration;

use tokio_test::assert_err;

use crate::common::{camera, contact, eventually, identity, tagged_frame, TestContext};
use rollcall::{
    camera::{CameraId, WorkerState},
    core::identity::IdentityId,
    events::{AttendanceUpdate, ATTENDANCE_TOPIC},
};

const WAIT: Duration = Duration::from_secs(5);

#[test_log::test(tokio::test)]
async fn test_end_to_end_single_record_across_cameras() {
    let ctx = TestContext::new();
    ctx.store.set_identities(vec![
        identity(7, "A", &[0.1, 0.2, 0.3]),
        identity(8, "B", &[0.9, 0.8, 0.7]),
    ]);
    ctx.store.set_contact(contact(7, "A"));
    ctx.store.set_cameras(vec![camera(1, "Gate"), camera(2, "Hall")]);

    ctx.recognizer.register(1, vec![0.1, 0.2, 0.3]);
    ctx.connector.script(CameraId(1), vec![tagged_frame(1), tagged_frame(0)]);
    ctx.connector.script(CameraId(2), vec![tagged_frame(1), tagged_frame(1)]);

    let mut live = ctx.app.subscribe();
    ctx.app.start().await.unwrap();

    let store = ctx.store.clone();
    assert!(eventually(WAIT, || store.record_count() >= 1).await);
    tokio::time::sleep(Duration::from_millis(100)).await;

    // Both cameras saw A inside one cooldown window.
    let records = ctx.store.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].1.identity_id, IdentityId(7));

    let message = tokio::time::timeout(WAIT, live.recv()).await.unwrap().unwrap();
    assert_eq!(message.topic, ATTENDANCE_TOPIC);
    let update: AttendanceUpdate = serde_json::from_str(&message.payload).unwrap();
    assert_eq!(update.name, "A");

    let notifier = ctx.notifier.clone();
    assert!(eventually(WAIT, || notifier.sent().len() == 1).await);

    let cache = ctx.app.frame_cache();
    assert!(cache.get(CameraId(1)).is_some());
    assert!(cache.get(CameraId(2)).is_some());

    let metrics = ctx.app.metrics().snapshot();
    assert_eq!(metrics.frames_captured, 4);
    assert_eq!(metrics.admissions_accepted, 1);
    assert_eq!(metrics.admissions_rejected, 2);

    ctx.app.shutdown().await.unwrap();
    let mut closed = ctx.connector.closed();
    closed.sort();
    assert_eq!(closed, vec![CameraId(1), CameraId(2)]);
}

#[test_log::test(tokio::test)]
async fn test_no_identities_means_no_records() {
    let ctx = TestContext::new();
    ctx.store.set_cameras(vec![camera(1, "Gate")]);
    ctx.recognizer.register(1, vec![0.1, 0.2, 0.3]);
    ctx.connector
        .script(CameraId(1), vec![tagged_frame(1), tagged_frame(1), tagged_frame(1)]);

    ctx.app.start().await.unwrap();

    let app_metrics = ctx.app.metrics();
    assert!(eventually(WAIT, || app_metrics.snapshot().frames_analyzed == 3).await);
    assert_eq!(ctx.store.record_count(), 0);
    assert_eq!(app_metrics.snapshot().admissions_accepted, 0);

    ctx.app.shutdown().await.unwrap();
}

#[test_log::test(tokio::test)]
async fn test_unreachable_camera_keeps_retrying_without_hurting_others() {
    let ctx = TestContext::new();
    ctx.store.set_cameras(vec![camera(1, "Gate"), camera(2, "Broken")]);
    ctx.connector.script(CameraId(1), vec![tagged_frame(0)]);

    ctx.app.start().await.unwrap();

    let connector = ctx.connector.clone();
    assert!(
        eventually(WAIT, || {
            connector.opened().iter().filter(|id| **id == CameraId(2)).count() >= 3
        })
        .await
    );

    let statuses = ctx.app.statuses().await;
    assert_eq!(statuses.len(), 2);
    assert_eq!(statuses[0].state, WorkerState::Streaming);
    assert_ne!(statuses[1].state, WorkerState::Streaming);
    assert!(ctx.app.metrics().snapshot().connection_failures >= 3);

    ctx.app.shutdown().await.unwrap();
    let statuses = ctx.app.statuses().await;
    assert!(statuses.is_empty());
}

#[test_log::test(tokio::test)]
async fn test_refresh_picks_up_new_identities_and_cameras() {
    let ctx = TestContext::new();
    ctx.app.start().await.unwrap();
    assert!(ctx.app.statuses().await.is_empty());
    assert!(ctx.app.registry().current().is_empty());

    ctx.store.set_identities(vec![identity(3, "C", &[0.5, 0.5])]);
    ctx.store.set_cameras(vec![camera(5, "Library")]);
    ctx.connector.script(CameraId(5), vec![tagged_frame(9)]);
    ctx.recognizer.register(9, vec![0.5, 0.52]);

    assert_eq!(ctx.app.refresh_identities().await.unwrap(), 1);
    let summary = ctx.app.refresh_cameras().await.unwrap();
    assert_eq!(summary.started, 1);

    let store = ctx.store.clone();
    assert!(eventually(WAIT, || store.record_count() == 1).await);
    assert_eq!(ctx.store.records()[0].1.identity_id, IdentityId(3));

    ctx.store.set_cameras(Vec::new());
    let summary = ctx.app.refresh_cameras().await.unwrap();
    assert_eq!(summary.stopped, 1);
    assert!(ctx.app.frame_cache().get(CameraId(5)).is_none());

    ctx.app.shutdown().await.unwrap();
}

#[test_log::test(tokio::test)]
async fn test_failed_identity_refresh_keeps_snapshot() {
    let ctx = TestContext::new();
    ctx.store.set_identities(vec![identity(1, "A", &[0.1])]);
    ctx.app.start().await.unwrap();

    ctx.store.set_fail_loads(true);
    assert_err!(ctx.app.refresh_identities().await);
    assert_err!(ctx.app.refresh_cameras().await);
    assert_eq!(ctx.app.registry().current().len(), 1);

    ctx.app.shutdown().await.unwrap();
}
