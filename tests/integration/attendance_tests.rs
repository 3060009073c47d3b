// tests/integration/attendance_tests.rs
use chrono::{DateTime, Local, TimeZone};
use std::sync::Arc;
use std::time::Duration;

use tokio_test::assert_err;

use crate::common::{contact, identity, RecordingNotifier};
use rollcall::{
    camera::CameraId,
    core::{
        attendance::{Admission, AttendanceRecorder, Classification, Deduplicator, EntryWindow},
        identity::{IdentityId, IdentityRegistry},
    },
    events::{AttendanceUpdate, BroadcastBus, ATTENDANCE_TOPIC},
    storage::MemoryStore,
    utils::metrics::PipelineMetrics,
};

fn at(hour: u32, minute: u32, second: u32) -> DateTime<Local> {
    Local.with_ymd_and_hms(2024, 9, 2, hour, minute, second).unwrap()
}

struct Fixture {
    dedup: Deduplicator,
    recorder: AttendanceRecorder,
    store: Arc<MemoryStore>,
    notifier: Arc<RecordingNotifier>,
    bus: Arc<BroadcastBus>,
}

async fn fixture() -> Fixture {
    let store = Arc::new(MemoryStore::new());
    store.set_identities(vec![identity(7, "A", &[0.1, 0.2, 0.3])]);
    store.set_contact(contact(7, "A"));

    let registry = Arc::new(IdentityRegistry::new(store.clone()));
    registry.load().await.unwrap();

    let notifier = Arc::new(RecordingNotifier::new());
    let bus = Arc::new(BroadcastBus::new(16));
    let recorder = AttendanceRecorder::new(
        store.clone(),
        notifier.clone(),
        bus.clone(),
        registry,
        Arc::new(PipelineMetrics::new()),
    );

    Fixture {
        dedup: Deduplicator::new(Duration::from_secs(30), EntryWindow::default()),
        recorder,
        store,
        notifier,
        bus,
    }
}

async fn submit(f: &Fixture, camera: u64, confidence: f32, ts: DateTime<Local>) -> Option<Classification> {
    match f.dedup.admit(IdentityId(7), CameraId(camera), confidence, ts) {
        Admission::Accept(event) => {
            f.recorder.record(&event).await.unwrap();
            Some(event.classification)
        }
        Admission::Reject(_) => None,
    }
}

#[test_log::test(tokio::test)]
async fn test_two_cameras_one_morning() {
    let f = fixture().await;
    let mut live = f.bus.subscribe();

    assert_eq!(submit(&f, 1, 0.9, at(8, 0, 0)).await, Some(Classification::Entry));
    assert_eq!(submit(&f, 2, 0.9, at(8, 0, 10)).await, None);
    assert_eq!(submit(&f, 1, 0.9, at(8, 0, 45)).await, Some(Classification::Entry));
    f.recorder.flush().await;

    let records = f.store.records();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].1.camera_id, CameraId(1));
    assert_eq!(records[1].1.detected_at, at(8, 0, 45));

    let sent = f.notifier.sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].0, IdentityId(7));

    let first = live.recv().await.unwrap();
    assert_eq!(first.topic, ATTENDANCE_TOPIC);
    let update: AttendanceUpdate = serde_json::from_str(&first.payload).unwrap();
    assert_eq!(update.name, "A");
    assert_eq!(update.roll_number, "R-7");
    assert_eq!(update.record_id, records[0].0);
}

#[test_log::test(tokio::test)]
async fn test_afternoon_sighting_is_exit() {
    let f = fixture().await;
    assert_eq!(submit(&f, 1, 0.8, at(14, 0, 0)).await, Some(Classification::Exit));
    f.recorder.flush().await;
    assert_eq!(f.notifier.sent()[0].1, Classification::Exit);
}

#[test_log::test(tokio::test)]
async fn test_storage_outage_surfaces_and_revoke_reopens() {
    let f = fixture().await;
    f.store.set_fail_inserts(true);

    let event = match f.dedup.admit(IdentityId(7), CameraId(1), 0.9, at(9, 0, 0)) {
        Admission::Accept(event) => event,
        Admission::Reject(reason) => panic!("unexpected rejection: {:?}", reason),
    };
    assert_err!(f.recorder.record(&event).await);
    assert!(f.dedup.revoke(IdentityId(7), event.detected_at));

    f.store.set_fail_inserts(false);
    assert_eq!(submit(&f, 2, 0.9, at(9, 0, 5)).await, Some(Classification::Entry));
    f.recorder.flush().await;

    assert_eq!(f.store.record_count(), 1);
    assert_eq!(f.notifier.sent().len(), 1);
}
