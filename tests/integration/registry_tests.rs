// tests/integration/registry_tests.rs
use chrono::Local;
use std::sync::Arc;
use tempfile::TempDir;

use tokio_test::assert_err;

use crate::common::{tagged_frame, FakeRecognizer};
use rollcall::{
    camera::CameraId,
    core::{
        identity::{IdentityId, IdentityRegistry},
        recognition::RecognizerAdapter,
    },
    storage::{ConfigStore, JsonFileStore},
};

const IDENTITIES: &str = r#"[
    {"id": 1, "name": "Asha", "roll_number": "12", "face_encoding": "[0.10, 0.20, 0.30]"},
    {"id": 2, "name": "Ravi", "roll_number": "13", "face_encoding": "not an embedding"},
    {"id": 3, "name": "Lena", "roll_number": "14", "face_encoding": "[0.70, 0.70, 0.70]"}
]"#;

#[test_log::test(tokio::test)]
async fn test_file_backed_registry_feeds_recognition() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("identities.json"), IDENTITIES).unwrap();

    let store = Arc::new(JsonFileStore::new(dir.path()));
    let registry = Arc::new(IdentityRegistry::new(store.clone()));
    let snapshot = registry.load().await.unwrap();
    assert_eq!(snapshot.len(), 2);
    assert!(snapshot.get(IdentityId(2)).is_none());

    let recognizer = Arc::new(FakeRecognizer::new());
    recognizer.register(1, vec![0.1, 0.2, 0.35]);
    recognizer.register(2, vec![5.0, 5.0, 5.0]);
    let adapter = RecognizerAdapter::new(recognizer, registry.clone(), 0.6);

    let result = adapter
        .recognize(CameraId(1), &tagged_frame(1), Local::now())
        .await
        .unwrap();
    let recognized: Vec<(IdentityId, f32)> = result.recognized(0.6).collect();
    assert_eq!(recognized.len(), 1);
    assert_eq!(recognized[0].0, IdentityId(1));
    assert!(recognized[0].1 > 0.9);

    let stranger = adapter
        .recognize(CameraId(1), &tagged_frame(2), Local::now())
        .await
        .unwrap();
    assert_eq!(stranger.candidates.len(), 1);
    assert!(stranger.candidates[0].is_unknown());
    assert_eq!(stranger.recognized(0.6).count(), 0);
}

#[test_log::test(tokio::test)]
async fn test_reload_from_rewritten_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("identities.json");
    std::fs::write(&path, IDENTITIES).unwrap();

    let store = Arc::new(JsonFileStore::new(dir.path()));
    let registry = IdentityRegistry::new(store.clone());
    let first = registry.load().await.unwrap();

    std::fs::write(
        &path,
        r#"[{"id": 9, "name": "New", "roll_number": "99", "face_encoding": "[0.4, 0.4, 0.4]"}]"#,
    )
    .unwrap();
    let second = registry.load().await.unwrap();

    assert_eq!(first.len(), 2);
    assert_eq!(second.len(), 1);
    assert!(second.generation() > first.generation());
    assert_eq!(registry.current().generation(), second.generation());

    // A corrupt file leaves the last good snapshot in place.
    std::fs::write(&path, "[{").unwrap();
    assert_err!(registry.load().await);
    assert!(registry.current().get(IdentityId(9)).is_some());
    assert!(store.load_cameras().await.unwrap().is_empty());
}
