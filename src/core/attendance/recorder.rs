// src/core/attendance/recorder.rs
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::types::{AttendanceEvent, RecordId};
use crate::core::identity::IdentityRegistry;
use crate::events::{AttendanceUpdate, LiveBus, ATTENDANCE_TOPIC};
use crate::notify::{Notifier, NotifyError};
use crate::storage::{AttendanceStore, StorageError};
use crate::utils::metrics::PipelineMetrics;

/// Persists accepted events, then fans them out to the live bus and the
/// guardian notifier.
///
/// Only persistence can fail `record`. Notification runs on its own task
/// so a slow SMS provider never holds up the camera that produced the
/// event.
pub struct AttendanceRecorder {
    store: Arc<dyn AttendanceStore>,
    notifier: Arc<dyn Notifier>,
    bus: Arc<dyn LiveBus>,
    registry: Arc<IdentityRegistry>,
    metrics: Arc<PipelineMetrics>,
    pending: Mutex<Vec<JoinHandle<()>>>,
}

impl AttendanceRecorder {
    pub fn new(
        store: Arc<dyn AttendanceStore>,
        notifier: Arc<dyn Notifier>,
        bus: Arc<dyn LiveBus>,
        registry: Arc<IdentityRegistry>,
        metrics: Arc<PipelineMetrics>,
    ) -> Self {
        Self {
            store,
            notifier,
            bus,
            registry,
            metrics,
            pending: Mutex::new(Vec::new()),
        }
    }

    pub async fn record(&self, event: &AttendanceEvent) -> Result<RecordId, StorageError> {
        let record_id = match self.store.insert_attendance(event).await {
            Ok(id) => id,
            Err(e) => {
                self.metrics.record_persistence(false);
                error!(
                    camera = %event.camera_id,
                    identity = %event.identity_id,
                    "Failed to persist attendance: {}",
                    e
                );
                return Err(e);
            }
        };
        self.metrics.record_persistence(true);

        info!(
            camera = %event.camera_id,
            identity = %event.identity_id,
            record = %record_id,
            "Recorded {} at {}",
            event.classification,
            event.detected_at.format("%H:%M:%S")
        );

        self.publish(record_id, event);
        self.spawn_notification(event);

        Ok(record_id)
    }

    /// Waits for notifications still in flight.
    pub async fn flush(&self) {
        let handles: Vec<JoinHandle<()>> = std::mem::take(&mut *self.pending.lock());
        for handle in futures::future::join_all(handles).await {
            if let Err(e) = handle {
                warn!("Notification task ended abnormally: {}", e);
            }
        }
    }

    fn publish(&self, record_id: RecordId, event: &AttendanceEvent) {
        let snapshot = self.registry.current();
        let (name, roll_number) = match snapshot.get(event.identity_id) {
            Some(identity) => (identity.name.clone(), identity.roll_number.clone()),
            None => (String::new(), String::new()),
        };

        let update = AttendanceUpdate {
            record_id,
            identity_id: event.identity_id,
            name,
            roll_number,
            camera_id: event.camera_id,
            classification: event.classification,
            confidence: event.confidence,
            timestamp: event.detected_at,
        };
        let receivers = self.bus.publish(ATTENDANCE_TOPIC, &update);
        debug!(record = %record_id, receivers, "Published live update");
    }

    fn spawn_notification(&self, event: &AttendanceEvent) {
        let store = self.store.clone();
        let notifier = self.notifier.clone();
        let metrics = self.metrics.clone();
        let event = event.clone();

        let handle = tokio::spawn(async move {
            let contact = match store.lookup_identity_contact(event.identity_id).await {
                Ok(Some(contact)) => contact,
                Ok(None) => {
                    debug!(identity = %event.identity_id, "No contact on file, skipping notification");
                    return;
                }
                Err(e) => {
                    metrics.record_notification_failure();
                    warn!(identity = %event.identity_id, "Contact lookup failed: {}", e);
                    return;
                }
            };

            match notifier
                .notify(&contact, event.classification, event.detected_at)
                .await
            {
                Ok(()) => {}
                Err(NotifyError::MissingPhone(name)) => {
                    debug!(identity = %event.identity_id, "No guardian phone for {}", name);
                }
                Err(e) => {
                    metrics.record_notification_failure();
                    warn!(
                        identity = %event.identity_id,
                        provider = notifier.provider(),
                        "Notification failed: {}",
                        e
                    );
                }
            }
        });

        let mut pending = self.pending.lock();
        pending.retain(|h| !h.is_finished());
        pending.push(handle);
    }
}
