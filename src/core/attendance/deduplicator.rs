// src/core/attendance/deduplicator.rs
use chrono::{DateTime, Duration, Local, Timelike};
use parking_lot::Mutex;
use std::collections::HashMap;
use uuid::Uuid;

use super::types::{AttendanceEvent, Classification};
use crate::camera::CameraId;
use crate::core::identity::types::IdentityId;
use crate::utils::config::PipelineConfig;

const SHARD_COUNT: usize = 16;

/// Hours of the day (inclusive on both ends) that count as arrivals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryWindow {
    pub start_hour: u32,
    pub end_hour: u32,
}

impl EntryWindow {
    pub fn classify(&self, at: &DateTime<Local>) -> Classification {
        if (self.start_hour..=self.end_hour).contains(&at.hour()) {
            Classification::Entry
        } else {
            Classification::Exit
        }
    }
}

impl Default for EntryWindow {
    fn default() -> Self {
        Self {
            start_hour: 6,
            end_hour: 12,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Admission {
    Accept(AttendanceEvent),
    Reject(RejectReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    WithinCooldown { last_accepted: DateTime<Local> },
}

/// Cross-camera cooldown gate.
///
/// Cooldown state lives in identity-keyed shards. A decision holds its
/// shard's lock for the whole read-compare-write, so two cameras seeing the
/// same person can never both be accepted inside one window, while
/// decisions for identities in other shards proceed in parallel.
pub struct Deduplicator {
    cooldown: Duration,
    window: EntryWindow,
    shards: Vec<Mutex<HashMap<IdentityId, DateTime<Local>>>>,
}

impl Deduplicator {
    pub fn new(cooldown: std::time::Duration, window: EntryWindow) -> Self {
        let cooldown = Duration::from_std(cooldown).unwrap_or(Duration::MAX);
        Self {
            cooldown,
            window,
            shards: (0..SHARD_COUNT).map(|_| Mutex::new(HashMap::new())).collect(),
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(
            std::time::Duration::from_secs(config.cooldown_secs),
            EntryWindow {
                start_hour: config.entry_start_hour,
                end_hour: config.entry_end_hour,
            },
        )
    }

    pub fn admit(
        &self,
        identity_id: IdentityId,
        camera_id: CameraId,
        confidence: f32,
        timestamp: DateTime<Local>,
    ) -> Admission {
        {
            let mut last_seen = self.shard(identity_id).lock();
            if let Some(&last_accepted) = last_seen.get(&identity_id) {
                // Also rejects detections older than the accepted one.
                if timestamp - last_accepted <= self.cooldown {
                    return Admission::Reject(RejectReason::WithinCooldown { last_accepted });
                }
            }
            last_seen.insert(identity_id, timestamp);
        }

        Admission::Accept(AttendanceEvent {
            id: Uuid::new_v4(),
            identity_id,
            camera_id,
            classification: self.window.classify(&timestamp),
            confidence,
            detected_at: timestamp,
        })
    }

    /// Undoes an acceptance whose record could not be persisted.
    ///
    /// Only clears the entry if it still holds `accepted_at`; returns whether
    /// it did.
    pub fn revoke(&self, identity_id: IdentityId, accepted_at: DateTime<Local>) -> bool {
        let mut last_seen = self.shard(identity_id).lock();
        match last_seen.get(&identity_id) {
            Some(&last) if last == accepted_at => {
                last_seen.remove(&identity_id);
                true
            }
            _ => false,
        }
    }

    pub fn last_accepted(&self, identity_id: IdentityId) -> Option<DateTime<Local>> {
        self.shard(identity_id).lock().get(&identity_id).copied()
    }

    /// Forgets identities whose cooldown ended before `now`.
    pub fn prune(&self, now: DateTime<Local>) -> usize {
        let mut removed = 0;
        for shard in &self.shards {
            let mut last_seen = shard.lock();
            let before = last_seen.len();
            last_seen.retain(|_, last| now - *last <= self.cooldown);
            removed += before - last_seen.len();
        }
        removed
    }

    fn shard(&self, identity_id: IdentityId) -> &Mutex<HashMap<IdentityId, DateTime<Local>>> {
        &self.shards[(identity_id.0 % SHARD_COUNT as u64) as usize]
    }
}
