// src/camera/frame_cache.rs
use chrono::{DateTime, Local};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use super::types::{CameraId, Frame};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameCacheEntry {
    pub frame: Frame,
    pub written_at: DateTime<Local>,
}

type Slot = RwLock<Option<FrameCacheEntry>>;

/// Latest frame per camera, shared between camera workers and viewers.
///
/// The outer map is only write-locked the first time a camera publishes;
/// after that each camera writes through its own slot, so cameras never
/// contend with each other and viewers only hold a slot lock long enough to
/// clone an `Arc`.
pub struct FrameCache {
    slots: RwLock<HashMap<CameraId, Arc<Slot>>>,
    ttl: Duration,
}

impl FrameCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            slots: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Stores `frame` unless the slot already holds a newer one.
    ///
    /// Returns whether the write was applied.
    pub fn put(&self, camera_id: CameraId, frame: Frame, timestamp: DateTime<Local>) -> bool {
        let slot = self.slot(camera_id);
        let mut entry = slot.write();
        match entry.as_ref() {
            Some(current) if timestamp < current.written_at => {
                tracing::debug!(
                    "Dropping out-of-order frame for camera {} ({} < {})",
                    camera_id,
                    timestamp,
                    current.written_at
                );
                false
            }
            _ => {
                *entry = Some(FrameCacheEntry {
                    frame,
                    written_at: timestamp,
                });
                true
            }
        }
    }

    pub fn get(&self, camera_id: CameraId) -> Option<FrameCacheEntry> {
        self.get_at(camera_id, Local::now())
    }

    /// Like [`get`](Self::get), judging staleness against `now`.
    pub fn get_at(&self, camera_id: CameraId, now: DateTime<Local>) -> Option<FrameCacheEntry> {
        let slot = self.slots.read().get(&camera_id).cloned()?;
        let entry = slot.read().clone()?;
        if self.is_expired(&entry, now) {
            return None;
        }
        Some(entry)
    }

    pub fn remove(&self, camera_id: CameraId) {
        self.slots.write().remove(&camera_id);
    }

    /// Drops expired entries; returns how many were evicted.
    pub fn evict_expired(&self) -> usize {
        let now = Local::now();
        let mut slots = self.slots.write();
        let before = slots.len();
        slots.retain(|_, slot| match slot.read().as_ref() {
            Some(entry) => !self.is_expired(entry, now),
            None => false,
        });
        before - slots.len()
    }

    pub fn cameras(&self) -> Vec<CameraId> {
        let mut ids: Vec<CameraId> = self.slots.read().keys().copied().collect();
        ids.sort();
        ids
    }

    fn slot(&self, camera_id: CameraId) -> Arc<Slot> {
        if let Some(slot) = self.slots.read().get(&camera_id) {
            return slot.clone();
        }
        self.slots
            .write()
            .entry(camera_id)
            .or_insert_with(|| Arc::new(RwLock::new(None)))
            .clone()
    }

    fn is_expired(&self, entry: &FrameCacheEntry, now: DateTime<Local>) -> bool {
        match (now - entry.written_at).to_std() {
            Ok(age) => age > self.ttl,
            // Written "in the future" relative to now: not stale.
            Err(_) => false,
        }
    }
}
