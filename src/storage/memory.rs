// src/storage/memory.rs
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use super::errors::{LoadError, StorageError};
use super::{AttendanceStore, ConfigStore};
use crate::camera::CameraConfig;
use crate::core::attendance::types::{AttendanceEvent, RecordId};
use crate::core::identity::types::{ContactInfo, IdentityId, IdentityRecord};

/// In-process store for embedding the pipeline and for tests.
///
/// Loads and inserts can be made to fail on demand to exercise the error
/// paths of the callers.
pub struct MemoryStore {
    cameras: RwLock<Vec<CameraConfig>>,
    identities: RwLock<Vec<IdentityRecord>>,
    contacts: RwLock<HashMap<IdentityId, ContactInfo>>,
    records: RwLock<Vec<(RecordId, AttendanceEvent)>>,
    next_record_id: AtomicU64,
    fail_loads: AtomicBool,
    fail_inserts: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            cameras: RwLock::new(Vec::new()),
            identities: RwLock::new(Vec::new()),
            contacts: RwLock::new(HashMap::new()),
            records: RwLock::new(Vec::new()),
            next_record_id: AtomicU64::new(1),
            fail_loads: AtomicBool::new(false),
            fail_inserts: AtomicBool::new(false),
        }
    }

    pub fn set_cameras(&self, cameras: Vec<CameraConfig>) {
        *self.cameras.write() = cameras;
    }

    pub fn set_identities(&self, identities: Vec<IdentityRecord>) {
        *self.identities.write() = identities;
    }

    pub fn set_contact(&self, contact: ContactInfo) {
        self.contacts.write().insert(contact.identity_id, contact);
    }

    pub fn set_fail_loads(&self, fail: bool) {
        self.fail_loads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_inserts(&self, fail: bool) {
        self.fail_inserts.store(fail, Ordering::SeqCst);
    }

    pub fn records(&self) -> Vec<(RecordId, AttendanceEvent)> {
        self.records.read().clone()
    }

    pub fn record_count(&self) -> usize {
        self.records.read().len()
    }

    fn check_loads(&self) -> Result<(), LoadError> {
        if self.fail_loads.load(Ordering::SeqCst) {
            return Err(LoadError::Unavailable("memory store loads disabled".to_string()));
        }
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConfigStore for MemoryStore {
    async fn load_cameras(&self) -> Result<Vec<CameraConfig>, LoadError> {
        self.check_loads()?;
        Ok(self.cameras.read().clone())
    }

    async fn load_identities(&self) -> Result<Vec<IdentityRecord>, LoadError> {
        self.check_loads()?;
        Ok(self.identities.read().clone())
    }
}

#[async_trait]
impl AttendanceStore for MemoryStore {
    async fn insert_attendance(&self, event: &AttendanceEvent) -> Result<RecordId, StorageError> {
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(StorageError::DatabaseError("memory store inserts disabled".to_string()));
        }
        let id = RecordId(self.next_record_id.fetch_add(1, Ordering::SeqCst));
        self.records.write().push((id, event.clone()));
        Ok(id)
    }

    async fn lookup_identity_contact(
        &self,
        identity_id: IdentityId,
    ) -> Result<Option<ContactInfo>, StorageError> {
        Ok(self.contacts.read().get(&identity_id).cloned())
    }
}
