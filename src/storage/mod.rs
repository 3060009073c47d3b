// src/storage/mod.rs
use async_trait::async_trait;

pub mod errors;
pub mod json_store;
pub mod memory;

pub use errors::{LoadError, StorageError};
pub use json_store::JsonFileStore;
pub use memory::MemoryStore;

use crate::camera::CameraConfig;
use crate::core::attendance::types::{AttendanceEvent, RecordId};
use crate::core::identity::types::{ContactInfo, IdentityId, IdentityRecord};

/// Source of the camera set and the enrolled identities.
///
/// Both loads are idempotent and may run while workers are streaming.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConfigStore: Send + Sync {
    async fn load_cameras(&self) -> Result<Vec<CameraConfig>, LoadError>;
    async fn load_identities(&self) -> Result<Vec<IdentityRecord>, LoadError>;
}

/// Persistence for accepted attendance events.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AttendanceStore: Send + Sync {
    async fn insert_attendance(&self, event: &AttendanceEvent) -> Result<RecordId, StorageError>;
    async fn lookup_identity_contact(
        &self,
        identity_id: IdentityId,
    ) -> Result<Option<ContactInfo>, StorageError>;
}
