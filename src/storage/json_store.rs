// src/storage/json_store.rs
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::errors::{LoadError, StorageError};
use super::{AttendanceStore, ConfigStore};
use crate::camera::CameraConfig;
use crate::core::attendance::types::{AttendanceEvent, RecordId};
use crate::core::identity::types::{ContactInfo, IdentityId, IdentityRecord};

const CAMERAS_FILE: &str = "cameras.json";
const IDENTITIES_FILE: &str = "identities.json";
const CONTACTS_FILE: &str = "contacts.json";
const ATTENDANCE_FILE: &str = "attendance.jsonl";

#[derive(Debug, Serialize, Deserialize)]
struct AttendanceLine {
    record_id: RecordId,
    #[serde(flatten)]
    event: AttendanceEvent,
}

/// File-backed store rooted at a data directory.
///
/// Cameras, identities and contacts are JSON arrays maintained by the
/// enrolment side. Accepted attendance is appended to a JSON-lines log.
/// A missing camera or identity file reads as an empty set.
pub struct JsonFileStore {
    data_dir: PathBuf,
    // Last record id handed out, lazily recovered from the log.
    last_record_id: Mutex<Option<u64>>,
}

impl JsonFileStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            last_record_id: Mutex::new(None),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    async fn read_list<T: DeserializeOwned>(&self, file: &str) -> Result<Vec<T>, LoadError> {
        let path = self.data_dir.join(file);
        let raw = match fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("{} not found, treating as empty", path.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(LoadError::Unavailable(format!("{}: {}", path.display(), e))),
        };

        serde_json::from_str(&raw).map_err(|e| LoadError::InvalidFormat {
            source_name: file.to_string(),
            reason: e.to_string(),
        })
    }

    /// Scans the attendance log for the highest record id.
    ///
    /// Lines that do not parse, such as one torn by a crash mid-append, are
    /// skipped. The returned flag is set when the log does not end on a
    /// line boundary.
    async fn recover_last_record_id(&self) -> Result<(u64, bool), StorageError> {
        let path = self.data_dir.join(ATTENDANCE_FILE);
        let raw = match fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok((0, false)),
            Err(e) => return Err(e.into()),
        };

        let mut last = 0;
        for (n, line) in raw.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<AttendanceLine>(line) {
                Ok(parsed) => last = last.max(parsed.record_id.0),
                Err(e) => warn!("Skipping unreadable {} line {}: {}", ATTENDANCE_FILE, n + 1, e),
            }
        }
        Ok((last, !raw.is_empty() && !raw.ends_with('\n')))
    }
}

#[async_trait]
impl ConfigStore for JsonFileStore {
    async fn load_cameras(&self) -> Result<Vec<CameraConfig>, LoadError> {
        self.read_list(CAMERAS_FILE).await
    }

    async fn load_identities(&self) -> Result<Vec<IdentityRecord>, LoadError> {
        self.read_list(IDENTITIES_FILE).await
    }
}

#[async_trait]
impl AttendanceStore for JsonFileStore {
    async fn insert_attendance(&self, event: &AttendanceEvent) -> Result<RecordId, StorageError> {
        // Held across the append so ids and line order agree.
        let mut last = self.last_record_id.lock().await;
        let (previous, torn_tail) = match *last {
            Some(id) => (id, false),
            None => self.recover_last_record_id().await?,
        };
        let record_id = RecordId(previous + 1);

        let line = AttendanceLine {
            record_id,
            event: event.clone(),
        };
        let mut encoded = String::new();
        if torn_tail {
            encoded.push('\n');
        }
        encoded.push_str(
            &serde_json::to_string(&line).map_err(|e| StorageError::InvalidFormat(e.to_string()))?,
        );
        encoded.push('\n');

        fs::create_dir_all(&self.data_dir).await?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.data_dir.join(ATTENDANCE_FILE))
            .await?;
        file.write_all(encoded.as_bytes()).await?;
        file.flush().await?;

        *last = Some(record_id.0);
        Ok(record_id)
    }

    async fn lookup_identity_contact(
        &self,
        identity_id: IdentityId,
    ) -> Result<Option<ContactInfo>, StorageError> {
        let contacts: Vec<ContactInfo> = self
            .read_list(CONTACTS_FILE)
            .await
            .map_err(|e| StorageError::DatabaseError(e.to_string()))?;
        Ok(contacts.into_iter().find(|c| c.identity_id == identity_id))
    }
}
