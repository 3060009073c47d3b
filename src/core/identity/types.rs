// src/core/identity/types.rs
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::warn;

use crate::storage::errors::LoadError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityId(pub u64);

impl fmt::Display for IdentityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct KnownIdentity {
    pub id: IdentityId,
    pub name: String,
    pub roll_number: String,
    pub embedding: Vec<f32>,
}

/// An enrolled identity as held by the configuration store, embedding still
/// in its stored JSON text form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentityRecord {
    pub id: IdentityId,
    pub name: String,
    pub roll_number: String,
    pub face_encoding: String,
}

impl IdentityRecord {
    pub fn into_identity(self) -> Result<KnownIdentity, LoadError> {
        let embedding: Vec<f32> = serde_json::from_str(&self.face_encoding)
            .map_err(|e| LoadError::Embedding {
                id: self.id,
                reason: e.to_string(),
            })?;

        if embedding.is_empty() {
            return Err(LoadError::Embedding {
                id: self.id,
                reason: "embedding is empty".to_string(),
            });
        }
        if embedding.iter().any(|v| !v.is_finite()) {
            return Err(LoadError::Embedding {
                id: self.id,
                reason: "embedding contains non-finite values".to_string(),
            });
        }

        Ok(KnownIdentity {
            id: self.id,
            name: self.name,
            roll_number: self.roll_number,
            embedding,
        })
    }
}

/// Who to tell about an identity's attendance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub identity_id: IdentityId,
    pub name: String,
    pub roll_number: String,
    #[serde(default)]
    pub guardian_name: Option<String>,
    #[serde(default)]
    pub guardian_phone: Option<String>,
}

/// Immutable view of the enrolled identities at one load generation.
#[derive(Debug, Default)]
pub struct IdentitySnapshot {
    generation: u64,
    identities: Vec<KnownIdentity>,
    index: HashMap<IdentityId, usize>,
}

impl IdentitySnapshot {
    /// Builds a snapshot; a repeated id keeps its first occurrence.
    pub fn new(generation: u64, identities: Vec<KnownIdentity>) -> Self {
        let mut kept = Vec::with_capacity(identities.len());
        let mut index = HashMap::with_capacity(identities.len());

        for identity in identities {
            if index.contains_key(&identity.id) {
                warn!("Duplicate identity {} ignored", identity.id);
                continue;
            }
            index.insert(identity.id, kept.len());
            kept.push(identity);
        }

        Self {
            generation,
            identities: kept,
            index,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn get(&self, id: IdentityId) -> Option<&KnownIdentity> {
        self.index.get(&id).map(|&i| &self.identities[i])
    }

    /// Identities in load order.
    pub fn iter(&self) -> impl Iterator<Item = &KnownIdentity> {
        self.identities.iter()
    }

    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }
}
