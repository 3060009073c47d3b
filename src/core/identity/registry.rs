// src/core/identity/registry.rs
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use tracing::{info, warn};

use super::types::{IdentitySnapshot, KnownIdentity};
use crate::storage::errors::LoadError;
use crate::storage::ConfigStore;

/// Holds the active identity snapshot and swaps it wholesale on reload.
pub struct IdentityRegistry {
    store: Arc<dyn ConfigStore>,
    current: RwLock<Arc<IdentitySnapshot>>,
    next_generation: Mutex<u64>,
}

impl IdentityRegistry {
    pub fn new(store: Arc<dyn ConfigStore>) -> Self {
        Self {
            store,
            current: RwLock::new(Arc::new(IdentitySnapshot::empty())),
            next_generation: Mutex::new(1),
        }
    }

    /// The active snapshot. Callers keep using it even if a reload swaps in
    /// a newer one.
    pub fn current(&self) -> Arc<IdentitySnapshot> {
        self.current.read().clone()
    }

    /// Reads identities from the store and installs them as a new snapshot.
    ///
    /// Identities with unusable embeddings are skipped. On error the
    /// previous snapshot stays active.
    pub async fn load(&self) -> Result<Arc<IdentitySnapshot>, LoadError> {
        let records = match self.store.load_identities().await {
            Ok(records) => records,
            Err(e) => {
                warn!(
                    "Failed to load identities, keeping generation {}: {}",
                    self.current().generation(),
                    e
                );
                return Err(e);
            }
        };

        let total = records.len();
        let mut identities: Vec<KnownIdentity> = Vec::with_capacity(total);
        let mut dimension: Option<usize> = None;

        for record in records {
            let name = record.name.clone();
            let identity = match record.into_identity() {
                Ok(identity) => identity,
                Err(e) => {
                    warn!("Skipping identity {}: {}", name, e);
                    continue;
                }
            };

            match dimension {
                Some(dim) if dim != identity.embedding.len() => {
                    warn!(
                        "Skipping identity {} ({}): embedding has {} values, expected {}",
                        identity.id,
                        identity.name,
                        identity.embedding.len(),
                        dim
                    );
                    continue;
                }
                Some(_) => {}
                None => dimension = Some(identity.embedding.len()),
            }

            identities.push(identity);
        }

        let generation = {
            let mut next = self.next_generation.lock();
            let generation = *next;
            *next += 1;
            generation
        };
        let snapshot = Arc::new(IdentitySnapshot::new(generation, identities));

        {
            let mut current = self.current.write();
            // A slower, older load must not replace a newer snapshot.
            if current.generation() < generation {
                *current = snapshot.clone();
            }
        }

        info!(
            "Loaded {} of {} identities (generation {})",
            snapshot.len(),
            total,
            generation
        );
        Ok(snapshot)
    }
}
