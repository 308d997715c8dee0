//! Persistence handle for lazily loaded asset lists
//!
//! The durable store (schema, migrations, query lane) lives outside this
//! crate. [`AssetStore`] is the seam it plugs into; [`MemoryStore`] is the
//! in-process implementation used for tests and for hosts without a database.

use std::collections::HashMap;
use std::sync::Mutex;

use uuid::Uuid;

use crate::update::Asset;

/// Persistence layer error
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    #[error("No update {0} in store")]
    UpdateNotFound(Uuid),

    #[error("Invalid stored row: {0}")]
    InvalidRecord(String),

    #[error("Store backend error ({backend}): {message}")]
    Backend {
        backend: &'static str,
        message: String,
    },
}

/// Source of asset lists for updates reconstructed from storage.
///
/// Implementations serialize access through a single lane; callers must
/// treat [`assets_for_update`](AssetStore::assets_for_update) as blocking.
pub trait AssetStore: Send + Sync {
    fn assets_for_update(&self, update_id: Uuid) -> Result<Vec<Asset>, StoreError>;
    fn name(&self) -> &'static str;
}

/// In-memory asset store; a single mutex is the query lane.
#[derive(Default)]
pub struct MemoryStore {
    assets: Mutex<HashMap<Uuid, Vec<Asset>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_assets(&self, update_id: Uuid, assets: Vec<Asset>) -> Result<(), StoreError> {
        let mut guard = self.assets.lock().map_err(|e| StoreError::Backend {
            backend: self.name(),
            message: format!("lock poisoned while inserting {}: {}", update_id, e),
        })?;
        guard.insert(update_id, assets);
        Ok(())
    }

    pub fn remove(&self, update_id: Uuid) -> Result<bool, StoreError> {
        let mut guard = self.assets.lock().map_err(|e| StoreError::Backend {
            backend: self.name(),
            message: format!("lock poisoned while removing {}: {}", update_id, e),
        })?;
        Ok(guard.remove(&update_id).is_some())
    }
}

impl AssetStore for MemoryStore {
    fn assets_for_update(&self, update_id: Uuid) -> Result<Vec<Asset>, StoreError> {
        let guard = self.assets.lock().map_err(|e| StoreError::Backend {
            backend: self.name(),
            message: format!("lock poisoned while reading {}: {}", update_id, e),
        })?;
        guard
            .get(&update_id)
            .cloned()
            .ok_or(StoreError::UpdateNotFound(update_id))
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
