//! Normalized update and asset model
//!
//! An [`Update`] is produced once per manifest resolution, or once per stored
//! row load. Identity fields are immutable; only the status, access time,
//! launch counters and keep flag change afterwards, and only by the launcher.
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`asset`] | Asset model and content-key helpers |
//! | [`status`] | Lifecycle status with stable persisted codes |

pub mod asset;
pub mod status;

pub use asset::{content_hash, Asset};
pub use status::UpdateStatus;

use std::borrow::Cow;
use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::protocol::{filters, ManifestError};
use crate::store::{AssetStore, StoreError};

/// Where an update's asset list comes from.
#[derive(Clone)]
pub enum AssetSource {
    /// Produced directly by a manifest adapter.
    Manifest(Vec<Asset>),
    /// Fetched from the persistence layer on each access.
    Stored(Arc<dyn AssetStore>),
}

impl std::fmt::Debug for AssetSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetSource::Manifest(assets) => f.debug_tuple("Manifest").field(assets).finish(),
            AssetSource::Stored(store) => f.debug_tuple("Stored").field(&store.name()).finish(),
        }
    }
}

/// Fields an adapter supplies to build an [`Update`].
#[derive(Debug, Clone)]
pub struct UpdateParts {
    pub update_id: Uuid,
    pub scope_key: String,
    pub commit_time: DateTime<Utc>,
    pub runtime_version: String,
    pub manifest: Value,
    pub status: UpdateStatus,
    pub is_development_mode: bool,
    pub assets: Vec<Asset>,
    pub server_defined_headers: Option<Map<String, Value>>,
    pub manifest_filters: Option<Map<String, Value>>,
}

/// A resolved, versioned set of assets that can replace the shipped code.
#[derive(Debug, Clone)]
pub struct Update {
    update_id: Uuid,
    scope_key: String,
    commit_time: DateTime<Utc>,
    runtime_version: String,
    manifest: Value,
    status: UpdateStatus,
    is_development_mode: bool,
    keep: bool,
    last_accessed: DateTime<Utc>,
    successful_launch_count: u32,
    failed_launch_count: u32,
    server_defined_headers: Option<Map<String, Value>>,
    manifest_filters: Option<Map<String, Value>>,
    assets: AssetSource,
}

impl Update {
    /// Build a manifest-sourced update, enforcing the asset list invariants.
    pub fn from_parts(parts: UpdateParts) -> Result<Self, ManifestError> {
        if parts.scope_key.is_empty() {
            return Err(ManifestError::MissingScopeKey { hint: None });
        }
        validate_assets(&parts.assets)?;

        Ok(Self {
            update_id: parts.update_id,
            scope_key: parts.scope_key,
            commit_time: parts.commit_time,
            runtime_version: parts.runtime_version,
            manifest: parts.manifest,
            status: parts.status,
            is_development_mode: parts.is_development_mode,
            keep: true,
            last_accessed: Utc::now(),
            successful_launch_count: 0,
            failed_launch_count: 0,
            server_defined_headers: parts.server_defined_headers,
            manifest_filters: parts.manifest_filters,
            assets: AssetSource::Manifest(parts.assets),
        })
    }

    /// Rebuild an update from its stored row; assets load lazily from `store`.
    pub fn from_record(
        record: StoredUpdateRecord,
        store: Arc<dyn AssetStore>,
    ) -> Result<Self, StoreError> {
        let status = UpdateStatus::try_from(record.status).map_err(StoreError::InvalidRecord)?;
        if record.scope_key.is_empty() {
            return Err(StoreError::InvalidRecord(format!(
                "update {} has an empty scope key",
                record.id
            )));
        }

        Ok(Self {
            update_id: record.id,
            scope_key: record.scope_key,
            commit_time: record.commit_time,
            runtime_version: record.runtime_version,
            manifest: record.manifest,
            status,
            is_development_mode: status == UpdateStatus::Development,
            keep: record.keep,
            last_accessed: record.last_accessed,
            successful_launch_count: record.successful_launch_count,
            failed_launch_count: record.failed_launch_count,
            server_defined_headers: None,
            manifest_filters: None,
            assets: AssetSource::Stored(store),
        })
    }

    /// Durable row for the persistence layer. Assets are stored separately.
    pub fn to_record(&self) -> StoredUpdateRecord {
        StoredUpdateRecord {
            id: self.update_id,
            scope_key: self.scope_key.clone(),
            commit_time: self.commit_time,
            runtime_version: self.runtime_version.clone(),
            manifest: self.manifest.clone(),
            status: self.status.code(),
            keep: self.keep,
            last_accessed: self.last_accessed,
            successful_launch_count: self.successful_launch_count,
            failed_launch_count: self.failed_launch_count,
        }
    }

    pub fn update_id(&self) -> Uuid {
        self.update_id
    }

    pub fn scope_key(&self) -> &str {
        &self.scope_key
    }

    pub fn commit_time(&self) -> DateTime<Utc> {
        self.commit_time
    }

    pub fn runtime_version(&self) -> &str {
        &self.runtime_version
    }

    /// Raw manifest JSON the update was resolved from.
    pub fn manifest(&self) -> &Value {
        &self.manifest
    }

    pub fn status(&self) -> UpdateStatus {
        self.status
    }

    pub fn is_development_mode(&self) -> bool {
        self.is_development_mode
    }

    pub fn keep(&self) -> bool {
        self.keep
    }

    pub fn last_accessed(&self) -> DateTime<Utc> {
        self.last_accessed
    }

    pub fn successful_launch_count(&self) -> u32 {
        self.successful_launch_count
    }

    pub fn failed_launch_count(&self) -> u32 {
        self.failed_launch_count
    }

    pub fn server_defined_headers(&self) -> Option<&Map<String, Value>> {
        self.server_defined_headers.as_ref()
    }

    pub fn manifest_filters(&self) -> Option<&Map<String, Value>> {
        self.manifest_filters.as_ref()
    }

    pub fn asset_source(&self) -> &AssetSource {
        &self.assets
    }

    /// Asset list: borrowed when manifest-sourced, otherwise fetched from
    /// the store. The store fetch blocks the calling thread.
    pub fn assets(&self) -> Result<Cow<'_, [Asset]>, StoreError> {
        match &self.assets {
            AssetSource::Manifest(assets) => Ok(Cow::Borrowed(assets.as_slice())),
            AssetSource::Stored(store) => {
                tracing::debug!(
                    update_id = %self.update_id,
                    store = store.name(),
                    "loading assets from store"
                );
                store.assets_for_update(self.update_id).map(Cow::Owned)
            }
        }
    }

    pub fn launch_asset(&self) -> Result<Option<Asset>, StoreError> {
        Ok(self.assets()?.iter().find(|a| a.is_launch_asset).cloned())
    }

    /// Check the parsed manifest filters against the manifest `metadata`.
    pub fn matches_manifest_filters(&self) -> bool {
        filters::matches(self.manifest_filters.as_ref(), self.manifest.get("metadata"))
    }

    pub fn set_status(&mut self, status: UpdateStatus) {
        self.status = status;
    }

    pub fn set_keep(&mut self, keep: bool) {
        self.keep = keep;
    }

    /// Count a launch attempt and refresh the access time.
    pub fn record_launch(&mut self, succeeded: bool) {
        if succeeded {
            self.successful_launch_count = self.successful_launch_count.saturating_add(1);
        } else {
            self.failed_launch_count = self.failed_launch_count.saturating_add(1);
        }
        self.last_accessed = Utc::now();
    }
}

/// Durable form of an [`Update`], one row per update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredUpdateRecord {
    pub id: Uuid,
    pub scope_key: String,
    pub commit_time: DateTime<Utc>,
    pub runtime_version: String,
    pub manifest: Value,
    /// Raw status code; see [`UpdateStatus::code`].
    pub status: i64,
    pub keep: bool,
    pub last_accessed: DateTime<Utc>,
    pub successful_launch_count: u32,
    pub failed_launch_count: u32,
}

fn validate_assets(assets: &[Asset]) -> Result<(), ManifestError> {
    let launch_assets = assets.iter().filter(|a| a.is_launch_asset).count();
    if launch_assets != 1 {
        return Err(ManifestError::InvalidAssetList(format!(
            "expected exactly one launch asset, found {}",
            launch_assets
        )));
    }

    let mut seen = HashSet::new();
    for key in assets.iter().filter_map(Asset::key) {
        if key.is_empty() {
            return Err(ManifestError::InvalidAssetList(
                "asset key must not be empty".to_string(),
            ));
        }
        if !seen.insert(key) {
            return Err(ManifestError::InvalidAssetList(format!(
                "duplicate asset key '{}'",
                key
            )));
        }
    }
    Ok(())
}
