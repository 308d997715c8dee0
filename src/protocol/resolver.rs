//! Update resolution entry points
//!
//! [`UpdateResolver`] turns a received manifest into an [`Update`]. Protocol
//! responses go through [`resolve`](UpdateResolver::resolve), which picks the
//! adapter from the negotiated protocol version and never falls back to the
//! legacy format. Legacy manifests, from the embedded bundle or a legacy
//! server, go through [`resolve_legacy`](UpdateResolver::resolve_legacy) and
//! [`resolve_legacy_body`](UpdateResolver::resolve_legacy_body).

use std::sync::Arc;

use serde_json::Value;

use super::body::{extract_legacy_manifest, extract_manifest};
use super::error::ManifestError;
use super::legacy::LegacyManifest;
use super::manifest::{require_scope_key, Manifest, ProtocolVersion};
use super::response::{ManifestExtensions, ResponseHeaderData};
use crate::config::UpdatesConfig;
use crate::store::{AssetStore, MemoryStore, StoreError};
use crate::update::{StoredUpdateRecord, Update};

/// Resolves manifests against one static configuration and persistence handle.
#[derive(Clone)]
pub struct UpdateResolver {
    config: UpdatesConfig,
    store: Arc<dyn AssetStore>,
    enforce_manifest_filters: bool,
}

impl UpdateResolver {
    /// Create a resolver backed by an in-memory store.
    pub fn new(config: UpdatesConfig) -> Self {
        Self {
            config,
            store: Arc::new(MemoryStore::new()),
            enforce_manifest_filters: false,
        }
    }

    /// Use `store` for assets of updates loaded from persistence.
    pub fn with_store(mut self, store: Arc<dyn AssetStore>) -> Self {
        self.store = store;
        self
    }

    /// Reject protocol updates whose manifest `metadata` fails the
    /// response's manifest filters. Off by default; the caller's selection
    /// policy usually decides.
    pub fn with_manifest_filter_check(mut self, enforce: bool) -> Self {
        self.enforce_manifest_filters = enforce;
        self
    }

    pub fn config(&self) -> &UpdatesConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn AssetStore> {
        &self.store
    }

    /// Resolve a protocol manifest object.
    ///
    /// Fails when the protocol version is absent or unknown, when no scope
    /// key is configured, or when a required manifest field is missing or
    /// malformed. Unparseable structured headers are logged and dropped.
    /// With [`with_manifest_filter_check`](Self::with_manifest_filter_check)
    /// an update that fails its manifest filters is rejected too.
    pub fn resolve(
        &self,
        manifest: Value,
        response: &ResponseHeaderData,
        extensions: &ManifestExtensions,
    ) -> Result<Update, ManifestError> {
        let version = ProtocolVersion::from_response(response.protocol_version)?;
        require_scope_key(&self.config)?;

        tracing::debug!(
            protocol_version = version.as_i64(),
            format = %version.manifest_format(),
            "selected manifest adapter"
        );
        let update = version
            .parse_manifest(manifest)?
            .into_update(response, extensions, &self.config)?;

        if self.enforce_manifest_filters && !update.matches_manifest_filters() {
            tracing::warn!(update_id = %update.update_id(), "update rejected by manifest filters");
            return Err(ManifestError::MismatchedManifestFilters {
                update_id: update.update_id(),
            });
        }
        Ok(update)
    }

    /// Resolve a raw protocol response body, unwrapping a signed envelope
    /// first. Multi-manifest arrays are rejected; see
    /// [`resolve_legacy_body`](Self::resolve_legacy_body).
    pub fn resolve_body(
        &self,
        body: &[u8],
        response: &ResponseHeaderData,
        extensions: &ManifestExtensions,
    ) -> Result<Update, ManifestError> {
        let manifest = extract_manifest(body)?;
        self.resolve(manifest, response, extensions)
    }

    /// Resolve a legacy-format manifest, as shipped in the embedded bundle.
    pub fn resolve_legacy(&self, manifest: Value) -> Result<Update, ManifestError> {
        require_scope_key(&self.config)?;
        Manifest::Legacy(LegacyManifest::from_json(manifest)?).into_update(
            &ResponseHeaderData::default(),
            &ManifestExtensions::default(),
            &self.config,
        )
    }

    /// Resolve a raw legacy response body. A multi-manifest array yields the
    /// first entry whose `sdkVersion` is configured as supported.
    pub fn resolve_legacy_body(&self, body: &[u8]) -> Result<Update, ManifestError> {
        let manifest = extract_legacy_manifest(body, &self.config)?;
        self.resolve_legacy(manifest)
    }

    /// Rebuild a persisted update; its assets load lazily from the store.
    pub fn load_stored(&self, record: StoredUpdateRecord) -> Result<Update, StoreError> {
        Update::from_record(record, Arc::clone(&self.store))
    }
}

impl std::fmt::Debug for UpdateResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdateResolver")
            .field("config", &self.config)
            .field("store", &self.store.name())
            .field("enforce_manifest_filters", &self.enforce_manifest_filters)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::update::{Asset, UpdateStatus};
    use serde_json::json;
    use url::Url;

    fn resolver() -> UpdateResolver {
        UpdateResolver::new(
            UpdatesConfig::new()
                .with_scope_key("@me/app")
                .with_update_url(Url::parse("https://exp.host/@me/app").unwrap())
                .with_sdk_version("49.0.0"),
        )
    }

    fn new_manifest() -> Value {
        json!({
            "id": "0754dad0-d200-4634-8d6a-4ab7ab2c2fd6",
            "createdAt": "2020-11-11T00:17:54.797Z",
            "runtimeVersion": "1",
            "launchAsset": { "url": "https://cdn.test/bundle.js", "hash": "abc123" },
            "assets": []
        })
    }

    fn legacy_manifest() -> Value {
        json!({
            "releaseId": "0eef8214-4833-4089-9dff-b4138a14f196",
            "commitTime": "2020-11-11T00:17:54.797Z",
            "sdkVersion": "49.0.0",
            "bundleUrl": "https://classic-assets.eascdn.net/bundle.js",
            "bundledAssets": ["asset_deadbeef.png"]
        })
    }

    #[test]
    fn test_resolve_launch_asset_only() {
        let response = ResponseHeaderData::new().with_protocol_version(0);
        let update = resolver()
            .resolve(new_manifest(), &response, &ManifestExtensions::new())
            .unwrap();
        let assets = update.assets().unwrap();
        assert_eq!(assets.len(), 1);
        assert!(assets[0].is_launch_asset);
        assert_eq!(assets[0].expected_hash.as_deref(), Some("abc123"));
        assert_eq!(update.scope_key(), "@me/app");
    }

    #[test]
    fn test_resolve_requires_protocol_version() {
        let err = resolver()
            .resolve(legacy_manifest(), &ResponseHeaderData::new(), &ManifestExtensions::new())
            .unwrap_err();
        assert!(matches!(err, ManifestError::UnsupportedProtocolVersion { version: None, .. }));

        let response = ResponseHeaderData::new().with_protocol_version(2);
        let err = resolver()
            .resolve(new_manifest(), &response, &ManifestExtensions::new())
            .unwrap_err();
        assert!(matches!(err, ManifestError::UnsupportedProtocolVersion { version: Some(2), .. }));
    }

    #[test]
    fn test_resolve_requires_scope_key() {
        let resolver = UpdateResolver::new(UpdatesConfig::new());
        let response = ResponseHeaderData::new().with_protocol_version(1);
        assert!(matches!(
            resolver.resolve(new_manifest(), &response, &ManifestExtensions::new()),
            Err(ManifestError::MissingScopeKey { .. })
        ));
        assert!(matches!(
            resolver.resolve_legacy(legacy_manifest()),
            Err(ManifestError::MissingScopeKey { .. })
        ));
    }

    #[test]
    fn test_resolve_body_unwraps_envelope() {
        let body = json!({
            "manifestString": new_manifest().to_string(),
            "signature": "sig"
        })
        .to_string();
        let response = ResponseHeaderData::new().with_protocol_version(1);
        let update = resolver()
            .resolve_body(body.as_bytes(), &response, &ManifestExtensions::new())
            .unwrap();
        assert_eq!(update.manifest(), &new_manifest());
    }

    #[test]
    fn test_resolve_legacy_entry_point() {
        let update = resolver().resolve_legacy(legacy_manifest()).unwrap();
        assert_eq!(update.status(), UpdateStatus::Pending);
        let assets = update.assets().unwrap();
        assert_eq!(assets[1].key(), Some("deadbeef"));
        assert_eq!(
            assets[1].url.as_ref().map(Url::as_str),
            Some("https://classic-assets.eascdn.net/~assets/deadbeef")
        );
    }

    #[test]
    fn test_resolve_legacy_body_selects_sdk_version() {
        let mut older = legacy_manifest();
        older["sdkVersion"] = json!("48.0.0");
        older["releaseId"] = json!("11111111-2222-4333-8444-555555555555");
        let body = json!([older, legacy_manifest()]).to_string();

        let update = resolver().resolve_legacy_body(body.as_bytes()).unwrap();
        assert_eq!(
            update.update_id().to_string(),
            "0eef8214-4833-4089-9dff-b4138a14f196"
        );
        assert_eq!(update.runtime_version(), "49.0.0");
    }

    #[test]
    fn test_resolve_body_rejects_multi_manifest() {
        let body = json!([legacy_manifest()]).to_string();
        let response = ResponseHeaderData::new().with_protocol_version(0);
        assert!(matches!(
            resolver().resolve_body(body.as_bytes(), &response, &ManifestExtensions::new()),
            Err(ManifestError::Malformed(_))
        ));
    }

    #[test]
    fn test_manifest_filter_check_is_opt_in() {
        let mut manifest = new_manifest();
        manifest["metadata"] = json!({ "branchName": "staging" });
        let response = ResponseHeaderData::new()
            .with_protocol_version(1)
            .with_manifest_filters(r#"branchname="main""#);

        let update = resolver()
            .resolve(manifest.clone(), &response, &ManifestExtensions::new())
            .unwrap();
        assert!(!update.matches_manifest_filters());

        let err = resolver()
            .with_manifest_filter_check(true)
            .resolve(manifest, &response, &ManifestExtensions::new())
            .unwrap_err();
        assert!(matches!(err, ManifestError::MismatchedManifestFilters { .. }));

        let update = resolver()
            .with_manifest_filter_check(true)
            .resolve(new_manifest(), &response, &ManifestExtensions::new())
            .unwrap();
        assert!(update.matches_manifest_filters());
    }

    #[test]
    fn test_load_stored_reads_assets_from_store() {
        let store = Arc::new(MemoryStore::new());
        let resolver = resolver().with_store(store.clone());
        let update = resolver.resolve_legacy(legacy_manifest()).unwrap();
        let assets: Vec<Asset> = update.assets().unwrap().into_owned();
        store.insert_assets(update.update_id(), assets.clone()).unwrap();

        let loaded = resolver.load_stored(update.to_record()).unwrap();
        assert_eq!(loaded.update_id(), update.update_id());
        assert_eq!(loaded.assets().unwrap().into_owned(), assets);
    }

    #[test]
    fn test_load_stored_missing_assets() {
        let resolver = resolver();
        let update = resolver.resolve_legacy(legacy_manifest()).unwrap();
        let loaded = resolver.load_stored(update.to_record()).unwrap();
        assert_eq!(
            loaded.assets().unwrap_err(),
            StoreError::UpdateNotFound(update.update_id())
        );
    }
}
