//! New-format manifest model and adapter

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::UpdatesConfig;
use crate::protocol::error::ManifestError;
use crate::protocol::manifest::{
    parse_timestamp, parse_url, parse_uuid, require_scope_key, required,
};
use crate::protocol::response::{ManifestExtensions, ResponseHeaderData};
use crate::update::{Asset, Update, UpdateParts, UpdateStatus};

/// Asset entry as it appears on the wire, for both the launch asset and
/// the `assets` list. Required fields differ between the two.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestAsset {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_extension: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_bundle_filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

/// Structured-protocol manifest (protocol versions 0 and 1).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewManifest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub launch_asset: Option<ManifestAsset>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assets: Option<Vec<ManifestAsset>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,

    /// Full manifest JSON, kept for persistence.
    #[serde(skip)]
    pub raw: Value,
}

impl NewManifest {
    /// Parse a new-format manifest; wrong value types are fatal.
    pub fn from_json(raw: Value) -> Result<Self, ManifestError> {
        let mut manifest: NewManifest = serde_json::from_value(raw.clone())?;
        manifest.raw = raw;
        Ok(manifest)
    }

    /// Build the update described by this manifest.
    pub fn into_update(
        self,
        response: &ResponseHeaderData,
        extensions: &ManifestExtensions,
        config: &UpdatesConfig,
    ) -> Result<Update, ManifestError> {
        let scope_key = require_scope_key(config)?;
        let update_id = parse_uuid("id", required(self.id.as_deref(), "id")?)?;
        let commit_time = parse_timestamp(
            "createdAt",
            required(self.created_at.as_deref(), "createdAt")?,
        )?;
        let runtime_version = required(self.runtime_version.clone(), "runtimeVersion")?;

        let launch = required(self.launch_asset.as_ref(), "launchAsset")?;
        let launch_url = parse_url(
            "launchAsset.url",
            required(launch.url.as_deref(), "launchAsset.url")?,
        )?;
        let mut assets = vec![Asset::launch(launch.key.clone(), launch_url)
            .with_expected_hash(launch.hash.clone())
            .with_extra_request_headers(extensions.request_headers_for(launch.key.as_deref()))];

        for (index, entry) in self.assets.iter().flatten().enumerate() {
            assets.push(build_asset(index, entry, extensions)?);
        }

        tracing::debug!(
            update_id = %update_id,
            assets = assets.len(),
            "resolved new-format manifest"
        );

        Update::from_parts(UpdateParts {
            update_id,
            scope_key,
            commit_time,
            runtime_version,
            manifest: self.raw,
            status: UpdateStatus::Pending,
            is_development_mode: false,
            assets,
            server_defined_headers: response.server_defined_headers(),
            manifest_filters: response.manifest_filters(),
        })
    }
}

fn build_asset(
    index: usize,
    entry: &ManifestAsset,
    extensions: &ManifestExtensions,
) -> Result<Asset, ManifestError> {
    let field = |name: &str| format!("assets[{}].{}", index, name);

    let key = required(entry.key.clone(), &field("key"))?;
    let url = parse_url(&field("url"), required(entry.url.as_deref(), &field("url"))?)?;
    let file_extension = required(entry.file_extension.as_deref(), &field("fileExtension"))?;
    let hash = required(entry.hash.clone(), &field("hash"))?;

    let headers = extensions.request_headers_for(Some(&key));
    Ok(Asset::new(Some(key), file_extension)
        .with_url(url)
        .with_expected_hash(Some(hash))
        .with_main_bundle_filename(entry.main_bundle_filename.clone())
        .with_metadata(entry.metadata.clone())
        .with_extra_request_headers(headers))
}
