//! Legacy (classic) manifest model and adapter

use std::collections::HashSet;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::base_url::{asset_url, bundled_asset_base_url};
use crate::config::UpdatesConfig;
use crate::protocol::error::ManifestError;
use crate::protocol::manifest::{
    parse_timestamp, parse_url, parse_uuid, require_scope_key, required,
};
use crate::update::{Asset, Update, UpdateParts, UpdateStatus};

/// Fixed prefix of every bundled asset filename.
pub const BUNDLED_ASSET_PREFIX: &str = "asset_";

/// Developer tool block; its presence marks a dev-tool manifest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeveloperInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool: Option<String>,
}

/// Classic manifest as served by the hosted update service or a dev tool.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyManifest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sdk_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bundle_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bundle_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bundled_assets: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_url_override: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub developer: Option<DeveloperInfo>,

    /// Full manifest JSON, kept for persistence.
    #[serde(skip)]
    pub raw: Value,
}

/// A bundled asset filename split into its parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BundledAssetName<'a> {
    /// Filename without extension, e.g. `asset_deadbeef`
    pub stem: &'a str,
    pub hash: &'a str,
    /// Extension without the dot; empty when absent
    pub extension: &'a str,
}

impl<'a> BundledAssetName<'a> {
    /// Split `asset_<hash>.<ext>` on the last `.`, then drop the fixed-length
    /// prefix from the stem.
    pub fn parse(filename: &'a str) -> Result<Self, ManifestError> {
        let (stem, extension) = match filename.rfind('.') {
            Some(dot) => (&filename[..dot], &filename[dot + 1..]),
            None => (filename, ""),
        };
        let hash = stem.get(BUNDLED_ASSET_PREFIX.len()..).ok_or_else(|| {
            ManifestError::Malformed(format!(
                "bundled asset '{}' does not follow the {}<hash>.<ext> convention",
                filename, BUNDLED_ASSET_PREFIX
            ))
        })?;
        Ok(Self {
            stem,
            hash,
            extension,
        })
    }
}

impl LegacyManifest {
    /// Parse a legacy manifest; wrong value types are fatal.
    pub fn from_json(raw: Value) -> Result<Self, ManifestError> {
        let mut manifest: LegacyManifest = serde_json::from_value(raw.clone())?;
        manifest.raw = raw;
        Ok(manifest)
    }

    pub fn is_using_developer_tool(&self) -> bool {
        self.developer
            .as_ref()
            .is_some_and(|d| d.tool.is_some())
    }

    /// Build the update described by this manifest.
    pub fn into_update(self, config: &UpdatesConfig) -> Result<Update, ManifestError> {
        let scope_key = require_scope_key(config)?;
        let is_dev_tool = self.is_using_developer_tool();

        let (update_id, commit_time) = if is_dev_tool {
            // dev-tool manifests carry no stable id
            (Uuid::new_v4(), Utc::now())
        } else {
            let release_id = required(self.release_id.as_deref(), "releaseId")?;
            let commit_time = required(self.commit_time.as_deref(), "commitTime")?;
            (
                parse_uuid("releaseId", release_id)?,
                parse_timestamp("commitTime", commit_time)?,
            )
        };

        let runtime_version = self
            .runtime_version
            .clone()
            .or_else(|| self.sdk_version.clone())
            .ok_or_else(|| {
                ManifestError::missing("runtimeVersion")
                    .with_hint("Legacy manifests need runtimeVersion or sdkVersion")
            })?;

        let bundle_url = required(self.bundle_url.as_deref(), "bundleUrl")?;
        let mut assets = vec![Asset::launch(
            self.bundle_key.clone(),
            parse_url("bundleUrl", bundle_url)?,
        )];

        let bundled = self.bundled_assets.as_deref().unwrap_or_default();
        if !bundled.is_empty() {
            let base_url = bundled_asset_base_url(
                config.update_url.as_ref(),
                self.asset_url_override.as_deref(),
            )?;
            let mut seen = HashSet::new();
            for filename in bundled {
                if !seen.insert(filename.as_str()) {
                    tracing::debug!(filename = %filename, "skipping repeated bundled asset");
                    continue;
                }
                let name = BundledAssetName::parse(filename)?;
                assets.push(
                    Asset::new(Some(name.hash.to_string()), name.extension)
                        .with_url(asset_url(&base_url, name.hash)?)
                        .with_main_bundle_filename(Some(name.stem.to_string())),
                );
            }
        }

        let status = if is_dev_tool {
            UpdateStatus::Development
        } else {
            UpdateStatus::Pending
        };

        tracing::debug!(
            update_id = %update_id,
            assets = assets.len(),
            development = is_dev_tool,
            "resolved legacy manifest"
        );

        Update::from_parts(UpdateParts {
            update_id,
            scope_key,
            commit_time,
            runtime_version,
            manifest: self.raw,
            status,
            is_development_mode: is_dev_tool,
            assets,
            server_defined_headers: None,
            manifest_filters: None,
        })
    }
}
