//! Update asset model and content-key helpers

use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use url::Url;

/// Placeholder type given to every launch asset, whatever extension the
/// manifest declares for it.
pub const EMBEDDED_BUNDLE_FILE_TYPE: &str = "bundle";

/// Filename of the launch bundle inside the app's embedded resources.
pub const EMBEDDED_BUNDLE_FILENAME: &str = "app";

/// A single content-addressed file belonging to an update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    /// Stable content key used for on-disk caching and deduplication.
    /// Only a new-format launch asset may arrive without one.
    pub key: Option<String>,
    #[serde(rename = "type")]
    pub asset_type: String,
    /// Absent for assets copied from embedded resources.
    pub url: Option<Url>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_hash: Option<String>,
    #[serde(default)]
    pub is_launch_asset: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_bundle_filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_request_headers: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

impl Asset {
    pub fn new(key: Option<String>, asset_type: impl Into<String>) -> Self {
        Self {
            key,
            asset_type: asset_type.into(),
            url: None,
            expected_hash: None,
            is_launch_asset: false,
            main_bundle_filename: None,
            extra_request_headers: None,
            metadata: None,
        }
    }

    /// Build the launch asset: always the embedded-bundle type.
    pub fn launch(key: Option<String>, url: Url) -> Self {
        Self {
            url: Some(url),
            is_launch_asset: true,
            main_bundle_filename: Some(EMBEDDED_BUNDLE_FILENAME.to_string()),
            ..Self::new(key, EMBEDDED_BUNDLE_FILE_TYPE)
        }
    }

    pub fn with_url(mut self, url: Url) -> Self {
        self.url = Some(url);
        self
    }

    pub fn with_expected_hash(mut self, hash: Option<String>) -> Self {
        self.expected_hash = hash;
        self
    }

    pub fn with_main_bundle_filename(mut self, filename: Option<String>) -> Self {
        self.main_bundle_filename = filename;
        self
    }

    pub fn with_extra_request_headers(mut self, headers: Option<Map<String, Value>>) -> Self {
        self.extra_request_headers = headers;
        self
    }

    pub fn with_metadata(mut self, metadata: Option<Map<String, Value>>) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    /// Check downloaded bytes against `expected_hash`.
    ///
    /// Assets without an expected hash (legacy assets, whose key is the
    /// content hash) are identity-checked elsewhere and always pass here.
    pub fn verify_content(&self, bytes: &[u8]) -> bool {
        match &self.expected_hash {
            Some(expected) => content_hash(bytes) == *expected,
            None => true,
        }
    }
}

/// Base64url (unpadded) SHA-256 digest of `bytes`, the form manifests use
/// for `hash` fields.
pub fn content_hash(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(digest)
}
