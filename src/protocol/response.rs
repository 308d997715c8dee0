//! Response metadata accompanying a manifest
//!
//! The transport hands over the protocol version and two structured-header
//! strings from the response headers, plus the JSON extensions part.

use std::collections::HashMap;

use serde_json::{Map, Value};

use super::error::ManifestError;
use crate::utils::structured_header;

pub const PROTOCOL_VERSION_HEADER: &str = "expo-protocol-version";
pub const SERVER_DEFINED_HEADERS_HEADER: &str = "expo-server-defined-headers";
pub const MANIFEST_FILTERS_HEADER: &str = "expo-manifest-filters";

/// Protocol metadata read from the manifest response headers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseHeaderData {
    pub protocol_version: Option<i64>,
    pub server_defined_headers_raw: Option<String>,
    pub manifest_filters_raw: Option<String>,
}

impl ResponseHeaderData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_protocol_version(mut self, version: i64) -> Self {
        self.protocol_version = Some(version);
        self
    }

    pub fn with_server_defined_headers(mut self, raw: impl Into<String>) -> Self {
        self.server_defined_headers_raw = Some(raw.into());
        self
    }

    pub fn with_manifest_filters(mut self, raw: impl Into<String>) -> Self {
        self.manifest_filters_raw = Some(raw.into());
        self
    }

    /// Collect the protocol headers from a response header list.
    ///
    /// Header names match case-insensitively. An unparseable protocol
    /// version is treated as absent.
    pub fn from_headers<'a, I>(headers: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut data = Self::default();
        for (name, value) in headers {
            if name.eq_ignore_ascii_case(PROTOCOL_VERSION_HEADER) {
                data.protocol_version = value.trim().parse().ok();
                if data.protocol_version.is_none() {
                    tracing::debug!(value = %value, "ignoring unparseable protocol version header");
                }
            } else if name.eq_ignore_ascii_case(SERVER_DEFINED_HEADERS_HEADER) {
                data.server_defined_headers_raw = Some(value.to_string());
            } else if name.eq_ignore_ascii_case(MANIFEST_FILTERS_HEADER) {
                data.manifest_filters_raw = Some(value.to_string());
            }
        }
        data
    }

    /// Parsed server-defined headers; `None` when absent or unparseable.
    pub fn server_defined_headers(&self) -> Option<Map<String, Value>> {
        parse_advisory("serverDefinedHeaders", self.server_defined_headers_raw.as_deref())
    }

    /// Parsed manifest filters; `None` when absent or unparseable.
    pub fn manifest_filters(&self) -> Option<Map<String, Value>> {
        parse_advisory("manifestFilters", self.manifest_filters_raw.as_deref())
    }
}

// Advisory routing data: a parse failure is logged and reads as absent.
fn parse_advisory(field: &str, raw: Option<&str>) -> Option<Map<String, Value>> {
    let raw = raw?;
    match structured_header::parse_dictionary(raw) {
        Ok(dict) => Some(dict.to_json_map()),
        Err(e) => {
            tracing::warn!(field, error = %e, "failed to parse structured header, ignoring it");
            None
        }
    }
}

/// Vendor extensions delivered alongside the manifest.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ManifestExtensions {
    /// Extra request headers keyed by asset key.
    pub asset_request_headers: HashMap<String, Map<String, Value>>,
}

impl ManifestExtensions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_asset_request_headers(
        mut self,
        asset_key: impl Into<String>,
        headers: Map<String, Value>,
    ) -> Self {
        self.asset_request_headers.insert(asset_key.into(), headers);
        self
    }

    /// Parse the extensions JSON object. A non-object payload is fatal;
    /// header entries that are not objects are dropped.
    pub fn from_json(value: &Value) -> Result<Self, ManifestError> {
        let object = value.as_object().ok_or_else(|| {
            ManifestError::Malformed("extensions should be a JSON object".to_string())
        })?;

        let mut extensions = Self::default();
        let Some(headers) = object.get("assetRequestHeaders") else {
            return Ok(extensions);
        };
        let Some(headers) = headers.as_object() else {
            tracing::warn!("extensions.assetRequestHeaders is not an object, ignoring it");
            return Ok(extensions);
        };
        for (key, entry) in headers {
            match entry.as_object() {
                Some(map) => {
                    extensions
                        .asset_request_headers
                        .insert(key.clone(), map.clone());
                }
                None => tracing::warn!(asset_key = %key, "dropping non-object asset request headers"),
            }
        }
        Ok(extensions)
    }

    pub fn request_headers_for(&self, asset_key: Option<&str>) -> Option<Map<String, Value>> {
        asset_key.and_then(|k| self.asset_request_headers.get(k).cloned())
    }
}
