//! Manifest wire formats and protocol version selection
//!
//! [`Manifest`] is the closed set of wire formats; each variant has its own
//! adapter producing an [`Update`]. [`ProtocolVersion`] picks the variant for
//! a protocol response. A protocol revision that changes the manifest shape
//! gets a new `ProtocolVersion` variant and, if needed, a new `Manifest`
//! variant; versions 0 and 1 share one shape today.

use chrono::{DateTime, Utc};
use serde_json::Value;
use url::Url;
use uuid::Uuid;

use super::error::ManifestError;
use super::legacy::LegacyManifest;
use super::modern::NewManifest;
use super::response::{ManifestExtensions, ResponseHeaderData};
use crate::config::UpdatesConfig;
use crate::update::Update;

/// Wire format of a manifest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ManifestFormat {
    /// Classic format: relative `asset_<hash>.<ext>` names and a bundle URL
    Legacy,
    /// Structured-protocol format: explicit asset URLs and hashes
    New,
}

impl std::fmt::Display for ManifestFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Legacy => write!(f, "legacy"),
            Self::New => write!(f, "new"),
        }
    }
}

/// A parsed manifest in one of the supported wire formats.
#[derive(Debug, Clone)]
pub enum Manifest {
    Legacy(LegacyManifest),
    New(NewManifest),
}

impl Manifest {
    pub fn format(&self) -> ManifestFormat {
        match self {
            Manifest::Legacy(_) => ManifestFormat::Legacy,
            Manifest::New(_) => ManifestFormat::New,
        }
    }

    /// Run the adapter for this format.
    pub fn into_update(
        self,
        response: &ResponseHeaderData,
        extensions: &ManifestExtensions,
        config: &UpdatesConfig,
    ) -> Result<Update, ManifestError> {
        match self {
            Manifest::Legacy(manifest) => manifest.into_update(config),
            Manifest::New(manifest) => manifest.into_update(response, extensions, config),
        }
    }
}

/// Negotiated update protocol version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProtocolVersion {
    V0,
    V1,
}

impl ProtocolVersion {
    /// Map the response's protocol version; absent or unknown versions are fatal.
    pub fn from_response(version: Option<i64>) -> Result<Self, ManifestError> {
        match version {
            Some(0) => Ok(ProtocolVersion::V0),
            Some(1) => Ok(ProtocolVersion::V1),
            other => Err(ManifestError::UnsupportedProtocolVersion {
                version: other,
                hint: None,
            }
            .with_hint("Only protocol versions 0 and 1 are supported; legacy manifests load through the embedded-bundle entry point")),
        }
    }

    pub fn as_i64(self) -> i64 {
        match self {
            ProtocolVersion::V0 => 0,
            ProtocolVersion::V1 => 1,
        }
    }

    /// Manifest format served under this version.
    pub fn manifest_format(self) -> ManifestFormat {
        match self {
            ProtocolVersion::V0 | ProtocolVersion::V1 => ManifestFormat::New,
        }
    }

    pub fn parse_manifest(self, raw: Value) -> Result<Manifest, ManifestError> {
        match self.manifest_format() {
            ManifestFormat::New => NewManifest::from_json(raw).map(Manifest::New),
            ManifestFormat::Legacy => LegacyManifest::from_json(raw).map(Manifest::Legacy),
        }
    }
}

pub(crate) fn require_scope_key(config: &UpdatesConfig) -> Result<String, ManifestError> {
    config
        .scope_key()
        .map(str::to_string)
        .ok_or_else(|| {
            ManifestError::MissingScopeKey { hint: None }
                .with_hint("Set scopeKey in the updates configuration")
        })
}

pub(crate) fn required<T>(value: Option<T>, field: &str) -> Result<T, ManifestError> {
    value.ok_or_else(|| ManifestError::missing(field))
}

pub(crate) fn parse_uuid(field: &str, value: &str) -> Result<Uuid, ManifestError> {
    Uuid::parse_str(value).map_err(|_| ManifestError::InvalidUuid {
        field: field.to_string(),
        value: value.to_string(),
    })
}

pub(crate) fn parse_url(field: &str, value: &str) -> Result<Url, ManifestError> {
    Url::parse(value).map_err(|e| ManifestError::InvalidUrl {
        field: field.to_string(),
        value: value.to_string(),
        reason: e.to_string(),
    })
}

pub(crate) fn parse_timestamp(field: &str, value: &str) -> Result<DateTime<Utc>, ManifestError> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|_| ManifestError::InvalidTimestamp {
            field: field.to_string(),
            value: value.to_string(),
        })
}
