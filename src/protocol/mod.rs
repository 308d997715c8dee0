//! # Manifest Protocol Layer
//!
//! This module turns a received manifest and its response metadata into a
//! normalized [`Update`](crate::update::Update). Two wire formats exist: the
//! classic legacy format and the structured-protocol format negotiated by
//! protocol version.
//!
//! ## Overview
//!
//! The protocol layer is responsible for:
//! - Selecting a format adapter from the negotiated protocol version
//! - Parsing both manifest formats and enforcing their required fields
//! - Computing where legacy bundled assets are hosted
//! - Reading advisory structured headers and vendor extensions
//!
//! ## Module Structure
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`resolver`] | `UpdateResolver` entry points |
//! | [`manifest`] | Wire-format union and protocol version dispatch |
//! | [`legacy`] | Legacy manifest adapter and asset base-URL policy |
//! | [`modern`] | New-format manifest adapter |
//! | [`response`] | Response header data and manifest extensions |
//! | [`body`] | Response body unwrapping |
//! | [`filters`] | Manifest filter matching |
//! | [`error`] | Fatal manifest errors |
//!
//! ## Example
//!
//! ```rust
//! use ota_manifest::config::UpdatesConfig;
//! use ota_manifest::protocol::{ManifestExtensions, ResponseHeaderData, UpdateResolver};
//! use serde_json::json;
//!
//! let resolver = UpdateResolver::new(UpdatesConfig::new().with_scope_key("@me/app"));
//! let response = ResponseHeaderData::new().with_protocol_version(1);
//! let manifest = json!({
//!     "id": "0754dad0-d200-4634-8d6a-4ab7ab2c2fd6",
//!     "createdAt": "2020-11-11T00:17:54.797Z",
//!     "runtimeVersion": "1",
//!     "launchAsset": { "url": "https://cdn.test/bundle.js", "hash": "abc123" }
//! });
//!
//! let update = resolver.resolve(manifest, &response, &ManifestExtensions::new())?;
//! assert_eq!(update.assets()?.len(), 1);
//! # Ok::<(), ota_manifest::Error>(())
//! ```

pub mod body;
pub mod error;
pub mod filters;
pub mod legacy;
pub mod manifest;
pub mod modern;
pub mod resolver;
pub mod response;

// Re-export main types for convenient access
pub use body::{extract_legacy_manifest, extract_manifest};
pub use error::ManifestError;
pub use legacy::LegacyManifest;
pub use manifest::{Manifest, ManifestFormat, ProtocolVersion};
pub use modern::NewManifest;
pub use resolver::UpdateResolver;
pub use response::{ManifestExtensions, ResponseHeaderData};
