//! # ota-manifest
//!
//! Update-manifest resolution engine for over-the-air application updates.
//!
//! ## Overview
//!
//! A client asks an update service for the newest compatible update and gets
//! back a manifest plus response metadata. This crate validates that manifest
//! in either of its two wire formats and produces a normalized [`Update`]
//! with its [`Asset`] list, ready for the persistence layer and the launcher.
//!
//! The engine performs no I/O. The only blocking path is the lazy asset list
//! of an update loaded from storage, which reads through an [`AssetStore`].
//!
//! ## Quick Start
//!
//! ```rust
//! use ota_manifest::{ManifestExtensions, ResponseHeaderData, UpdateResolver, UpdatesConfig};
//!
//! let config = UpdatesConfig::from_yaml_str("scopeKey: \"@me/app\"")?;
//! let resolver = UpdateResolver::new(config);
//!
//! let response = ResponseHeaderData::from_headers([("expo-protocol-version", "1")]);
//! let body = br#"{
//!     "id": "0754dad0-d200-4634-8d6a-4ab7ab2c2fd6",
//!     "createdAt": "2020-11-11T00:17:54.797Z",
//!     "runtimeVersion": "1",
//!     "launchAsset": { "url": "https://cdn.test/bundle.js" }
//! }"#;
//!
//! let update = resolver.resolve_body(body, &response, &ManifestExtensions::new())?;
//! assert!(update.launch_asset()?.is_some());
//! # Ok::<(), ota_manifest::Error>(())
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`protocol`] | Manifest formats, version dispatch and resolution |
//! | [`update`] | Normalized update and asset model |
//! | [`store`] | Persistence handle for stored asset lists |
//! | [`config`] | Static updates configuration |
//! | [`utils`] | Structured header parsing |
//! | [`error`] | Crate-level error type |

pub mod config;
pub mod protocol;
pub mod store;
pub mod update;
pub mod utils;

// Re-export main types for convenience
pub use config::UpdatesConfig;
pub use protocol::{
    ManifestError, ManifestExtensions, ManifestFormat, ProtocolVersion, ResponseHeaderData,
    UpdateResolver,
};
pub use store::{AssetStore, MemoryStore, StoreError};
pub use update::{Asset, AssetSource, StoredUpdateRecord, Update, UpdateStatus};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
