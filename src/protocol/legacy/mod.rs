//! Legacy (classic) manifest format
//!
//! Classic manifests encode each asset's content hash and extension in one
//! filename (`asset_<hash>.<ext>`) and leave the asset host implicit; the
//! [`base_url`] policy decides where those assets live. They reach the
//! resolver only through the embedded-bundle entry point.

pub mod base_url;
pub mod manifest;

pub use base_url::{bundled_asset_base_url, CLASSIC_ASSETS_BASE_URL, FIRST_PARTY_DOMAINS};
pub use manifest::{BundledAssetName, DeveloperInfo, LegacyManifest};
