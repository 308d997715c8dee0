//! New (structured-protocol) manifest format
//!
//! Every asset carries its own URL, key and content hash. Response metadata
//! adds advisory structured headers and per-asset request headers from the
//! extensions part.

pub mod manifest;

pub use manifest::{ManifestAsset, NewManifest};
