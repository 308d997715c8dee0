//! Base URL policy for legacy bundled assets
//!
//! Legacy manifests name assets by hash only; where those bytes live is
//! decided here from the update-service URL. First-party hosts always use the
//! classic CDN, and that check runs before any override declared in the
//! manifest body is consulted.

use url::Url;

use crate::protocol::error::ManifestError;

/// CDN that serves every first-party legacy asset.
pub const CLASSIC_ASSETS_BASE_URL: &str = "https://classic-assets.eascdn.net/~assets/";

/// Hosts of the classic first-party update service.
pub const FIRST_PARTY_DOMAINS: [&str; 3] = ["expo.io", "exp.host", "expo.test"];

const DEFAULT_ASSET_PATH: &str = "assets";

/// Compute the base URL legacy assets are fetched from.
pub fn bundled_asset_base_url(
    update_url: Option<&Url>,
    asset_url_override: Option<&str>,
) -> Result<Url, ManifestError> {
    let Some((update_url, host)) = update_url.and_then(|u| u.host_str().map(|h| (u, h))) else {
        tracing::debug!("update URL has no host, using classic assets CDN");
        return classic_assets_base_url();
    };

    if FIRST_PARTY_DOMAINS.iter().any(|domain| host.contains(domain)) {
        return classic_assets_base_url();
    }

    let path = asset_url_override.unwrap_or(DEFAULT_ASSET_PATH);
    // join() resolves relative references and removes dot segments
    update_url.join(path).map_err(|e| ManifestError::InvalidUrl {
        field: "assetUrlOverride".to_string(),
        value: path.to_string(),
        reason: e.to_string(),
    })
}

/// Append `hash` as a final path segment of `base`.
pub fn asset_url(base: &Url, hash: &str) -> Result<Url, ManifestError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| ManifestError::InvalidUrl {
            field: "assetUrlOverride".to_string(),
            value: base.to_string(),
            reason: "cannot be a base URL".to_string(),
        })?
        .pop_if_empty()
        .push(hash);
    Ok(url)
}

fn classic_assets_base_url() -> Result<Url, ManifestError> {
    Url::parse(CLASSIC_ASSETS_BASE_URL).map_err(|e| ManifestError::InvalidUrl {
        field: "classicAssetsBaseUrl".to_string(),
        value: CLASSIC_ASSETS_BASE_URL.to_string(),
        reason: e.to_string(),
    })
}
