//! Manifest body unwrapping
//!
//! A manifest response body is one of:
//! - the manifest object itself
//! - an envelope `{ "manifestString": "...", "signature": "..." }`
//! - an array of legacy manifests, one per SDK version (legacy servers only)
//!
//! Signatures are carried through untouched; verification happens elsewhere.

use serde_json::Value;

use super::error::ManifestError;
use crate::config::UpdatesConfig;

/// Extract the manifest object from a protocol response body.
///
/// Multi-manifest arrays predate the structured protocol and are rejected.
pub fn extract_manifest(body: &[u8]) -> Result<Value, ManifestError> {
    let parsed: Value = serde_json::from_slice(body)?;
    match parsed {
        Value::Array(_) => Err(ManifestError::Malformed(
            "multi-manifest arrays are only served to legacy clients".to_string(),
        )),
        _ => unwrap_envelope(parsed),
    }
}

/// Extract a legacy manifest object, picking the first entry of a
/// multi-manifest array whose `sdkVersion` the host supports.
pub fn extract_legacy_manifest(
    body: &[u8],
    config: &UpdatesConfig,
) -> Result<Value, ManifestError> {
    let parsed: Value = serde_json::from_slice(body)?;
    let response = select_response(parsed, config)?;
    unwrap_envelope(response)
}

fn select_response(parsed: Value, config: &UpdatesConfig) -> Result<Value, ManifestError> {
    match parsed {
        Value::Object(_) => Ok(parsed),
        Value::Array(candidates) => {
            let supported = config.supported_sdk_versions();
            let selected = candidates
                .into_iter()
                .find(|candidate| {
                    candidate
                        .get("sdkVersion")
                        .and_then(Value::as_str)
                        .is_some_and(|v| supported.contains(&v))
                })
                .ok_or_else(|| no_compatible_update(config))?;
            tracing::debug!("selected manifest from multi-manifest response");
            Ok(selected)
        }
        _ => Err(no_compatible_update(config)),
    }
}

fn unwrap_envelope(response: Value) -> Result<Value, ManifestError> {
    let is_envelope = response.get("manifestString").is_some() && response.get("signature").is_some();
    if !is_envelope {
        return expect_object(response);
    }

    let manifest_string = response
        .get("manifestString")
        .and_then(Value::as_str)
        .ok_or_else(|| ManifestError::Malformed("manifestString should be a string".to_string()))?;
    tracing::debug!("unwrapping signed manifest envelope");
    expect_object(serde_json::from_str(manifest_string)?)
}

fn expect_object(value: Value) -> Result<Value, ManifestError> {
    if value.is_object() {
        Ok(value)
    } else {
        Err(ManifestError::Malformed(
            "manifest should be a valid JSON object".to_string(),
        ))
    }
}

fn no_compatible_update(config: &UpdatesConfig) -> ManifestError {
    ManifestError::NoCompatibleUpdate {
        url: config
            .update_url
            .as_ref()
            .map(|u| u.to_string())
            .unwrap_or_else(|| "(unknown url)".to_string()),
        supported: config
            .sdk_version
            .clone()
            .unwrap_or_else(|| "(missing sdkVersion field)".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config() -> UpdatesConfig {
        UpdatesConfig::new()
            .with_scope_key("s")
            .with_sdk_version("47.0.0,48.0.0")
    }

    #[test]
    fn test_plain_object() {
        let body = br#"{"id":"x"}"#;
        assert_eq!(extract_manifest(body).unwrap(), json!({ "id": "x" }));
    }

    #[test]
    fn test_signed_envelope() {
        let body = json!({
            "manifestString": "{\"releaseId\":\"r\"}",
            "signature": "sig"
        })
        .to_string();
        assert_eq!(
            extract_manifest(body.as_bytes()).unwrap(),
            json!({ "releaseId": "r" })
        );
    }

    #[test]
    fn test_manifest_string_without_signature_is_the_manifest() {
        let body = json!({ "manifestString": "x" }).to_string();
        assert_eq!(
            extract_manifest(body.as_bytes()).unwrap(),
            json!({ "manifestString": "x" })
        );
    }

    #[test]
    fn test_envelope_with_non_string_manifest() {
        let body = json!({ "manifestString": 5, "signature": "sig" }).to_string();
        assert!(matches!(
            extract_manifest(body.as_bytes()),
            Err(ManifestError::Malformed(_))
        ));
    }

    #[test]
    fn test_multi_manifest_selects_supported_sdk() {
        let body = json!([
            { "sdkVersion": "46.0.0", "releaseId": "old" },
            { "sdkVersion": "48.0.0", "releaseId": "new" }
        ])
        .to_string();
        let manifest = extract_legacy_manifest(body.as_bytes(), &config()).unwrap();
        assert_eq!(manifest["releaseId"], "new");
    }

    #[test]
    fn test_multi_manifest_without_match() {
        let body = json!([{ "sdkVersion": "46.0.0" }]).to_string();
        let err = extract_legacy_manifest(body.as_bytes(), &config()).unwrap_err();
        assert!(matches!(err, ManifestError::NoCompatibleUpdate { .. }));
        assert!(err.to_string().contains("47.0.0,48.0.0"));
    }

    #[test]
    fn test_protocol_body_rejects_multi_manifest() {
        let body = json!([{ "sdkVersion": "48.0.0", "releaseId": "new" }]).to_string();
        assert!(matches!(
            extract_manifest(body.as_bytes()),
            Err(ManifestError::Malformed(_))
        ));
    }

    #[test]
    fn test_legacy_body_accepts_plain_object() {
        let body = br#"{"releaseId":"r","sdkVersion":"1.0.0"}"#;
        assert_eq!(
            extract_legacy_manifest(body, &config()).unwrap()["releaseId"],
            "r"
        );
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            extract_manifest(b"not json"),
            Err(ManifestError::Malformed(_))
        ));
    }
}
