//! Static updates configuration
//!
//! Loaded from YAML or JSON, or assembled in code with the `with_*` builders.

use std::path::Path;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, ErrorContext};

/// Configuration supplied by the host app.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatesConfig {
    /// Identifies the project updates belong to. Required to resolve.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope_key: Option<String>,

    /// Update-service URL the manifest is fetched from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_url: Option<Url>,

    /// Comma-separated SDK versions the host can run; selects among
    /// multi-manifest responses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sdk_version: Option<String>,
}

impl UpdatesConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scope_key(mut self, scope_key: impl Into<String>) -> Self {
        self.scope_key = Some(scope_key.into());
        self
    }

    pub fn with_update_url(mut self, url: Url) -> Self {
        self.update_url = Some(url);
        self
    }

    pub fn with_sdk_version(mut self, sdk_version: impl Into<String>) -> Self {
        self.sdk_version = Some(sdk_version.into());
        self
    }

    pub fn from_yaml_str(content: &str) -> crate::Result<Self> {
        serde_yaml::from_str(content).map_err(|e| {
            Error::configuration_with_context(
                format!("Invalid YAML updates configuration: {}", e),
                ErrorContext::new().with_source("updates_config"),
            )
        })
    }

    pub fn from_json_str(content: &str) -> crate::Result<Self> {
        serde_json::from_str(content).map_err(|e| {
            Error::configuration_with_context(
                format!("Invalid JSON updates configuration: {}", e),
                ErrorContext::new().with_source("updates_config"),
            )
        })
    }

    /// Load from a `.json`, `.yaml` or `.yml` file.
    pub fn from_file(path: impl AsRef<Path>) -> crate::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&content),
            Some("yaml") | Some("yml") => Self::from_yaml_str(&content),
            other => Err(Error::configuration_with_context(
                format!("Unsupported configuration file extension: {:?}", other),
                ErrorContext::new()
                    .with_field_path(path.display().to_string())
                    .with_details("expected .json, .yaml or .yml"),
            )),
        }
    }

    /// Non-empty scope key, if configured.
    pub fn scope_key(&self) -> Option<&str> {
        self.scope_key.as_deref().filter(|s| !s.is_empty())
    }

    /// SDK versions listed in `sdk_version`.
    pub fn supported_sdk_versions(&self) -> Vec<&str> {
        self.sdk_version
            .as_deref()
            .map(|v| v.split(',').map(str::trim).filter(|s| !s.is_empty()).collect())
            .unwrap_or_default()
    }

    pub fn validate(&self) -> crate::Result<()> {
        if self.scope_key().is_none() {
            return Err(Error::configuration_with_context(
                "scopeKey must be set",
                ErrorContext::new().with_field_path("scopeKey"),
            ));
        }
        if let Some(url) = &self.update_url {
            if url.cannot_be_a_base() {
                return Err(Error::configuration_with_context(
                    "updateUrl must be a hierarchical URL",
                    ErrorContext::new()
                        .with_field_path("updateUrl")
                        .with_details(url.to_string()),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_yaml() {
        let config = UpdatesConfig::from_yaml_str(
            r#"
scopeKey: "@me/app"
updateUrl: https://exp.host/@me/app
sdkVersion: "48.0.0, 49.0.0"
"#,
        )
        .unwrap();
        assert_eq!(config.scope_key(), Some("@me/app"));
        assert_eq!(
            config.update_url.as_ref().map(Url::as_str),
            Some("https://exp.host/@me/app")
        );
        assert_eq!(config.supported_sdk_versions(), vec!["48.0.0", "49.0.0"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_json_and_builders_agree() {
        let from_json = UpdatesConfig::from_json_str(
            r#"{"scopeKey":"s","updateUrl":"https://u.test/m","sdkVersion":"49.0.0"}"#,
        )
        .unwrap();
        let built = UpdatesConfig::new()
            .with_scope_key("s")
            .with_update_url(Url::parse("https://u.test/m").unwrap())
            .with_sdk_version("49.0.0");
        assert_eq!(from_json, built);
    }

    #[test]
    fn test_parse_failures_are_configuration_errors() {
        for err in [
            UpdatesConfig::from_json_str(r#"{"scopeKey": 5}"#).unwrap_err(),
            UpdatesConfig::from_yaml_str("scopeKey: [unclosed").unwrap_err(),
        ] {
            assert!(matches!(err, Error::Configuration { .. }));
            assert_eq!(
                err.context().and_then(|c| c.source.as_deref()),
                Some("updates_config")
            );
        }
    }

    #[test]
    fn test_validate_requires_scope_key() {
        let err = UpdatesConfig::new().with_scope_key("").validate().unwrap_err();
        assert!(err.to_string().contains("scopeKey"));
    }

    #[test]
    fn test_validate_rejects_opaque_update_url() {
        let config = UpdatesConfig::new()
            .with_scope_key("s")
            .with_update_url(Url::parse("mailto:someone@example.com").unwrap());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_file_rejects_unknown_extension() {
        let path = std::env::temp_dir().join(format!("updates-config-{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(&path, "scopeKey = 's'").unwrap();
        let result = UpdatesConfig::from_file(&path);
        let _ = std::fs::remove_file(&path);
        assert!(result.is_err());
    }

    #[test]
    fn test_from_file_yaml() {
        let path = std::env::temp_dir().join(format!("updates-config-{}.yaml", uuid::Uuid::new_v4()));
        std::fs::write(&path, "scopeKey: from-file\n").unwrap();
        let result = UpdatesConfig::from_file(&path);
        let _ = std::fs::remove_file(&path);
        assert_eq!(result.unwrap().scope_key(), Some("from-file"));
    }
}
