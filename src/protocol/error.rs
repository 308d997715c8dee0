//! Manifest resolution error types

/// Fatal structural errors raised while resolving a manifest.
///
/// Any of these aborts resolution of the whole manifest; no partial
/// [`Update`](crate::update::Update) is ever returned.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ManifestError {
    #[error("Manifest is missing required field '{field}'{}", .hint.as_ref().map(|h| format!("\n Hint: {}", h)).unwrap_or_default())]
    MissingField {
        field: String,
        hint: Option<String>,
    },

    #[error("Manifest field '{field}' is not a valid UUID: {value}")]
    InvalidUuid { field: String, value: String },

    #[error("Manifest field '{field}' is not a valid URL: {value} ({reason})")]
    InvalidUrl {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Manifest field '{field}' is not a valid timestamp: {value}")]
    InvalidTimestamp { field: String, value: String },

    #[error("Unsupported protocol version {}{}", .version.map(|v| v.to_string()).unwrap_or_else(|| "(absent)".to_string()), .hint.as_ref().map(|h| format!("\n Hint: {}", h)).unwrap_or_default())]
    UnsupportedProtocolVersion {
        version: Option<i64>,
        hint: Option<String>,
    },

    #[error("Updates configuration is missing a scope key{}", .hint.as_ref().map(|h| format!("\n Hint: {}", h)).unwrap_or_default())]
    MissingScopeKey { hint: Option<String> },

    #[error("Malformed manifest: {0}")]
    Malformed(String),

    #[error("Invalid asset list: {0}")]
    InvalidAssetList(String),

    #[error("Update {update_id} does not match the manifest filters of its response")]
    MismatchedManifestFilters { update_id: uuid::Uuid },

    #[error("No compatible update found at {url}. Only {supported} are supported.")]
    NoCompatibleUpdate { url: String, supported: String },
}

impl ManifestError {
    pub(crate) fn missing(field: impl Into<String>) -> Self {
        ManifestError::MissingField {
            field: field.into(),
            hint: None,
        }
    }

    /// Attach an actionable hint to the error
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        let hint_val = Some(hint.into());
        match self {
            ManifestError::MissingField { ref mut hint, .. } => *hint = hint_val,
            ManifestError::UnsupportedProtocolVersion { ref mut hint, .. } => *hint = hint_val,
            ManifestError::MissingScopeKey { ref mut hint } => *hint = hint_val,
            _ => (),
        }
        self
    }
}

impl From<serde_json::Error> for ManifestError {
    fn from(e: serde_json::Error) -> Self {
        ManifestError::Malformed(e.to_string())
    }
}
