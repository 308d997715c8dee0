//! Manifest filter matching
//!
//! Filters arrive as a structured header and constrain which updates a
//! response may carry. They are checked against the manifest's `metadata`.

use serde_json::{Map, Value};

/// Whether `metadata` satisfies every filter.
///
/// Keys compare case-insensitively and values by their string form. A filter
/// whose key is absent from the metadata passes, as do absent filters or
/// absent metadata.
pub fn matches(filters: Option<&Map<String, Value>>, metadata: Option<&Value>) -> bool {
    let (Some(filters), Some(Value::Object(metadata))) = (filters, metadata) else {
        return true;
    };

    filters.iter().all(|(filter_key, filter_value)| {
        match metadata
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(filter_key))
        {
            Some((_, value)) => string_form(value) == string_form(filter_value),
            None => true,
        }
    })
}

fn string_form(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(v: Value) -> Map<String, Value> {
        match v {
            Value::Object(m) => m,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_matching_filters() {
        let filters = map(json!({ "branchname": "main", "weight": 10 }));
        let metadata = json!({ "branchName": "main", "weight": "10" });
        assert!(matches(Some(&filters), Some(&metadata)));
    }

    #[test]
    fn test_mismatched_filter_fails() {
        let filters = map(json!({ "branchname": "main" }));
        let metadata = json!({ "branchName": "staging" });
        assert!(!matches(Some(&filters), Some(&metadata)));
    }

    #[test]
    fn test_missing_key_or_inputs_pass() {
        let filters = map(json!({ "channel": "beta" }));
        assert!(matches(Some(&filters), Some(&json!({ "branchName": "main" }))));
        assert!(matches(None, Some(&json!({ "branchName": "main" }))));
        assert!(matches(Some(&filters), None));
        assert!(matches(Some(&filters), Some(&json!("not an object"))));
    }

    #[test]
    fn test_boolean_string_forms() {
        let filters = map(json!({ "enabled": true }));
        assert!(matches(Some(&filters), Some(&json!({ "enabled": "true" }))));
        assert!(!matches(Some(&filters), Some(&json!({ "enabled": false }))));
    }
}
