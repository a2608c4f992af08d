//! Pretty-printing of nested JSON payloads
//!
//! Context payloads are often JSON documents serialized into a string field.
//! Those strings are expanded in place so the whole structure indents together.

use serde_json::Value;

/// Placeholder for an absent payload
pub const NO_DATA: &str = "No data available";

/// Maximum depth of string-encoded JSON that gets expanded
const MAX_EXPANSION_DEPTH: usize = 8;

/// Pretty-print a value, expanding string fields that hold JSON objects or arrays
#[must_use]
pub fn pretty_json(value: &Value) -> String {
    let expanded = expand_nested(value.clone(), 0);
    serde_json::to_string_pretty(&expanded).unwrap_or_else(|_| expanded.to_string())
}

/// Human-readable rendering of an opaque payload
///
/// Plain strings are returned as-is (they are usually source code or prose);
/// structured values and string-encoded JSON are pretty-printed.
#[must_use]
pub fn display_payload(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => NO_DATA.to_string(),
        Some(Value::String(s)) if s.trim().is_empty() => NO_DATA.to_string(),
        Some(Value::String(s)) => parse_embedded(s).map_or_else(|| s.clone(), |v| pretty_json(&v)),
        Some(other) => pretty_json(other),
    }
}

fn expand_nested(value: Value, depth: usize) -> Value {
    if depth >= MAX_EXPANSION_DEPTH {
        return value;
    }

    match value {
        Value::String(s) => match parse_embedded(&s) {
            Some(inner) => expand_nested(inner, depth + 1),
            None => Value::String(s),
        },
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| expand_nested(item, depth + 1))
                .collect(),
        ),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k, expand_nested(v, depth + 1)))
                .collect(),
        ),
        other => other,
    }
}

/// Parse a string only if it looks like a JSON object or array
fn parse_embedded(s: &str) -> Option<Value> {
    let trimmed = s.trim();
    let looks_structured = (trimmed.starts_with('{') && trimmed.ends_with('}'))
        || (trimmed.starts_with('[') && trimmed.ends_with(']'));
    if !looks_structured {
        return None;
    }
    serde_json::from_str::<Value>(trimmed)
        .ok()
        .filter(|v| v.is_object() || v.is_array())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn expands_string_encoded_json() {
        let value = json!({ "scene": "{\"root\": [\"Main Camera\", \"Player\"]}" });
        let pretty = pretty_json(&value);
        assert!(pretty.contains("\"root\": ["));
        assert!(pretty.contains("\"Main Camera\""));
        assert!(!pretty.contains("\\\""));
    }

    #[test]
    fn leaves_plain_strings() {
        let value = json!({ "script": "public class Player : MonoBehaviour {}" });
        let pretty = pretty_json(&value);
        assert!(pretty.contains("public class Player : MonoBehaviour {}"));
    }

    #[test]
    fn payload_placeholder_for_missing_data() {
        assert_eq!(display_payload(None), NO_DATA);
        assert_eq!(display_payload(Some(&Value::Null)), NO_DATA);
        assert_eq!(display_payload(Some(&json!("  "))), NO_DATA);
    }

    #[test]
    fn payload_keeps_source_text() {
        let source = "using UnityEngine;\nclass A {}";
        assert_eq!(display_payload(Some(&json!(source))), source);
    }

    #[test]
    fn payload_pretty_prints_objects() {
        let pretty = display_payload(Some(&json!({ "a": { "b": 1 } })));
        assert_eq!(pretty, "{\n  \"a\": {\n    \"b\": 1\n  }\n}");
    }
}
