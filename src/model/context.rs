//! Context entries: artifacts the assistant consulted while answering

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::lenient;
use super::message::kind_of;

/// A non-message artifact (script, scene data, project structure) attached to
/// a conversation or message
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContextEntry {
    #[serde(default, deserialize_with = "lenient::text")]
    pub id: Option<String>,

    /// Free-form type tag, e.g. `script`, `gameobject`, `project_structure`;
    /// falls back to a legacy `context_type` field
    #[serde(default, rename = "type", deserialize_with = "lenient::text")]
    pub kind: Option<String>,

    /// Opaque payload, structured or textual
    #[serde(default)]
    pub data: Option<Value>,

    #[serde(default, deserialize_with = "lenient::timestamp")]
    pub timestamp: Option<i64>,

    #[serde(default, deserialize_with = "lenient::text")]
    pub conversation_id: Option<String>,

    #[serde(default, deserialize_with = "lenient::text")]
    pub message_id: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,

    /// Set when the stored document could not be decoded at all
    #[serde(skip)]
    pub malformed: Option<String>,
}

impl ContextEntry {
    /// Decode one stored document, substituting a placeholder on failure
    #[must_use]
    pub fn from_value(value: Value) -> Self {
        if !value.is_object() {
            return Self {
                malformed: Some(format!("expected a context object, found {}", kind_of(&value))),
                ..Self::default()
            };
        }
        let mut entry: Self = serde_json::from_value(value).unwrap_or_else(|e| Self {
            malformed: Some(e.to_string()),
            ..Self::default()
        });
        if entry.kind.is_none() {
            entry.kind = entry.extra.get("context_type").and_then(lenient::text_from_value);
        }
        entry
    }

    /// Type tag for display
    #[must_use]
    pub fn kind_label(&self) -> &str {
        self.kind.as_deref().unwrap_or("context")
    }
}

/// Decode stored context documents, one at a time
pub fn decode_contexts(values: &[Value]) -> Vec<ContextEntry> {
    values
        .iter()
        .map(|value| {
            let entry = ContextEntry::from_value(value.clone());
            if let Some(reason) = &entry.malformed {
                tracing::warn!(id = ?entry.id, reason = %reason, "malformed context record");
            }
            entry
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn decodes_context_entry() {
        let entry = ContextEntry::from_value(json!({
            "_id": { "$oid": "65a1b2c3d4e5f6a7b8c9d0e1" },
            "id": "ctx-1",
            "type": "script",
            "data": { "path": "Assets/Player.cs", "source": "class Player {}" },
            "timestamp": 150,
            "conversation_id": "conv-1"
        }));

        assert_eq!(entry.id.as_deref(), Some("ctx-1"));
        assert_eq!(entry.kind_label(), "script");
        assert_eq!(entry.timestamp, Some(150));
        assert_eq!(entry.data.unwrap()["path"], "Assets/Player.cs");
        assert!(entry.extra.contains_key("_id"));
    }

    #[test]
    fn untyped_entry_defaults_label() {
        let entry = ContextEntry::from_value(json!({ "id": "ctx-2" }));
        assert_eq!(entry.kind_label(), "context");
        assert!(entry.data.is_none());
    }

    #[test]
    fn non_object_is_malformed() {
        let entries = decode_contexts(&[json!(7)]);
        assert!(entries[0].malformed.is_some());
    }

    #[test]
    fn legacy_type_field_used_when_current_missing() {
        let legacy = ContextEntry::from_value(json!({ "id": "a", "context_type": "scene" }));
        assert_eq!(legacy.kind_label(), "scene");

        let both = ContextEntry::from_value(json!({ "id": "b", "type": "script", "context_type": "scene" }));
        assert!(both.malformed.is_none());
        assert_eq!(both.kind_label(), "script");
    }
}
