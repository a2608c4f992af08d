//! Conversation, analytics and function catalog records

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::lenient;
use super::message::{Message, kind_of};
use crate::format::{NO_CONTENT, preview};

/// Characters of message content shown in search previews
pub const PREVIEW_CHARS: usize = 100;

/// Title shown for conversations stored without one
pub const UNNAMED: &str = "Unnamed";

/// Which optional-field set a conversation record follows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(into = "String")]
pub enum SchemaVersion {
    /// Messages embedded under `message_history`
    V1,
    /// Messages embedded under `history`
    V2,
    /// An explicit version this dashboard has not seen before
    Other(u64),
    Unknown,
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V1 => f.write_str("v1"),
            Self::V2 => f.write_str("v2"),
            Self::Other(n) => write!(f, "v{n}"),
            Self::Unknown => f.write_str("Unknown"),
        }
    }
}

impl From<SchemaVersion> for String {
    fn from(version: SchemaVersion) -> Self {
        version.to_string()
    }
}

/// One parameter of a catalogued function
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionParameter {
    #[serde(default, deserialize_with = "lenient::text")]
    pub name: Option<String>,

    #[serde(default, rename = "type", deserialize_with = "lenient::text")]
    pub kind: Option<String>,

    #[serde(default, deserialize_with = "lenient::text")]
    pub description: Option<String>,
}

/// A capability surfaced to the assistant; descriptive only
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FunctionCatalogEntry {
    #[serde(default, deserialize_with = "lenient::text")]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "lenient::text")]
    pub description: Option<String>,

    #[serde(default, deserialize_with = "lenient::records")]
    pub parameters: Vec<FunctionParameter>,

    #[serde(default, deserialize_with = "lenient::strings")]
    pub tags: Vec<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Root conversation record from the application database
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    #[serde(default, deserialize_with = "lenient::text")]
    pub id: Option<String>,

    /// Legacy identifier field used by older producers
    #[serde(default, deserialize_with = "lenient::text")]
    pub conversation_id: Option<String>,

    #[serde(rename = "_id", default, deserialize_with = "lenient::text")]
    pub object_id: Option<String>,

    #[serde(default, deserialize_with = "lenient::text")]
    pub title: Option<String>,

    /// Embedded messages (schema v2); `Some` whenever the key holds an array
    #[serde(default, deserialize_with = "lenient::present_values")]
    pub history: Option<Vec<Value>>,

    /// Embedded messages (schema v1)
    #[serde(default, deserialize_with = "lenient::present_values")]
    pub message_history: Option<Vec<Value>>,

    #[serde(default, deserialize_with = "lenient::strings")]
    pub owners: Vec<String>,

    #[serde(default, deserialize_with = "lenient::strings")]
    pub tags: Vec<String>,

    #[serde(default, deserialize_with = "lenient::flag")]
    pub is_favorite: Option<bool>,

    #[serde(default, deserialize_with = "lenient::strings")]
    pub context_ids: Vec<String>,

    #[serde(default, deserialize_with = "lenient::timestamp")]
    pub created: Option<i64>,

    #[serde(default, deserialize_with = "lenient::timestamp")]
    pub updated: Option<i64>,

    #[serde(default, deserialize_with = "lenient::count")]
    pub schema_version: Option<u64>,

    #[serde(default, deserialize_with = "lenient::records")]
    pub function_catalog: Vec<FunctionCatalogEntry>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,

    /// Set when the stored document could not be decoded at all
    #[serde(skip)]
    pub malformed: Option<String>,
}

impl Conversation {
    /// Decode a stored document, substituting an empty record on failure
    #[must_use]
    pub fn from_value(value: Value) -> Self {
        if !value.is_object() {
            return Self {
                malformed: Some(format!(
                    "expected a conversation object, found {}",
                    kind_of(&value)
                )),
                ..Self::default()
            };
        }
        serde_json::from_value(value).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "malformed conversation record");
            Self {
                malformed: Some(e.to_string()),
                ..Self::default()
            }
        })
    }

    /// Best available identifier: `id`, then `conversation_id`, then `_id`
    #[must_use]
    pub fn display_id(&self) -> Option<&str> {
        self.id
            .as_deref()
            .or(self.conversation_id.as_deref())
            .or(self.object_id.as_deref())
    }

    #[must_use]
    pub fn display_title(&self) -> &str {
        self.title
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(UNNAMED)
    }

    /// Explicit schema version, or the one implied by which history field is present
    #[must_use]
    pub fn schema_version(&self) -> SchemaVersion {
        match self.schema_version {
            Some(1) => SchemaVersion::V1,
            Some(2) => SchemaVersion::V2,
            Some(n) => SchemaVersion::Other(n),
            None if self.history.is_some() => SchemaVersion::V2,
            None if self.message_history.is_some() => SchemaVersion::V1,
            None => SchemaVersion::Unknown,
        }
    }

    /// Messages embedded in the record itself
    #[must_use]
    pub fn embedded_messages(&self) -> &[Value] {
        match (self.history.as_deref(), self.message_history.as_deref()) {
            (Some(history), _) if !history.is_empty() => history,
            (_, Some(legacy)) => legacy,
            (history, None) => history.unwrap_or_default(),
        }
    }

    /// Names of the catalogued functions
    #[must_use]
    pub fn function_names(&self) -> Vec<&str> {
        self.function_catalog
            .iter()
            .filter_map(|f| f.name.as_deref())
            .filter(|n| !n.is_empty())
            .collect()
    }
}

/// Per-conversation analytics document from the feedback database
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsRecord {
    #[serde(default, deserialize_with = "lenient::text")]
    pub conversation_id: Option<String>,

    #[serde(default, deserialize_with = "lenient::values")]
    pub message_history: Vec<Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AnalyticsRecord {
    /// Decode a stored document; a non-object decodes to an empty record
    #[must_use]
    pub fn from_value(value: Value) -> Self {
        serde_json::from_value(value).unwrap_or_default()
    }
}

/// One row of a title search
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversationSummary {
    pub id: String,
    pub title: String,
    pub message_count: usize,
    pub is_favorite: bool,
    pub tags: Vec<String>,
    pub owners: Vec<String>,
    pub first_message: String,
    pub last_message: String,
    /// Timestamp of the first message
    pub created_at: Option<i64>,
    /// Timestamp of the last message
    pub updated_at: Option<i64>,
    /// Comma-joined function names, or `None`
    pub available_functions: String,
}

impl ConversationSummary {
    /// Summarize a conversation from its embedded history
    #[must_use]
    pub fn from_conversation(conversation: &Conversation) -> Self {
        let history = conversation.embedded_messages();
        let first = history.first().cloned().map(Message::from_value);
        let last = history.last().cloned().map(Message::from_value);

        let excerpt = |message: Option<&Message>| {
            message
                .and_then(|m| m.content.as_deref())
                .filter(|c| !c.trim().is_empty())
                .map_or_else(|| NO_CONTENT.to_string(), |c| preview(c, PREVIEW_CHARS))
        };

        let functions = conversation.function_names();

        Self {
            id: conversation.display_id().unwrap_or_default().to_string(),
            title: conversation.display_title().to_string(),
            message_count: history.len(),
            is_favorite: conversation.is_favorite.unwrap_or(false),
            tags: conversation.tags.clone(),
            owners: conversation.owners.clone(),
            first_message: excerpt(first.as_ref()),
            last_message: excerpt(last.as_ref()),
            created_at: first.as_ref().and_then(|m| m.timestamp),
            updated_at: last.as_ref().and_then(|m| m.timestamp),
            available_functions: if functions.is_empty() {
                "None".to_string()
            } else {
                functions.join(", ")
            },
        }
    }
}
