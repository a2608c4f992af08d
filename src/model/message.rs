//! Conversation messages and their classification metadata

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use super::lenient;

/// Who authored a message
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Role {
    User,
    Assistant,
    System,
    /// Any other label, lowercased; `"unknown"` when the field is missing
    Other(String),
}

impl Default for Role {
    fn default() -> Self {
        Self::Other("unknown".to_string())
    }
}

impl Role {
    /// Parse a stored role label (case-insensitive)
    #[must_use]
    pub fn parse(label: &str) -> Self {
        let label = label.trim().to_lowercase();
        match label.as_str() {
            "user" | "human" => Self::User,
            "assistant" | "ai" | "bot" => Self::Assistant,
            "system" => Self::System,
            "" => Self::default(),
            _ => Self::Other(label),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::System => "system",
            Self::Other(label) => label,
        }
    }

    /// Label with the first letter capitalized, for headers
    #[must_use]
    pub fn title(&self) -> String {
        let mut chars = self.as_str().chars();
        chars.next().map_or_else(String::new, |first| {
            first.to_uppercase().chain(chars).collect()
        })
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Role {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value
            .as_ref()
            .and_then(Value::as_str)
            .map_or_else(Self::default, Self::parse))
    }
}

/// Sentiment assigned by the upstream classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

impl Sentiment {
    /// Parse a classifier label; unrecognized labels yield `None`
    #[must_use]
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "positive" => Some(Self::Positive),
            "neutral" => Some(Self::Neutral),
            "negative" => Some(Self::Negative),
            _ => None,
        }
    }
}

/// How much outside knowledge a question needs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum KnowledgeLevel {
    None,
    Intermediate,
    Advanced,
}

impl KnowledgeLevel {
    /// Parse a classifier label; unrecognized labels yield `None`
    #[must_use]
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "none" | "basic" => Some(Self::None),
            "intermediate" => Some(Self::Intermediate),
            "advanced" => Some(Self::Advanced),
            _ => None,
        }
    }
}

/// Classification results attached to a message by an upstream analysis process
///
/// Older producers used shorter field names. Records migrated in place can
/// carry both spellings; the current name wins.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "ClassificationRecord")]
pub struct Classification {
    pub user_language: Option<String>,

    /// Safety verdict; `Some(false)` marks flagged content
    pub is_safe: Option<bool>,

    pub unity_topics: Vec<String>,

    pub sentiment: Option<String>,

    pub external_knowledge: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Deserialize)]
struct ClassificationRecord {
    #[serde(default, deserialize_with = "lenient::text")]
    user_language: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    language: Option<String>,

    #[serde(default, deserialize_with = "lenient::flag")]
    is_safe: Option<bool>,
    #[serde(default, deserialize_with = "lenient::flag")]
    safe: Option<bool>,

    #[serde(default, deserialize_with = "lenient::strings")]
    unity_topics: Vec<String>,
    #[serde(default, deserialize_with = "lenient::strings")]
    topics: Vec<String>,

    #[serde(default, deserialize_with = "lenient::text")]
    sentiment: Option<String>,

    #[serde(default, deserialize_with = "lenient::text")]
    external_knowledge: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    knowledge_level: Option<String>,

    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl From<ClassificationRecord> for Classification {
    fn from(raw: ClassificationRecord) -> Self {
        Self {
            user_language: raw.user_language.or(raw.language),
            is_safe: raw.is_safe.or(raw.safe),
            unity_topics: if raw.unity_topics.is_empty() {
                raw.topics
            } else {
                raw.unity_topics
            },
            sentiment: raw.sentiment,
            external_knowledge: raw.external_knowledge.or(raw.knowledge_level),
            extra: raw.extra,
        }
    }
}

impl Classification {
    /// Parsed sentiment, if the label is one of the known ones
    #[must_use]
    pub fn sentiment(&self) -> Option<Sentiment> {
        self.sentiment.as_deref().and_then(Sentiment::parse)
    }

    /// Parsed knowledge level, if the label is one of the known ones
    #[must_use]
    pub fn knowledge_level(&self) -> Option<KnowledgeLevel> {
        self.external_knowledge.as_deref().and_then(KnowledgeLevel::parse)
    }
}

/// Token and latency figures recorded for a message
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "MetricsRecord")]
pub struct PerformanceMetrics {
    pub prompt_tokens: Option<u64>,

    pub completion_tokens: Option<u64>,

    pub total_tokens: Option<u64>,

    pub latency_ms: Option<f64>,

    pub time_to_first_token_ms: Option<f64>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Deserialize)]
struct MetricsRecord {
    #[serde(default, deserialize_with = "lenient::count")]
    prompt_tokens: Option<u64>,
    #[serde(default, deserialize_with = "lenient::count")]
    input_tokens: Option<u64>,

    #[serde(default, deserialize_with = "lenient::count")]
    completion_tokens: Option<u64>,
    #[serde(default, deserialize_with = "lenient::count")]
    output_tokens: Option<u64>,

    #[serde(default, deserialize_with = "lenient::count")]
    total_tokens: Option<u64>,

    #[serde(default, deserialize_with = "lenient::number")]
    latency_ms: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    latency: Option<f64>,

    #[serde(default, deserialize_with = "lenient::number")]
    time_to_first_token_ms: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    ttft_ms: Option<f64>,

    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl From<MetricsRecord> for PerformanceMetrics {
    fn from(raw: MetricsRecord) -> Self {
        Self {
            prompt_tokens: raw.prompt_tokens.or(raw.input_tokens),
            completion_tokens: raw.completion_tokens.or(raw.output_tokens),
            total_tokens: raw.total_tokens,
            latency_ms: raw.latency_ms.or(raw.latency),
            time_to_first_token_ms: raw.time_to_first_token_ms.or(raw.ttft_ms),
            extra: raw.extra,
        }
    }
}

impl PerformanceMetrics {
    /// Total tokens, summing prompt and completion when no total was recorded
    #[must_use]
    pub fn tokens(&self) -> Option<u64> {
        self.total_tokens.or_else(|| match (self.prompt_tokens, self.completion_tokens) {
            (None, None) => None,
            (p, c) => Some(p.unwrap_or(0) + c.unwrap_or(0)),
        })
    }
}

/// One message of a conversation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "MessageRecord")]
pub struct Message {
    pub id: Option<String>,

    pub role: Role,

    pub content: Option<String>,

    pub timestamp: Option<i64>,

    /// Context entry consulted when producing this message
    pub context_id: Option<String>,

    #[serde(rename = "front_desk_classification_results")]
    pub classification: Option<Classification>,

    #[serde(rename = "performance_metrics")]
    pub metrics: Option<PerformanceMetrics>,

    pub is_internal_unity: Option<bool>,

    pub opt_status: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,

    /// Set when the stored element could not be decoded at all
    #[serde(skip)]
    pub malformed: Option<String>,
}

#[derive(Deserialize)]
struct MessageRecord {
    #[serde(default, deserialize_with = "lenient::text")]
    id: Option<String>,

    #[serde(default)]
    role: Role,

    #[serde(default, deserialize_with = "lenient::text")]
    content: Option<String>,

    #[serde(default, deserialize_with = "lenient::timestamp")]
    timestamp: Option<i64>,

    #[serde(default, deserialize_with = "lenient::text")]
    context_id: Option<String>,

    #[serde(default, deserialize_with = "lenient::record")]
    front_desk_classification_results: Option<Classification>,
    #[serde(default, deserialize_with = "lenient::record")]
    classification: Option<Classification>,

    #[serde(default, deserialize_with = "lenient::record")]
    performance_metrics: Option<PerformanceMetrics>,
    #[serde(default, deserialize_with = "lenient::record")]
    metrics: Option<PerformanceMetrics>,

    #[serde(default, deserialize_with = "lenient::flag")]
    is_internal_unity: Option<bool>,

    #[serde(default, deserialize_with = "lenient::text")]
    opt_status: Option<String>,

    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl From<MessageRecord> for Message {
    fn from(raw: MessageRecord) -> Self {
        Self {
            id: raw.id,
            role: raw.role,
            content: raw.content,
            timestamp: raw.timestamp,
            context_id: raw.context_id,
            classification: raw.front_desk_classification_results.or(raw.classification),
            metrics: raw.performance_metrics.or(raw.metrics),
            is_internal_unity: raw.is_internal_unity,
            opt_status: raw.opt_status,
            extra: raw.extra,
            malformed: None,
        }
    }
}

impl Message {
    /// Placeholder for a stored element that is not a message object
    #[must_use]
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self {
            malformed: Some(reason.into()),
            ..Self::default()
        }
    }

    /// Decode one stored element, substituting a placeholder on failure
    #[must_use]
    pub fn from_value(value: Value) -> Self {
        if !value.is_object() {
            return Self::malformed(format!("expected a message object, found {}", kind_of(&value)));
        }
        serde_json::from_value(value).unwrap_or_else(|e| Self::malformed(e.to_string()))
    }

    /// Required fields that are missing from the stored record
    #[must_use]
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.role == Role::default() {
            missing.push("role");
        }
        if self.content.is_none() {
            missing.push("content");
        }
        if self.timestamp.is_none() {
            missing.push("timestamp");
        }
        missing
    }

    /// Whether the producer marked the user as opted in
    #[must_use]
    pub fn opted_in(&self) -> bool {
        self.opt_status
            .as_deref()
            .is_some_and(|s| s.trim().eq_ignore_ascii_case("in"))
    }
}

/// Decode a stored message list, one element at a time
pub fn decode_messages(values: &[Value]) -> Vec<Message> {
    values
        .iter()
        .enumerate()
        .map(|(index, value)| {
            let message = Message::from_value(value.clone());
            if let Some(reason) = &message.malformed {
                tracing::warn!(index, reason = %reason, "malformed message record");
            }
            message
        })
        .collect()
}

pub(crate) const fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn decodes_full_message() {
        let message = Message::from_value(json!({
            "id": "m1",
            "role": "User",
            "content": "How do I move a **Rigidbody**?",
            "timestamp": 1_700_000_000_000_i64,
            "context_id": "ctx-1",
            "front_desk_classification_results": {
                "user_language": "English",
                "unity_topics": ["Physics", "Scripting"],
                "sentiment": "Positive",
                "external_knowledge": "intermediate",
                "is_safe": true,
                "model_version": "fd-3"
            },
            "performance_metrics": { "prompt_tokens": 120, "completion_tokens": "80", "latency_ms": 950.5 },
            "opt_status": "IN",
            "client": "editor"
        }));

        assert!(message.malformed.is_none());
        assert_eq!(message.role, Role::User);
        assert_eq!(message.timestamp, Some(1_700_000_000_000));
        assert!(message.opted_in());

        let classification = message.classification.unwrap();
        assert_eq!(classification.sentiment(), Some(Sentiment::Positive));
        assert_eq!(classification.knowledge_level(), Some(KnowledgeLevel::Intermediate));
        assert_eq!(classification.unity_topics, vec!["Physics", "Scripting"]);
        assert_eq!(classification.extra["model_version"], "fd-3");

        let metrics = message.metrics.unwrap();
        assert_eq!(metrics.tokens(), Some(200));
        assert_eq!(metrics.latency_ms, Some(950.5));

        assert_eq!(message.extra["client"], "editor");
    }

    #[test]
    fn tolerates_missing_and_mistyped_fields() {
        let message = Message::from_value(json!({
            "timestamp": "not a time",
            "front_desk_classification_results": "oops",
            "content": 42
        }));

        assert!(message.malformed.is_none());
        assert_eq!(message.role, Role::default());
        assert_eq!(message.timestamp, None);
        assert!(message.classification.is_none());
        assert_eq!(message.content.as_deref(), Some("42"));
        assert_eq!(message.missing_fields(), vec!["role", "timestamp"]);
    }

    #[test]
    fn non_object_becomes_placeholder() {
        let messages = decode_messages(&[json!("just text"), json!({ "role": "assistant" })]);
        assert_eq!(messages.len(), 2);
        assert!(messages[0].malformed.as_deref().unwrap().contains("a string"));
        assert_eq!(messages[1].role, Role::Assistant);
    }

    #[test]
    fn role_labels() {
        assert_eq!(Role::parse(" ASSISTANT "), Role::Assistant);
        assert_eq!(Role::parse("tool"), Role::Other("tool".to_string()));
        assert_eq!(Role::parse("tool").title(), "Tool");
        assert_eq!(Role::default().title(), "Unknown");
    }

    #[test]
    fn migrated_records_keep_both_spellings() {
        let message = Message::from_value(json!({
            "role": "user",
            "content": "hi",
            "classification": { "sentiment": "negative" },
            "front_desk_classification_results": {
                "topics": ["Old"],
                "unity_topics": ["UI"],
                "language": "French",
                "user_language": "English",
                "sentiment": "positive",
                "knowledge_level": "advanced",
                "safe": true,
                "is_safe": false
            },
            "metrics": { "total_tokens": 1 },
            "performance_metrics": { "input_tokens": 3, "prompt_tokens": 5, "latency": 1.0 }
        }));

        assert!(message.malformed.is_none());
        let classification = message.classification.unwrap();
        assert_eq!(classification.unity_topics, vec!["UI"]);
        assert_eq!(classification.user_language.as_deref(), Some("English"));
        assert_eq!(classification.sentiment(), Some(Sentiment::Positive));
        assert_eq!(classification.knowledge_level(), Some(KnowledgeLevel::Advanced));
        assert_eq!(classification.is_safe, Some(false));

        let metrics = message.metrics.unwrap();
        assert_eq!(metrics.prompt_tokens, Some(5));
        assert_eq!(metrics.latency_ms, Some(1.0));
        assert_eq!(metrics.total_tokens, None);
    }

    #[test]
    fn legacy_names_alone_still_decode() {
        let message = Message::from_value(json!({
            "role": "assistant",
            "classification": { "topics": "Audio", "language": "German", "safe": "no" },
            "metrics": { "input_tokens": 2, "output_tokens": 3, "ttft_ms": 40 }
        }));

        let classification = message.classification.unwrap();
        assert_eq!(classification.unity_topics, vec!["Audio"]);
        assert_eq!(classification.user_language.as_deref(), Some("German"));
        assert_eq!(classification.is_safe, Some(false));

        let metrics = message.metrics.unwrap();
        assert_eq!(metrics.tokens(), Some(5));
        assert_eq!(metrics.time_to_first_token_ms, Some(40.0));
    }
}
