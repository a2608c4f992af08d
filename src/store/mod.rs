//! Document store access
//!
//! The dashboard only reads. Each implementation of [`DocumentStore`] hands back
//! raw JSON documents; decoding into typed records happens in [`crate::model`].

mod memory;
mod mongo;

use async_trait::async_trait;
use regex::{Regex, RegexBuilder};
use serde_json::Value;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

use crate::Result;
use crate::model::lenient::timestamp_from_value;

/// Default cap on search results
pub const DEFAULT_SEARCH_LIMIT: u64 = 1000;

/// Read-only access to the conversation databases
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Conversation document whose `id` or `conversation_id` equals `id`
    async fn find_conversation(&self, id: &str) -> Result<Option<Value>>;

    /// Analytics document for a conversation
    async fn find_analytics(&self, conversation_id: &str) -> Result<Option<Value>>;

    /// Context documents with one of `context_ids`, or linked to the conversation
    async fn find_contexts(&self, conversation_id: &str, context_ids: &[String]) -> Result<Vec<Value>>;

    /// Conversation documents matching a search filter, in stored order
    async fn search_conversations(&self, filter: &SearchFilter) -> Result<Vec<Value>>;

    /// Check that the store is reachable
    async fn ping(&self) -> Result<()>;

    /// Short name for logs
    fn name(&self) -> &'static str;
}

/// Criteria for a conversation search
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SearchFilter {
    /// Title substring, matched literally and case-insensitively
    pub title: String,
    pub min_messages: Option<u64>,
    pub max_messages: Option<u64>,
    /// Inclusive lower bound on the first message timestamp (epoch ms)
    pub first_message_from: Option<i64>,
    /// Inclusive upper bound on the first message timestamp (epoch ms)
    pub first_message_until: Option<i64>,
    pub limit: u64,
    pub skip: u64,
}

impl Default for SearchFilter {
    fn default() -> Self {
        Self {
            title: String::new(),
            min_messages: None,
            max_messages: None,
            first_message_from: None,
            first_message_until: None,
            limit: DEFAULT_SEARCH_LIMIT,
            skip: 0,
        }
    }
}

impl SearchFilter {
    /// Filter on title alone
    #[must_use]
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Regex source matching the title as a literal, or `None` for "any title"
    #[must_use]
    pub fn title_pattern(&self) -> Option<String> {
        let title = self.title.trim();
        (!title.is_empty()).then(|| regex::escape(title))
    }

    fn title_regex(&self) -> Option<Regex> {
        self.title_pattern().and_then(|pattern| {
            RegexBuilder::new(&pattern)
                .case_insensitive(true)
                .build()
                .ok()
        })
    }

    /// Evaluate the filter against one conversation document
    ///
    /// Mirrors the query the MongoDB store sends; used by the in-memory store.
    #[must_use]
    pub fn matches(&self, document: &Value) -> bool {
        if let Some(re) = self.title_regex() {
            let title = document.get("title").and_then(Value::as_str);
            if !title.is_some_and(|t| re.is_match(t)) {
                return false;
            }
        }

        let history = document.get("history").and_then(Value::as_array);
        let count = history.map_or(0, Vec::len) as u64;
        if self.min_messages.is_some_and(|min| count < min) {
            return false;
        }
        if self.max_messages.is_some_and(|max| count > max) {
            return false;
        }

        if self.first_message_from.is_some() || self.first_message_until.is_some() {
            let first = history
                .and_then(|h| h.first())
                .and_then(|m| m.get("timestamp"))
                .and_then(timestamp_from_value);
            let Some(first) = first else {
                return false;
            };
            if self.first_message_from.is_some_and(|from| first < from) {
                return false;
            }
            if self.first_message_until.is_some_and(|until| first > until) {
                return false;
            }
        }

        true
    }
}
