//! In-memory document store for tests and offline demos

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::Value;

use super::{DocumentStore, SearchFilter};
use crate::model::lenient::text_from_value;
use crate::{Error, Result};

/// Store holding documents in memory
///
/// Can be switched offline to exercise connection-failure handling, and
/// counts the lookups it serves so callers can observe caching.
#[derive(Debug, Default)]
pub struct MemoryStore {
    conversations: Vec<Value>,
    analytics: Vec<Value>,
    contexts: Vec<Value>,
    offline: AtomicBool,
    lookups: AtomicUsize,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_conversation(mut self, document: Value) -> Self {
        self.conversations.push(document);
        self
    }

    #[must_use]
    pub fn with_analytics(mut self, document: Value) -> Self {
        self.analytics.push(document);
        self
    }

    #[must_use]
    pub fn with_context(mut self, document: Value) -> Self {
        self.contexts.push(document);
        self
    }

    /// Make every subsequent call fail with a connection error
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of store calls served so far, including failed ones
    #[must_use]
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    fn begin(&self) -> Result<()> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::ConnectionFailure("memory store is offline".to_string()));
        }
        Ok(())
    }
}

fn field_is(document: &Value, field: &str, expected: &str) -> bool {
    document
        .get(field)
        .and_then(text_from_value)
        .is_some_and(|v| v == expected)
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn find_conversation(&self, id: &str) -> Result<Option<Value>> {
        self.begin()?;
        Ok(self
            .conversations
            .iter()
            .find(|c| field_is(c, "id", id) || field_is(c, "conversation_id", id))
            .cloned())
    }

    async fn find_analytics(&self, conversation_id: &str) -> Result<Option<Value>> {
        self.begin()?;
        Ok(self
            .analytics
            .iter()
            .find(|a| field_is(a, "conversation_id", conversation_id))
            .cloned())
    }

    async fn find_contexts(&self, conversation_id: &str, context_ids: &[String]) -> Result<Vec<Value>> {
        self.begin()?;
        Ok(self
            .contexts
            .iter()
            .filter(|c| {
                context_ids.iter().any(|id| field_is(c, "id", id))
                    || field_is(c, "conversation_id", conversation_id)
            })
            .cloned()
            .collect())
    }

    async fn search_conversations(&self, filter: &SearchFilter) -> Result<Vec<Value>> {
        self.begin()?;
        let skip = usize::try_from(filter.skip).unwrap_or(usize::MAX);
        let limit = usize::try_from(filter.limit).unwrap_or(usize::MAX);
        Ok(self
            .conversations
            .iter()
            .filter(|c| filter.matches(c))
            .skip(skip)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn ping(&self) -> Result<()> {
        self.begin()
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
