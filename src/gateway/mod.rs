//! Query gateway
//!
//! Looks conversations up by id or title, decodes them into typed records and
//! caches the results for a bounded time.

mod cache;

use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;

pub use cache::LookupCache;

use crate::Result;
use crate::config::CacheConfig;
use crate::format::TimeFormatter;
use crate::model::{
    AnalyticsRecord, ContextEntry, Conversation, ConversationSummary, Message, decode_contexts,
    decode_messages,
};
use crate::store::{DEFAULT_SEARCH_LIMIT, DocumentStore, SearchFilter};

/// Where a conversation's messages were read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageSource {
    /// `message_history` of the analytics record
    Analytics,
    /// History embedded in the conversation record
    Embedded,
}

/// Stored documents exactly as fetched, for the raw-data view
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawDocuments {
    pub conversation: Value,
    pub analytics: Option<Value>,
    pub contexts: Vec<Value>,
}

/// A conversation with everything needed to render it
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedConversation {
    pub conversation: Conversation,
    pub analytics: Option<AnalyticsRecord>,
    pub messages: Vec<Message>,
    pub contexts: Vec<ContextEntry>,
    pub message_source: MessageSource,
    pub raw: RawDocuments,
}

/// Title search with optional filters, as entered by a user
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TitleQuery {
    pub text: String,
    /// Ignored when zero
    pub min_messages: Option<u64>,
    /// Ignored when zero
    pub max_messages: Option<u64>,
    /// First message on or after the start of this local day
    pub start_date: Option<NaiveDate>,
    /// First message on or before the end of this local day
    pub end_date: Option<NaiveDate>,
    pub limit: Option<u64>,
    pub skip: Option<u64>,
}

impl TitleQuery {
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Store filter with dates resolved in the formatter's time zone
    #[must_use]
    pub fn to_filter(&self, formatter: &TimeFormatter) -> SearchFilter {
        SearchFilter {
            title: self.text.trim().to_string(),
            min_messages: self.min_messages.filter(|n| *n > 0),
            max_messages: self.max_messages.filter(|n| *n > 0),
            first_message_from: self.start_date.and_then(|d| formatter.start_of_day(d)),
            first_message_until: self.end_date.and_then(|d| formatter.end_of_day(d)),
            limit: self.limit.filter(|n| *n > 0).unwrap_or(DEFAULT_SEARCH_LIMIT),
            skip: self.skip.unwrap_or(0),
        }
    }
}

/// Cached, read-only access to conversations
#[derive(Clone)]
pub struct QueryGateway {
    store: Arc<dyn DocumentStore>,
    cache: LookupCache,
    formatter: TimeFormatter,
}

impl std::fmt::Debug for QueryGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryGateway")
            .field("store", &self.store.name())
            .field("cache", &self.cache)
            .field("formatter", &self.formatter)
            .finish()
    }
}

impl QueryGateway {
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, cache: CacheConfig, formatter: TimeFormatter) -> Self {
        Self {
            store,
            cache: LookupCache::new(cache),
            formatter,
        }
    }

    /// Formatter used to resolve search dates
    #[must_use]
    pub const fn formatter(&self) -> &TimeFormatter {
        &self.formatter
    }

    /// Load a conversation with its messages, analytics and context
    ///
    /// Returns `Ok(None)` when the id is blank or nothing matches it.
    ///
    /// # Errors
    ///
    /// Returns error if the document store cannot be reached
    pub async fn find_conversation_by_id(&self, id: &str) -> Result<Option<Arc<LoadedConversation>>> {
        let id = id.trim();
        if id.is_empty() {
            return Ok(None);
        }

        if let Some(cached) = self.cache.get_conversation(id) {
            tracing::debug!(id, "conversation cache hit");
            return Ok(cached);
        }

        let loaded = self.load_conversation(id).await?.map(Arc::new);
        self.cache.put_conversation(id, loaded.clone());
        Ok(loaded)
    }

    async fn load_conversation(&self, id: &str) -> Result<Option<LoadedConversation>> {
        let Some(raw_conversation) = self.store.find_conversation(id).await? else {
            tracing::info!(id, "conversation not found");
            return Ok(None);
        };
        let raw_analytics = self.store.find_analytics(id).await?;

        let conversation = Conversation::from_value(raw_conversation.clone());
        if let Some(reason) = &conversation.malformed {
            tracing::warn!(id, reason = %reason, "conversation record could not be decoded");
        }
        let analytics = raw_analytics.clone().map(AnalyticsRecord::from_value);

        let (stored_messages, message_source) = match &analytics {
            Some(record) if !record.message_history.is_empty() => {
                (record.message_history.as_slice(), MessageSource::Analytics)
            }
            _ => (conversation.embedded_messages(), MessageSource::Embedded),
        };
        let messages = decode_messages(stored_messages);

        let context_ids = referenced_contexts(&messages, &conversation);
        let raw_contexts = self.store.find_contexts(id, &context_ids).await?;
        let contexts = decode_contexts(&raw_contexts);

        tracing::info!(
            id,
            messages = messages.len(),
            contexts = contexts.len(),
            source = ?message_source,
            "conversation loaded"
        );

        Ok(Some(LoadedConversation {
            conversation,
            analytics,
            messages,
            contexts,
            message_source,
            raw: RawDocuments {
                conversation: raw_conversation,
                analytics: raw_analytics,
                contexts: raw_contexts,
            },
        }))
    }

    /// Summaries of conversations whose title contains the query text
    ///
    /// The text is matched literally and case-insensitively. No match is an
    /// empty list, not an error.
    ///
    /// # Errors
    ///
    /// Returns error if the document store cannot be reached
    pub async fn find_conversations_by_title(&self, query: &TitleQuery) -> Result<Vec<ConversationSummary>> {
        let filter = query.to_filter(&self.formatter);

        if let Some(cached) = self.cache.get_search(&filter) {
            tracing::debug!(title = %filter.title, "search cache hit");
            return Ok(cached.as_ref().clone());
        }

        let documents = self.store.search_conversations(&filter).await?;
        let summaries: Vec<ConversationSummary> = documents
            .into_iter()
            .map(Conversation::from_value)
            .filter(|c| c.malformed.is_none())
            .map(|c| ConversationSummary::from_conversation(&c))
            .collect();

        tracing::info!(title = %filter.title, results = summaries.len(), "conversation search");
        self.cache.put_search(filter, Arc::new(summaries.clone()));
        Ok(summaries)
    }

    /// Context entries for a conversation
    ///
    /// # Errors
    ///
    /// Returns error if the document store cannot be reached
    pub async fn find_context_for_conversation(&self, id: &str) -> Result<Vec<ContextEntry>> {
        Ok(self
            .find_conversation_by_id(id)
            .await?
            .map(|loaded| loaded.contexts.clone())
            .unwrap_or_default())
    }

    /// Check that the document store is reachable
    ///
    /// # Errors
    ///
    /// Returns error if the document store cannot be reached
    pub async fn ping(&self) -> Result<()> {
        self.store.ping().await
    }

    /// Name of the backing store
    #[must_use]
    pub fn store_name(&self) -> &'static str {
        self.store.name()
    }
}

/// Context ids referenced by messages or listed on the conversation, first
/// occurrence order, without duplicates
fn referenced_contexts(messages: &[Message], conversation: &Conversation) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();
    let candidates = messages
        .iter()
        .filter_map(|m| m.context_id.as_deref())
        .chain(conversation.context_ids.iter().map(String::as_str));
    for id in candidates {
        if !id.is_empty() && !ids.iter().any(|known| known == id) {
            ids.push(id.to_string());
        }
    }
    ids
}
