//! Bounded TTL cache for gateway lookups

use std::sync::Arc;

use mini_moka::sync::Cache;

use super::LoadedConversation;
use crate::config::CacheConfig;
use crate::model::ConversationSummary;
use crate::store::SearchFilter;

/// One cache per lookup kind, sharing capacity and TTL settings
///
/// Only successful lookups are inserted. A cached `None` records that the
/// conversation did not exist when it was looked up.
#[derive(Clone)]
pub struct LookupCache {
    conversations: Cache<String, Option<Arc<LoadedConversation>>>,
    searches: Cache<SearchFilter, Arc<Vec<ConversationSummary>>>,
}

impl std::fmt::Debug for LookupCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LookupCache")
            .field("conversations", &self.conversations.entry_count())
            .field("searches", &self.searches.entry_count())
            .finish()
    }
}

impl LookupCache {
    #[must_use]
    pub fn new(config: CacheConfig) -> Self {
        Self {
            conversations: Cache::builder()
                .max_capacity(config.capacity)
                .time_to_live(config.ttl)
                .build(),
            searches: Cache::builder()
                .max_capacity(config.capacity)
                .time_to_live(config.ttl)
                .build(),
        }
    }

    #[must_use]
    pub fn get_conversation(&self, id: &str) -> Option<Option<Arc<LoadedConversation>>> {
        self.conversations.get(&id.to_string())
    }

    pub fn put_conversation(&self, id: &str, value: Option<Arc<LoadedConversation>>) {
        self.conversations.insert(id.to_string(), value);
    }

    #[must_use]
    pub fn get_search(&self, filter: &SearchFilter) -> Option<Arc<Vec<ConversationSummary>>> {
        self.searches.get(filter)
    }

    pub fn put_search(&self, filter: SearchFilter, value: Arc<Vec<ConversationSummary>>) {
        self.searches.insert(filter, value);
    }

    /// Drop every cached entry
    pub fn clear(&self) {
        self.conversations.invalidate_all();
        self.searches.invalidate_all();
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn entries_expire_after_ttl() {
        let cache = LookupCache::new(CacheConfig {
            ttl: Duration::from_millis(50),
            capacity: 8,
        });
        cache.put_conversation("gone", None);
        assert_eq!(cache.get_conversation("gone"), Some(None));

        std::thread::sleep(Duration::from_millis(120));
        assert!(cache.get_conversation("gone").is_none());
    }

    #[test]
    fn searches_keyed_by_full_filter() {
        let cache = LookupCache::new(CacheConfig::default());
        cache.put_search(SearchFilter::title("bird"), Arc::new(Vec::new()));

        assert!(cache.get_search(&SearchFilter::title("bird")).is_some());
        let limited = SearchFilter {
            limit: 5,
            ..SearchFilter::title("bird")
        };
        assert!(cache.get_search(&limited).is_none());

        cache.clear();
        assert!(cache.get_search(&SearchFilter::title("bird")).is_none());
    }
}
