//! Shared test utilities

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use muse_dashboard::api::ApiServerBuilder;
use muse_dashboard::config::CacheConfig;
use muse_dashboard::{MemoryStore, QueryGateway, TimeFormatter};
use serde_json::{Value, json};

/// Conversation with two embedded v2 messages and an analytics record
pub const FLAPPY_ID: &str = "conv-flappy";

/// Conversation without analytics or messages
pub const EMPTY_ID: &str = "conv-empty";

pub fn flappy_conversation() -> Value {
    json!({
        "id": FLAPPY_ID,
        "title": "Flappy Bird Clone",
        "owners": ["ana@example.com"],
        "tags": ["games"],
        "is_favorite": true,
        "created": 1_704_067_200_000_i64,
        "updated": 1_704_070_800_000_i64,
        "history": [
            {"role": "user", "content": "How do I make a flappy bird game?", "timestamp": 1_704_067_200_000_i64},
            {"role": "assistant", "content": "Start with a `Rigidbody2D`.", "timestamp": 1_704_067_260_000_i64}
        ]
    })
}

pub fn flappy_analytics() -> Value {
    json!({
        "conversation_id": FLAPPY_ID,
        "message_history": [
            {
                "role": "user",
                "content": "How do I make a flappy bird game?",
                "timestamp": 1_704_067_200_000_i64,
                "front_desk_classification_results": {
                    "user_language": "English",
                    "unity_topics": ["Physics"],
                    "sentiment": "positive",
                    "external_knowledge": "basic"
                }
            },
            {
                "role": "assistant",
                "content": "Start with a `Rigidbody2D`.",
                "timestamp": 1_704_067_260_000_i64,
                "context_id": "ctx-1"
            }
        ]
    })
}

pub fn flappy_context() -> Value {
    json!({
        "id": "ctx-1",
        "conversation_id": FLAPPY_ID,
        "type": "documentation",
        "data": {"page": "Rigidbody2D <manual>"},
        "timestamp": 1_704_067_230_000_i64
    })
}

pub fn gadget_conversation() -> Value {
    json!({
        "id": "conv-gadget",
        "title": "Inventory gadget",
        "message_history": [
            {"role": "user", "content": "Show me an inventory", "timestamp": 1_704_153_600_000_i64}
        ]
    })
}

pub fn empty_conversation() -> Value {
    json!({"id": EMPTY_ID, "title": "Nothing here"})
}

/// Memory store seeded with every fixture
pub fn seeded_store() -> Arc<MemoryStore> {
    Arc::new(
        MemoryStore::new()
            .with_conversation(flappy_conversation())
            .with_analytics(flappy_analytics())
            .with_context(flappy_context())
            .with_conversation(gadget_conversation())
            .with_conversation(empty_conversation()),
    )
}

pub fn test_cache() -> CacheConfig {
    CacheConfig {
        ttl: Duration::from_secs(60),
        capacity: 64,
    }
}

/// Gateway over the given store, formatting times in UTC
pub fn build_gateway(store: Arc<MemoryStore>) -> QueryGateway {
    QueryGateway::new(store, test_cache(), TimeFormatter::utc())
}

/// Full dashboard router over the given store, without summaries
pub fn build_test_router(store: Arc<MemoryStore>) -> axum::Router {
    ApiServerBuilder::new(build_gateway(store), 0).build().router()
}
