//! Conversation overview: identity, message statistics and metadata

use std::collections::BTreeSet;

use serde::Serialize;

use super::style::language_flag;
use crate::format::TimeFormatter;
use crate::gateway::{LoadedConversation, MessageSource};
use crate::model::{KnowledgeLevel, Message, Role, Sentiment};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SentimentCounts {
    pub positive: usize,
    pub neutral: usize,
    pub negative: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ComplexityCounts {
    pub basic: usize,
    pub intermediate: usize,
    pub advanced: usize,
}

/// Message totals per role, and classifier tallies over user messages
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MessageStats {
    pub total: usize,
    pub user: usize,
    pub assistant: usize,
    pub other: usize,
    pub sentiment: SentimentCounts,
    pub complexity: ComplexityCounts,
}

impl MessageStats {
    /// Tally messages; a user message without a sentiment counts as neutral
    /// and one without a knowledge level counts as basic
    #[must_use]
    pub fn collect(messages: &[Message]) -> Self {
        let mut stats = Self {
            total: messages.len(),
            ..Self::default()
        };

        for message in messages {
            match message.role {
                Role::User => stats.user += 1,
                Role::Assistant => stats.assistant += 1,
                _ => stats.other += 1,
            }
            if message.role != Role::User {
                continue;
            }

            let classification = message.classification.as_ref();
            match classification.and_then(|c| c.sentiment.as_deref()) {
                None => stats.sentiment.neutral += 1,
                Some(label) => match Sentiment::parse(label) {
                    Some(Sentiment::Positive) => stats.sentiment.positive += 1,
                    Some(Sentiment::Neutral) => stats.sentiment.neutral += 1,
                    Some(Sentiment::Negative) => stats.sentiment.negative += 1,
                    None => {}
                },
            }
            match classification.and_then(|c| c.external_knowledge.as_deref()) {
                None => stats.complexity.basic += 1,
                Some(label) => match KnowledgeLevel::parse(label) {
                    Some(KnowledgeLevel::None) => stats.complexity.basic += 1,
                    Some(KnowledgeLevel::Intermediate) => stats.complexity.intermediate += 1,
                    Some(KnowledgeLevel::Advanced) => stats.complexity.advanced += 1,
                    None => {}
                },
            }
        }

        stats
    }
}

/// Flags and classification drawn from the conversation's messages
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetadataView {
    /// From the first message
    pub internal_unity: bool,
    /// From the first message
    pub opted_in: bool,
    /// Language of the first message
    pub language: Option<String>,
    pub language_flag: Option<&'static str>,
    /// Sorted union of every message's topics
    pub topics: Vec<String>,
}

impl MetadataView {
    #[must_use]
    pub fn collect(messages: &[Message]) -> Self {
        let first = messages.first();
        let language = first
            .and_then(|m| m.classification.as_ref())
            .and_then(|c| c.user_language.clone())
            .filter(|l| !l.trim().is_empty());

        let topics: BTreeSet<&str> = messages
            .iter()
            .filter_map(|m| m.classification.as_ref())
            .flat_map(|c| c.unity_topics.iter().map(String::as_str))
            .collect();

        Self {
            internal_unity: first.and_then(|m| m.is_internal_unity).unwrap_or(false),
            opted_in: first.is_some_and(Message::opted_in),
            language_flag: language.as_deref().map(language_flag),
            language,
            topics: topics.into_iter().map(str::to_string).collect(),
        }
    }
}

/// Header block of the conversation view
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversationOverview {
    pub id: String,
    pub title: String,
    pub schema: String,
    pub created: Option<String>,
    pub updated: Option<String>,
    pub owners: Vec<String>,
    pub tags: Vec<String>,
    pub favorite: bool,
    pub message_source: MessageSource,
    pub functions: Vec<String>,
    pub stats: MessageStats,
    pub metadata: MetadataView,
}

impl ConversationOverview {
    #[must_use]
    pub fn build(loaded: &LoadedConversation, formatter: &TimeFormatter) -> Self {
        let conversation = &loaded.conversation;
        Self {
            id: conversation.display_id().unwrap_or("Unknown").to_string(),
            title: conversation.display_title().to_string(),
            schema: conversation.schema_version().to_string(),
            created: conversation.created.map(|ts| formatter.format(Some(ts))),
            updated: conversation.updated.map(|ts| formatter.format(Some(ts))),
            owners: conversation.owners.clone(),
            tags: conversation.tags.clone(),
            favorite: conversation.is_favorite.unwrap_or(false),
            message_source: loaded.message_source,
            functions: conversation
                .function_names()
                .into_iter()
                .map(str::to_string)
                .collect(),
            stats: MessageStats::collect(&loaded.messages),
            metadata: MetadataView::collect(&loaded.messages),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::model::decode_messages;

    fn messages() -> Vec<Message> {
        decode_messages(&[
            json!({
                "role": "user",
                "is_internal_unity": true,
                "opt_status": "in",
                "front_desk_classification_results": {
                    "user_language": "French",
                    "sentiment": "negative",
                    "external_knowledge": "advanced",
                    "unity_topics": ["Physics", "Animation"]
                }
            }),
            json!({ "role": "assistant" }),
            json!({
                "role": "user",
                "front_desk_classification_results": { "unity_topics": ["Animation", "Audio"] }
            }),
            json!({ "role": "user", "front_desk_classification_results": { "sentiment": "ecstatic" } }),
            json!({ "role": "system" }),
        ])
    }

    #[test]
    fn counts_roles_and_user_classifications() {
        let stats = MessageStats::collect(&messages());
        assert_eq!(stats.total, 5);
        assert_eq!(stats.user, 3);
        assert_eq!(stats.assistant, 1);
        assert_eq!(stats.other, 1);
        assert_eq!(
            stats.sentiment,
            SentimentCounts { positive: 0, neutral: 1, negative: 1 }
        );
        assert_eq!(
            stats.complexity,
            ComplexityCounts { basic: 2, intermediate: 0, advanced: 1 }
        );
    }

    #[test]
    fn metadata_from_first_message_and_topic_union() {
        let metadata = MetadataView::collect(&messages());
        assert!(metadata.internal_unity);
        assert!(metadata.opted_in);
        assert_eq!(metadata.language.as_deref(), Some("French"));
        assert_eq!(metadata.language_flag, Some("🇫🇷"));
        assert_eq!(metadata.topics, vec!["Animation", "Audio", "Physics"]);
    }

    #[test]
    fn empty_conversation_metadata() {
        let metadata = MetadataView::collect(&[]);
        assert!(!metadata.internal_unity);
        assert!(!metadata.opted_in);
        assert!(metadata.language.is_none());
        assert!(metadata.topics.is_empty());
        assert_eq!(MessageStats::collect(&[]), MessageStats::default());
    }
}
