//! View models for the conversation and search views
//!
//! Rendering is pure: the same records and formatter always give the same
//! view. HTML pages and JSON responses are both built from these types.

mod entry;
mod overview;
mod search;
pub mod style;

use serde::Serialize;

pub use entry::{CONTEXT_TITLE, EntryView, MetricsView};
pub use overview::{ComplexityCounts, ConversationOverview, MessageStats, MetadataView, SentimentCounts};
pub use search::{COLUMNS, SearchRow, search_rows};
pub use style::{STYLES, StyleKind, StyleRecord};

use crate::format::{TimeFormatter, pretty_json};
use crate::gateway::{LoadedConversation, RawDocuments};
use crate::timeline::assemble;

/// Everything the conversation view shows
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversationView {
    pub overview: ConversationOverview,
    pub timeline: Vec<EntryView>,
    /// Notices about missing or malformed pieces
    pub notices: Vec<String>,
    pub raw: RawDocuments,
}

impl ConversationView {
    /// Raw documents pretty-printed for the raw-data tab
    #[must_use]
    pub fn raw_pretty(&self) -> Vec<(&'static str, String)> {
        let mut sections = vec![("Conversation", pretty_json(&self.raw.conversation))];
        if let Some(analytics) = &self.raw.analytics {
            sections.push(("Analytics", pretty_json(analytics)));
        }
        if !self.raw.contexts.is_empty() {
            sections.push((
                "Context",
                pretty_json(&serde_json::Value::Array(self.raw.contexts.clone())),
            ));
        }
        sections
    }
}

/// Build the conversation view from a loaded conversation
#[must_use]
pub fn render_conversation(loaded: &LoadedConversation, formatter: &TimeFormatter) -> ConversationView {
    let timeline: Vec<EntryView> = assemble(&loaded.messages, &loaded.contexts)
        .iter()
        .map(|entry| EntryView::from_entry(entry, formatter))
        .collect();

    let mut notices = Vec::new();
    if let Some(reason) = &loaded.conversation.malformed {
        notices.push(format!("Conversation record is malformed: {reason}"));
    }
    if loaded.analytics.is_none() {
        notices.push("No analytics record found; showing embedded history".to_string());
    }
    if loaded.messages.is_empty() {
        notices.push("No messages found in the conversation".to_string());
    }
    let malformed = timeline.iter().filter(|e| !e.warnings.is_empty()).count();
    if malformed > 0 {
        notices.push(format!("{malformed} entries have missing or malformed fields"));
    }

    ConversationView {
        overview: ConversationOverview::build(loaded, formatter),
        timeline,
        notices,
        raw: loaded.raw.clone(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::gateway::MessageSource;
    use crate::model::{Conversation, decode_contexts, decode_messages};
    use crate::timeline::EntryKind;

    fn loaded(conversation: serde_json::Value, contexts: &[serde_json::Value]) -> LoadedConversation {
        let conv = Conversation::from_value(conversation.clone());
        let messages = decode_messages(conv.embedded_messages());
        LoadedConversation {
            analytics: None,
            contexts: decode_contexts(contexts),
            message_source: MessageSource::Embedded,
            raw: RawDocuments {
                conversation,
                analytics: None,
                contexts: contexts.to_vec(),
            },
            conversation: conv,
            messages,
        }
    }

    #[test]
    fn renders_interleaved_timeline() {
        let loaded = loaded(
            json!({
                "id": "conv-1",
                "history": [
                    { "role": "user", "content": "where is my player?", "timestamp": 100 },
                    { "role": "assistant", "content": "In the scene root.", "timestamp": 200 }
                ]
            }),
            &[json!({ "id": "ctx-1", "type": "scene_hierarchy", "timestamp": 150, "data": { "root": ["Player"] } })],
        );

        let view = render_conversation(&loaded, &TimeFormatter::utc());
        let kinds: Vec<_> = view.timeline.iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![EntryKind::Message, EntryKind::Context, EntryKind::Message]);
        assert_eq!(view.timeline[2].style, StyleKind::Assistant);
        assert_eq!(view.overview.schema, "v2");
        assert_eq!(view.overview.stats.total, 2);
        assert!(view.notices.iter().any(|n| n.contains("analytics")));
        assert_eq!(view.raw_pretty().len(), 2);
    }

    #[test]
    fn empty_conversation_notice() {
        let view = render_conversation(&loaded(json!({ "id": "empty" }), &[]), &TimeFormatter::utc());
        assert!(view.timeline.is_empty());
        assert!(view.notices.iter().any(|n| n.contains("No messages")));
    }

    #[test]
    fn malformed_entries_still_render() {
        let view = render_conversation(
            &loaded(json!({ "id": "bad", "history": ["oops", { "role": "user" }] }), &[]),
            &TimeFormatter::utc(),
        );
        assert_eq!(view.timeline.len(), 2);
        assert!(view.notices.iter().any(|n| n.starts_with("2 entries")));
    }
}
