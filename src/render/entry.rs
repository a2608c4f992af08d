//! View model for a single timeline entry

use serde::Serialize;

use super::style::{StyleKind, knowledge_emoji, sentiment_emoji};
use crate::format::{
    NO_CONTENT, TimeFormatter, display_payload, escape_for_display, escape_html, render_markdown,
};
use crate::model::{ContextEntry, Message};
use crate::timeline::{EntryKind, TimelineEntry, TimelineItem};

/// Title shown on context entries
pub const CONTEXT_TITLE: &str = "Context Used";

/// Token and latency figures for display
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsView {
    pub tokens: Option<u64>,
    pub latency_ms: Option<f64>,
    pub time_to_first_token_ms: Option<f64>,
}

/// One rendered timeline entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntryView {
    pub kind: EntryKind,
    pub style: StyleKind,
    pub icon: &'static str,
    /// Role title, or [`CONTEXT_TITLE`]
    pub title: String,
    pub timestamp: String,
    /// Single-line plain-text header
    pub header: String,
    pub sentiment: Option<&'static str>,
    pub topics: Vec<String>,
    /// Emoji and label of the external-knowledge level
    pub knowledge: Option<String>,
    pub metrics: Option<MetricsView>,
    /// Set when the classifier marked the message unsafe
    pub flagged: bool,
    /// Context type tag
    pub context_kind: Option<String>,
    /// Display text with HTML escaped outside code
    pub body: String,
    /// Ready-to-embed HTML
    pub body_html: String,
    /// Problems with the stored record, shown next to the entry
    pub warnings: Vec<String>,
}

impl EntryView {
    #[must_use]
    pub fn from_entry(entry: &TimelineEntry<'_>, formatter: &TimeFormatter) -> Self {
        let timestamp = formatter.format(entry.timestamp);
        match entry.item {
            TimelineItem::Message(message) => Self::message(message, timestamp),
            TimelineItem::Context(context) => Self::context(context, timestamp),
        }
    }

    fn message(message: &Message, timestamp: String) -> Self {
        let style = StyleKind::for_role(&message.role);
        let icon = style.style().icon;
        let title = message.role.title();
        let classification = message.classification.as_ref();

        let sentiment = sentiment_emoji(classification.and_then(|c| c.sentiment()));
        let topics = classification.map(|c| c.unity_topics.clone()).unwrap_or_default();
        let knowledge = format!(
            "{} {}",
            knowledge_emoji(classification.and_then(|c| c.knowledge_level())),
            classification
                .and_then(|c| c.external_knowledge.as_deref())
                .unwrap_or("none")
        );

        let topics_text = if topics.is_empty() {
            String::new()
        } else {
            format!(" 🎮 {}", topics.join(" "))
        };
        let header = format!("{icon} {title} | {sentiment}{topics_text} | {knowledge} | {timestamp}");

        let content = message
            .content
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .unwrap_or(NO_CONTENT);

        let mut warnings = Vec::new();
        if let Some(reason) = &message.malformed {
            warnings.push(format!("Malformed message: {reason}"));
        } else {
            let missing = message.missing_fields();
            if !missing.is_empty() {
                warnings.push(format!("Missing fields: {}", missing.join(", ")));
            }
        }

        Self {
            kind: EntryKind::Message,
            style,
            icon,
            title,
            timestamp,
            header,
            sentiment: Some(sentiment),
            topics,
            knowledge: Some(knowledge),
            metrics: message.metrics.as_ref().map(|m| MetricsView {
                tokens: m.tokens(),
                latency_ms: m.latency_ms,
                time_to_first_token_ms: m.time_to_first_token_ms,
            }),
            flagged: classification.and_then(|c| c.is_safe) == Some(false),
            context_kind: None,
            body: escape_for_display(content),
            body_html: render_markdown(content),
            warnings,
        }
    }

    fn context(context: &ContextEntry, timestamp: String) -> Self {
        let style = StyleKind::Context;
        let icon = style.style().icon;
        let payload = display_payload(context.data.as_ref());

        let mut warnings = Vec::new();
        if let Some(reason) = &context.malformed {
            warnings.push(format!("Malformed context: {reason}"));
        }

        Self {
            kind: EntryKind::Context,
            style,
            icon,
            title: CONTEXT_TITLE.to_string(),
            header: format!("{icon} {CONTEXT_TITLE} | {timestamp}"),
            timestamp,
            sentiment: None,
            topics: Vec::new(),
            knowledge: None,
            metrics: None,
            flagged: false,
            context_kind: Some(context.kind_label().to_string()),
            body: escape_for_display(&payload),
            body_html: format!("<pre><code>{}</code></pre>", escape_html(&payload)),
            warnings,
        }
    }
}
