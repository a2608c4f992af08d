//! Chronological interleaving of messages and context entries

use std::collections::HashMap;

use crate::model::{ContextEntry, Message};

/// What a timeline entry holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Message,
    Context,
}

/// Payload of a timeline entry
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimelineItem<'a> {
    Message(&'a Message),
    Context(&'a ContextEntry),
}

/// One displayed entry, with the timestamp it is ordered by
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimelineEntry<'a> {
    /// Own timestamp, or the referencing message's for a context entry
    pub timestamp: Option<i64>,
    pub item: TimelineItem<'a>,
}

impl TimelineEntry<'_> {
    #[must_use]
    pub const fn kind(&self) -> EntryKind {
        match self.item {
            TimelineItem::Message(_) => EntryKind::Message,
            TimelineItem::Context(_) => EntryKind::Context,
        }
    }

    fn sort_key(&self) -> i64 {
        self.timestamp.unwrap_or(0)
    }
}

/// Merge messages and context entries into one ascending sequence
///
/// Entries are ordered by timestamp, missing timestamps counting as 0. Ties
/// keep input order, with all messages ahead of all context entries. A context
/// entry without a timestamp takes the timestamp of the first message that
/// references it.
#[must_use]
pub fn assemble<'a>(messages: &'a [Message], contexts: &'a [ContextEntry]) -> Vec<TimelineEntry<'a>> {
    let mut referenced_at: HashMap<&str, i64> = HashMap::new();
    for message in messages {
        if let (Some(context_id), Some(ts)) = (message.context_id.as_deref(), message.timestamp) {
            referenced_at.entry(context_id).or_insert(ts);
        }
    }

    let mut entries: Vec<TimelineEntry<'a>> = messages
        .iter()
        .map(|m| TimelineEntry {
            timestamp: m.timestamp,
            item: TimelineItem::Message(m),
        })
        .chain(contexts.iter().map(|c| TimelineEntry {
            timestamp: c.timestamp.or_else(|| {
                c.id.as_deref()
                    .and_then(|id| referenced_at.get(id).copied())
            }),
            item: TimelineItem::Context(c),
        }))
        .collect();

    // stable: equal timestamps keep input order
    entries.sort_by_key(TimelineEntry::sort_key);
    entries
}
