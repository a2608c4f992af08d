//! Search result table rows

use serde::Serialize;

use crate::format::TimeFormatter;
use crate::model::ConversationSummary;

/// Column headings, in display order
pub const COLUMNS: [&str; 8] = [
    "ID",
    "Title",
    "Messages",
    "First Message",
    "Last Message",
    "Created",
    "Updated",
    "Owners",
];

/// One row of the search results table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchRow {
    pub id: String,
    pub title: String,
    pub messages: usize,
    pub first_message: String,
    pub last_message: String,
    pub created: String,
    pub updated: String,
    pub owners: String,
    pub favorite: bool,
    pub tags: Vec<String>,
    pub functions: String,
}

impl SearchRow {
    #[must_use]
    pub fn from_summary(summary: &ConversationSummary, formatter: &TimeFormatter) -> Self {
        Self {
            id: summary.id.clone(),
            title: summary.title.clone(),
            messages: summary.message_count,
            first_message: summary.first_message.clone(),
            last_message: summary.last_message.clone(),
            created: formatter.format(summary.created_at),
            updated: formatter.format(summary.updated_at),
            owners: summary.owners.join(", "),
            favorite: summary.is_favorite,
            tags: summary.tags.clone(),
            functions: summary.available_functions.clone(),
        }
    }

    /// Cell values in [`COLUMNS`] order
    #[must_use]
    pub fn cells(&self) -> [String; 8] {
        [
            self.id.clone(),
            self.title.clone(),
            self.messages.to_string(),
            self.first_message.clone(),
            self.last_message.clone(),
            self.created.clone(),
            self.updated.clone(),
            self.owners.clone(),
        ]
    }
}

/// Rows for a list of search results
#[must_use]
pub fn search_rows(summaries: &[ConversationSummary], formatter: &TimeFormatter) -> Vec<SearchRow> {
    summaries
        .iter()
        .map(|s| SearchRow::from_summary(s, formatter))
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::format::UNKNOWN_TIME;
    use crate::model::Conversation;

    #[test]
    fn row_formats_timestamps_and_owners() {
        let conversation = Conversation::from_value(json!({
            "id": "c1",
            "title": "Shader help",
            "owners": ["alice", "bob"],
            "history": [
                { "role": "user", "content": "hi", "timestamp": 0 },
                { "role": "assistant", "content": "hello" }
            ]
        }));
        let summary = ConversationSummary::from_conversation(&conversation);
        let row = SearchRow::from_summary(&summary, &TimeFormatter::utc());

        assert_eq!(row.created, "1970-01-01 00:00:00");
        assert_eq!(row.updated, UNKNOWN_TIME);
        assert_eq!(row.owners, "alice, bob");
        assert_eq!(row.cells()[2], "2");
        assert_eq!(row.cells().len(), COLUMNS.len());
    }

    #[test]
    fn no_results_no_rows() {
        assert!(search_rows(&[], &TimeFormatter::utc()).is_empty());
    }
}
