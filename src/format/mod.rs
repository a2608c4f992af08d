//! Text and timestamp formatting
//!
//! Pure functions shared by the view renderer and the CLI. Nothing here can
//! fail: unusable input renders as a placeholder.

mod json;
mod markup;
mod time;

pub use json::{NO_DATA, display_payload, pretty_json};
pub use markup::{escape_for_display, escape_html, render_markdown};
pub use time::{DATETIME_FORMAT, TimeFormatter, UNKNOWN_TIME, system_timezone};

/// Placeholder for a message without content
pub const NO_CONTENT: &str = "No content";

/// Shorten text to `max_chars` characters, appending `...` when cut
///
/// Counts characters rather than bytes so multi-byte text is never split.
#[must_use]
pub fn preview(text: &str, max_chars: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_short_text_unchanged() {
        assert_eq!(preview("hello", 10), "hello");
    }

    #[test]
    fn preview_truncates_on_char_boundary() {
        assert_eq!(preview("héllo wörld", 5), "héllo...");
    }
}
