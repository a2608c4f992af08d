//! Fixed style table for timeline entries

use serde::Serialize;

use crate::model::{KnowledgeLevel, Role, Sentiment};

/// Which style record an entry is drawn with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StyleKind {
    User,
    Assistant,
    Context,
    /// Fallback for roles other than user and assistant
    System,
}

impl StyleKind {
    #[must_use]
    pub const fn for_role(role: &Role) -> Self {
        match role {
            Role::User => Self::User,
            Role::Assistant => Self::Assistant,
            Role::System | Role::Other(_) => Self::System,
        }
    }

    #[must_use]
    pub const fn style(self) -> &'static StyleRecord {
        match self {
            Self::User => &STYLES[0],
            Self::Assistant => &STYLES[1],
            Self::Context => &STYLES[2],
            Self::System => &STYLES[3],
        }
    }

    /// CSS class suffix
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::Context => "context",
            Self::System => "system",
        }
    }
}

/// Colors and icon for one kind of entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StyleRecord {
    pub kind: StyleKind,
    pub background: &'static str,
    pub border: &'static str,
    pub header: &'static str,
    pub text: &'static str,
    pub content_background: &'static str,
    pub icon: &'static str,
}

/// Every style record, one per [`StyleKind`]
pub const STYLES: [StyleRecord; 4] = [
    StyleRecord {
        kind: StyleKind::User,
        background: "#e3f2fd",
        border: "#1976d2",
        header: "#1976d2",
        text: "#1565c0",
        content_background: "rgba(25, 118, 210, 0.05)",
        icon: "👤",
    },
    StyleRecord {
        kind: StyleKind::Assistant,
        background: "#e8f5e9",
        border: "#2e7d32",
        header: "#2e7d32",
        text: "#1b5e20",
        content_background: "rgba(46, 125, 50, 0.05)",
        icon: "🤖",
    },
    StyleRecord {
        kind: StyleKind::Context,
        background: "#f3e5f5",
        border: "#9c27b0",
        header: "#9c27b0",
        text: "#6a1b9a",
        content_background: "rgba(156, 39, 176, 0.05)",
        icon: "🔍",
    },
    StyleRecord {
        kind: StyleKind::System,
        background: "#f5f5f5",
        border: "#757575",
        header: "#616161",
        text: "#424242",
        content_background: "rgba(97, 97, 97, 0.05)",
        icon: "⚙️",
    },
];

/// Code block colors
pub const CODE_BLOCK: BlockStyle = BlockStyle {
    background: "#f8f9fa",
    border: "#e9ecef",
    text: "#212529",
};

/// Topic capsule colors and shape
pub const TOPIC_CAPSULE: CapsuleStyle = CapsuleStyle {
    background: "#f0f0f0",
    border: "#d0d0d0",
    text: "#333333",
    padding: "2px 8px",
    border_radius: "12px",
    margin: "0 2px",
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockStyle {
    pub background: &'static str,
    pub border: &'static str,
    pub text: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapsuleStyle {
    pub background: &'static str,
    pub border: &'static str,
    pub text: &'static str,
    pub padding: &'static str,
    pub border_radius: &'static str,
    pub margin: &'static str,
}

const LANGUAGE_FLAGS: &[(&str, &str)] = &[
    ("arabic", "🇸🇦"),
    ("chinese", "🇨🇳"),
    ("dutch", "🇳🇱"),
    ("english", "🇬🇧"),
    ("french", "🇫🇷"),
    ("german", "🇩🇪"),
    ("italian", "🇮🇹"),
    ("japanese", "🇯🇵"),
    ("korean", "🇰🇷"),
    ("portuguese", "🇵🇹"),
    ("russian", "🇷🇺"),
    ("spanish", "🇪🇸"),
    ("turkish", "🇹🇷"),
];

const UNKNOWN_FLAG: &str = "❓";

/// Flag emoji for a language name (case-insensitive)
#[must_use]
pub fn language_flag(language: &str) -> &'static str {
    let language = language.trim().to_lowercase();
    LANGUAGE_FLAGS
        .iter()
        .find(|(name, _)| *name == language)
        .map_or(UNKNOWN_FLAG, |(_, flag)| flag)
}

/// Emoji for a sentiment; unknown sentiment shows as neutral
#[must_use]
pub const fn sentiment_emoji(sentiment: Option<Sentiment>) -> &'static str {
    match sentiment {
        Some(Sentiment::Positive) => "😊",
        Some(Sentiment::Negative) => "😔",
        Some(Sentiment::Neutral) | None => "😐",
    }
}

/// Emoji for an external-knowledge level; unknown shows as none
#[must_use]
pub const fn knowledge_emoji(level: Option<KnowledgeLevel>) -> &'static str {
    match level {
        Some(KnowledgeLevel::Intermediate) => "📚",
        Some(KnowledgeLevel::Advanced) => "🎓",
        Some(KnowledgeLevel::None) | None => "📝",
    }
}

/// Stylesheet with one class per style record
#[must_use]
pub fn stylesheet() -> String {
    use std::fmt::Write;

    let mut css = String::new();
    for style in &STYLES {
        let kind = style.kind.as_str();
        let _ = writeln!(
            css,
            ".entry-{kind} {{ background-color: {}; border-left: 5px solid {}; }}\n\
             .entry-{kind} .entry-header {{ color: {}; }}\n\
             .entry-{kind} .entry-body {{ color: {}; background-color: {}; }}",
            style.background, style.border, style.header, style.text, style.content_background,
        );
    }
    let _ = writeln!(
        css,
        "pre {{ background-color: {}; border: 1px solid {}; color: {}; }}",
        CODE_BLOCK.background, CODE_BLOCK.border, CODE_BLOCK.text,
    );
    let _ = writeln!(
        css,
        ".topic {{ background-color: {}; color: {}; padding: {}; border-radius: {}; \
         border: 1px solid {}; margin: {}; }}",
        TOPIC_CAPSULE.background,
        TOPIC_CAPSULE.text,
        TOPIC_CAPSULE.padding,
        TOPIC_CAPSULE.border_radius,
        TOPIC_CAPSULE.border,
        TOPIC_CAPSULE.margin,
    );
    css
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_has_one_record_per_kind() {
        for kind in [StyleKind::User, StyleKind::Assistant, StyleKind::Context, StyleKind::System] {
            assert_eq!(kind.style().kind, kind);
        }
    }

    #[test]
    fn unknown_roles_use_system_style() {
        assert_eq!(StyleKind::for_role(&Role::parse("tool")), StyleKind::System);
        assert_eq!(StyleKind::for_role(&Role::default()), StyleKind::System);
        assert_eq!(StyleKind::for_role(&Role::User).style().icon, "👤");
    }

    #[test]
    fn language_flags() {
        assert_eq!(language_flag("English"), "🇬🇧");
        assert_eq!(language_flag(" japanese "), "🇯🇵");
        assert_eq!(language_flag("klingon"), "❓");
    }

    #[test]
    fn emoji_defaults() {
        assert_eq!(sentiment_emoji(None), "😐");
        assert_eq!(knowledge_emoji(None), "📝");
        assert_eq!(knowledge_emoji(Some(KnowledgeLevel::Advanced)), "🎓");
    }

    #[test]
    fn stylesheet_covers_every_record() {
        let css = stylesheet();
        for style in &STYLES {
            assert!(css.contains(&format!(".entry-{}", style.kind.as_str())));
            assert!(css.contains(style.background));
        }
        assert!(css.contains(".topic"));
    }
}
