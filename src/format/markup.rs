//! Markdown-aware HTML escaping and rendering
//!
//! Message content is markdown written by people and models. Two entry points:
//!
//! - [`escape_for_display`] keeps the text as markdown but makes every literal
//!   segment safe to embed in HTML. Code spans and fenced blocks pass through
//!   verbatim, and already-escaped entities are left alone, so the function is
//!   idempotent.
//! - [`render_markdown`] produces the HTML the web view paints:
//!
//! - `**bold**` → `<strong>bold</strong>`
//! - `*italic*` → `<em>italic</em>`
//! - `` `code` `` → `<code>code</code>`
//! - ` ```lang\nblock\n``` ` → `<pre><code class="language-lang">block</code></pre>`
//! - `~~strike~~` → `<del>strike</del>`
//! - `[text](https://url)` → `<a href="https://url">text</a>`
//! - `> quote` → `<blockquote>quote</blockquote>`

use std::sync::LazyLock;

use regex::Regex;

/// Fenced blocks first so a fence is never split into inline spans
static CODE_SEGMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"```[\s\S]*?```|`[^`\n]+`").expect("code segment regex is valid")
});

static INLINE_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"`[^`]+`").expect("inline code regex is valid"));

static ENTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^&(?:[A-Za-z][A-Za-z0-9]{1,31}|#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6});")
        .expect("entity regex is valid")
});

/// A slice of message text, split at code boundaries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Segment<'a> {
    Literal(&'a str),
    Code(&'a str),
}

fn split_code_segments(text: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut last = 0;

    for m in CODE_SEGMENT.find_iter(text) {
        if m.start() > last {
            segments.push(Segment::Literal(&text[last..m.start()]));
        }
        segments.push(Segment::Code(m.as_str()));
        last = m.end();
    }

    if last < text.len() {
        segments.push(Segment::Literal(&text[last..]));
    }

    segments
}

/// Escape HTML special characters in literal text while preserving markdown
///
/// Escapes `<`, `>`, `&`, `"` and `'` outside code. Fenced code blocks and inline
/// code spans are copied unchanged; the downstream markdown renderer escapes them.
#[must_use]
pub fn escape_for_display(raw: &str) -> String {
    let mut output = String::with_capacity(raw.len());

    for segment in split_code_segments(raw) {
        match segment {
            Segment::Literal(text) => escape_literal(text, &mut output),
            Segment::Code(code) => output.push_str(code),
        }
    }

    output
}

/// Escape every HTML special character, including `&` that starts an entity
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut output = String::with_capacity(text.len());
    for ch in text.chars() {
        push_escaped(ch, &mut output);
    }
    output
}

fn push_escaped(ch: char, output: &mut String) {
    match ch {
        '&' => output.push_str("&amp;"),
        '<' => output.push_str("&lt;"),
        '>' => output.push_str("&gt;"),
        '"' => output.push_str("&quot;"),
        '\'' => output.push_str("&#39;"),
        c => output.push(c),
    }
}

/// Escape literal text, leaving existing character entities intact
fn escape_literal(text: &str, output: &mut String) {
    let mut rest = text;

    while let Some(ch) = rest.chars().next() {
        if ch == '&' {
            if let Some(entity) = ENTITY.find(rest) {
                output.push_str(entity.as_str());
                rest = &rest[entity.end()..];
                continue;
            }
        }
        push_escaped(ch, output);
        rest = &rest[ch.len_utf8()..];
    }
}

/// Convert markdown message content to display HTML
///
/// All literal text is escaped; only the tags listed in the module docs are emitted.
#[must_use]
pub fn render_markdown(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    let lines: Vec<&str> = input.lines().collect();
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];

        // Fenced code block
        if let Some(info) = line.trim_start().strip_prefix("```") {
            let lang = sanitize_language(info);
            let mut code_lines = Vec::new();
            i += 1;
            while i < lines.len() && !lines[i].trim_start().starts_with("```") {
                code_lines.push(lines[i]);
                i += 1;
            }
            // Skip closing ```
            if i < lines.len() {
                i += 1;
            }

            let code = escape_html(&code_lines.join("\n"));
            if lang.is_empty() {
                output.push_str(&format!("<pre><code>{code}</code></pre>"));
            } else {
                output.push_str(&format!(
                    "<pre><code class=\"language-{lang}\">{code}</code></pre>"
                ));
            }
            output.push('\n');
            continue;
        }

        if let Some(rest) = line.strip_prefix("> ") {
            output.push_str(&format!("<blockquote>{}</blockquote>", convert_inline(rest)));
        } else {
            output.push_str(&convert_inline(line));
        }
        output.push('\n');
        i += 1;
    }

    if output.ends_with('\n') {
        output.pop();
    }

    output
}

/// Keep only characters that are safe inside a class attribute
fn sanitize_language(info: &str) -> String {
    info.trim()
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+' | '#'))
        .collect()
}

/// Convert inline markdown on one line
///
/// Code spans are cut out first so emphasis markers inside them stay literal.
fn convert_inline(line: &str) -> String {
    let mut result = String::with_capacity(line.len());
    let mut last = 0;

    for m in INLINE_CODE.find_iter(line) {
        result.push_str(&convert_emphasis(&escape_html(&line[last..m.start()])));
        let code = &m.as_str()[1..m.as_str().len() - 1];
        result.push_str(&format!("<code>{}</code>", escape_html(code)));
        last = m.end();
    }

    result.push_str(&convert_emphasis(&escape_html(&line[last..])));
    result
}

/// Marks a link placeholder while emphasis is converted
const LINK_MARK: char = '\u{1}';

/// Links, bold, italic and strikethrough on already-escaped text
///
/// Links are cut out before emphasis so markers inside a url never reach the
/// `href`; the link text itself is emphasized on its own.
fn convert_emphasis(text: &str) -> String {
    let (text, anchors) = take_links(&text.replace(LINK_MARK, ""));
    restore_links(&emphasize(&text), &anchors)
}

fn emphasize(text: &str) -> String {
    let text = convert_delimited(text, "**", "<strong>", "</strong>");
    let text = convert_italic(&text);
    convert_delimited(&text, "~~", "<del>", "</del>")
}

fn restore_links(text: &str, anchors: &[String]) -> String {
    let mut result = String::with_capacity(text.len());
    for (i, part) in text.split(LINK_MARK).enumerate() {
        if i % 2 == 1 {
            match part.parse::<usize>().ok().and_then(|n| anchors.get(n)) {
                Some(anchor) => result.push_str(anchor),
                None => result.push_str(part),
            }
        } else {
            result.push_str(part);
        }
    }
    result
}

/// Convert `*italic*`, skipping over tags emitted by earlier passes
fn convert_italic(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut remaining = text;

    while !remaining.is_empty() {
        if let Some(tag_start) = remaining.find('<') {
            result.push_str(&convert_single_delimited(&remaining[..tag_start], '*', "<em>", "</em>"));

            if let Some(tag_end) = remaining[tag_start..].find('>') {
                let end = tag_start + tag_end + 1;
                result.push_str(&remaining[tag_start..end]);
                remaining = &remaining[end..];
            } else {
                result.push_str(&remaining[tag_start..]);
                break;
            }
        } else {
            result.push_str(&convert_single_delimited(remaining, '*', "<em>", "</em>"));
            break;
        }
    }

    result
}

/// Replace `[text](url)` for http, https and mailto targets with placeholders
///
/// Returns the text and the rendered anchors. The url has already been
/// escaped, so it cannot break out of the attribute.
fn take_links(text: &str) -> (String, Vec<String>) {
    let mut result = String::with_capacity(text.len());
    let mut anchors = Vec::new();
    let mut remaining = text;

    while let Some(bracket_start) = remaining.find('[') {
        result.push_str(&remaining[..bracket_start]);

        let after_bracket = &remaining[bracket_start + 1..];
        if let Some(bracket_end) = after_bracket.find("](") {
            let link_text = &after_bracket[..bracket_end];
            let after_paren = &after_bracket[bracket_end + 2..];

            if let Some(paren_end) = after_paren.find(')') {
                let url = &after_paren[..paren_end];
                if is_safe_link(url) {
                    anchors.push(format!(
                        "<a href=\"{url}\" target=\"_blank\" rel=\"noopener\">{}</a>",
                        emphasize(link_text)
                    ));
                    result.push(LINK_MARK);
                    result.push_str(&(anchors.len() - 1).to_string());
                    result.push(LINK_MARK);
                    remaining = &after_paren[paren_end + 1..];
                    continue;
                }
            }
        }

        result.push('[');
        remaining = after_bracket;
    }

    result.push_str(remaining);
    (result, anchors)
}

fn is_safe_link(url: &str) -> bool {
    let lower = url.trim().to_ascii_lowercase();
    lower.starts_with("https://") || lower.starts_with("http://") || lower.starts_with("mailto:")
}

/// Two-char delimiter converter (`**` → `<strong>`, `~~` → `<del>`)
fn convert_delimited(text: &str, delimiter: &str, open_tag: &str, close_tag: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut remaining = text;
    let mut open = false;

    while let Some(pos) = remaining.find(delimiter) {
        result.push_str(&remaining[..pos]);
        result.push_str(if open { close_tag } else { open_tag });
        open = !open;
        remaining = &remaining[pos + delimiter.len()..];
    }

    result.push_str(remaining);

    // Unmatched: put the delimiter back
    if open {
        if let Some(last_open) = result.rfind(open_tag) {
            let mut fixed = String::with_capacity(result.len());
            fixed.push_str(&result[..last_open]);
            fixed.push_str(delimiter);
            fixed.push_str(&result[last_open + open_tag.len()..]);
            return fixed;
        }
    }

    result
}

/// Single-char delimiter converter (for `*italic*`)
fn convert_single_delimited(text: &str, delimiter: char, open_tag: &str, close_tag: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    let mut open = false;

    while let Some(ch) = chars.next() {
        if ch != delimiter {
            result.push(ch);
        } else if open {
            result.push_str(close_tag);
            open = false;
        } else if chars.peek().is_some_and(|c| !c.is_whitespace()) {
            // `* ` is a list marker or arithmetic, not emphasis
            result.push_str(open_tag);
            open = true;
        } else {
            result.push(ch);
        }
    }

    if open {
        if let Some(last_open) = result.rfind(open_tag) {
            let mut fixed = String::with_capacity(result.len());
            fixed.push_str(&result[..last_open]);
            fixed.push(delimiter);
            fixed.push_str(&result[last_open + open_tag.len()..]);
            return fixed;
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_literal_characters() {
        assert_eq!(
            escape_for_display(r#"1 < 2 & "a" > 'b'"#),
            "1 &lt; 2 &amp; &quot;a&quot; &gt; &#39;b&#39;"
        );
    }

    #[test]
    fn escape_is_idempotent() {
        let raw = "Tom & Jerry <script>alert('x')</script> &copy; &#169;";
        let once = escape_for_display(raw);
        assert_eq!(escape_for_display(&once), once);
    }

    #[test]
    fn escape_leaves_entities_alone() {
        assert_eq!(escape_for_display("a &amp; b &lt;c&gt; &#x27;"), "a &amp; b &lt;c&gt; &#x27;");
    }

    #[test]
    fn escape_leaves_named_entities_alone() {
        assert_eq!(escape_for_display("&copy; 2024 &hellip;"), "&copy; 2024 &hellip;");
        assert_eq!(escape_for_display("R&D; & co"), "R&amp;D; &amp; co");
    }

    #[test]
    fn escape_preserves_fenced_code() {
        let raw = "Try this:\n```csharp\nif (a < b && c > d) { Debug.Log(\"<ok>\"); }\n```\ndone & dusted";
        let escaped = escape_for_display(raw);
        assert!(escaped.contains("```csharp\nif (a < b && c > d) { Debug.Log(\"<ok>\"); }\n```"));
        assert!(escaped.ends_with("done &amp; dusted"));
    }

    #[test]
    fn escape_preserves_inline_code_and_emphasis() {
        assert_eq!(
            escape_for_display("**Use** `List<int>` for *that* <b>"),
            "**Use** `List<int>` for *that* &lt;b&gt;"
        );
    }

    #[test]
    fn escape_handles_unicode() {
        assert_eq!(escape_for_display("héllo → <wörld>"), "héllo → &lt;wörld&gt;");
    }

    #[test]
    fn render_bold_italic_code() {
        assert_eq!(render_markdown("**bold**"), "<strong>bold</strong>");
        assert_eq!(render_markdown("*italic*"), "<em>italic</em>");
        assert_eq!(render_markdown("`code`"), "<code>code</code>");
    }

    #[test]
    fn render_code_block_with_language() {
        let input = "```rust\nfn main() {}\n```";
        assert_eq!(
            render_markdown(input),
            "<pre><code class=\"language-rust\">fn main() {}</code></pre>"
        );
    }

    #[test]
    fn render_code_block_escapes_html() {
        let output = render_markdown("```\n<script>alert('xss')</script>\n```");
        assert!(output.contains("&lt;script&gt;"));
        assert!(!output.contains("<script>"));
    }

    #[test]
    fn render_code_block_language_is_sanitized() {
        let output = render_markdown("```c\"onclick=\"x\nbody\n```");
        assert!(output.starts_with("<pre><code class=\"language-conclickx\">"));
    }

    #[test]
    fn render_inline_code_is_not_formatted() {
        assert_eq!(render_markdown("`a ** b * c`"), "<code>a ** b * c</code>");
    }

    #[test]
    fn render_escapes_text() {
        assert_eq!(render_markdown("1 < 2 & 3 > 0"), "1 &lt; 2 &amp; 3 &gt; 0");
    }

    #[test]
    fn render_links_only_for_safe_schemes() {
        assert_eq!(
            render_markdown("[docs](https://docs.unity3d.com)"),
            "<a href=\"https://docs.unity3d.com\" target=\"_blank\" rel=\"noopener\">docs</a>"
        );
        assert_eq!(render_markdown("[x](javascript:alert(1))"), "[x](javascript:alert(1))");
    }

    #[test]
    fn render_link_targets_keep_emphasis_markers() {
        assert_eq!(
            render_markdown("see [the *docs*](https://example.com/a_b*c*d) **now**"),
            "see <a href=\"https://example.com/a_b*c*d\" target=\"_blank\" rel=\"noopener\">the <em>docs</em></a> <strong>now</strong>"
        );
        assert_eq!(
            render_markdown("**[bold](https://x.dev/**y**)**"),
            "<strong><a href=\"https://x.dev/**y**\" target=\"_blank\" rel=\"noopener\">bold</a></strong>"
        );
    }

    #[test]
    fn render_blockquote_and_strike() {
        assert_eq!(render_markdown("> quoted"), "<blockquote>quoted</blockquote>");
        assert_eq!(render_markdown("~~gone~~"), "<del>gone</del>");
    }

    #[test]
    fn render_unmatched_star_stays_literal() {
        let result = render_markdown("2 * 3 and *open");
        assert!(!result.contains("<em>"));
        assert!(result.contains('*'));
    }

    #[test]
    fn render_keeps_line_breaks() {
        assert_eq!(render_markdown("one\ntwo"), "one\ntwo");
    }
}
