//! Server-rendered HTML views

use std::fmt::Write;
use std::sync::Arc;

use axum::{
    Router,
    extract::{Query, State},
    http::{StatusCode, Uri},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;

use super::ApiState;
use super::search::SearchParams;
use crate::Error;
use crate::format::escape_html;
use crate::render::style::stylesheet;
use crate::render::{COLUMNS, ConversationView, EntryView, SearchRow, render_conversation, search_rows};
use crate::timeline::EntryKind;

const APP_TITLE: &str = "AI Assistant Conversation Dashboard";

/// Build the HTML pages router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/conversations", get(conversation_page))
        .route("/search", get(search_page))
        .with_state(state)
}

#[derive(Debug, Default, Deserialize)]
pub struct ConversationParams {
    pub id: Option<String>,
}

fn page(title: &str, body: &str) -> Html<String> {
    Html(format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{title} - {APP_TITLE}</title>\n<style>\n{BASE_CSS}\n{styles}</style>\n</head>\n<body>\n\
         <nav><a href=\"/\">🏠 Home</a> <a href=\"/conversations\">💬 Conversation Viewer</a> \
         <a href=\"/search\">🔍 Search Conversations</a></nav>\n<main>\n{body}\n</main>\n</body>\n</html>\n",
        title = escape_html(title),
        styles = stylesheet(),
    ))
}

const BASE_CSS: &str = "body { font-family: sans-serif; margin: 0 2rem; }\n\
nav { padding: 1rem 0; border-bottom: 1px solid #ddd; } nav a { margin-right: 1rem; }\n\
.entry { padding: 15px; border-radius: 10px; margin: 10px 0; box-shadow: 0 2px 4px rgba(0,0,0,0.1); }\n\
.entry-header { margin-bottom: 8px; font-weight: 500; }\n\
.entry-body { padding: 10px; border-radius: 5px; }\n\
.notice { padding: 0.75rem; border-radius: 5px; background: #fff8e1; margin: 0.5rem 0; }\n\
.error { padding: 0.75rem; border-radius: 5px; background: #ffebee; margin: 0.5rem 0; }\n\
.warning { font-size: 0.85em; color: #b26a00; }\n\
.columns { display: flex; gap: 2rem; } .columns > section { flex: 1; }\n\
table { border-collapse: collapse; width: 100%; } td, th { border: 1px solid #ddd; padding: 4px 8px; text-align: left; }";

fn notice(class: &str, message: &str) -> String {
    format!("<div class=\"{class}\">{}</div>", escape_html(message))
}

/// Page shown when the store cannot be reached
fn unavailable(title: &str, form: &str, err: &Error, uri: &Uri) -> Response {
    tracing::warn!(error = %err, uri = %uri, "document store unavailable");
    let body = format!(
        "{form}<div class=\"error\">Could not reach the conversation database: {}. \
         <a href=\"{}\">Retry</a></div>",
        escape_html(&err.to_string()),
        escape_html(&uri.to_string()),
    );
    (StatusCode::SERVICE_UNAVAILABLE, page(title, &body)).into_response()
}

async fn home() -> Html<String> {
    page(
        "Home",
        &format!(
            "<h1>🤖 {APP_TITLE}</h1>\n\
             <p>Inspect stored assistant conversations.</p>\n<ul>\n\
             <li><a href=\"/conversations\">💬 Conversation Viewer</a>: load a conversation by id</li>\n\
             <li><a href=\"/search\">🔍 Search Conversations</a>: find conversations by title</li>\n</ul>"
        ),
    )
}

fn conversation_form(id: &str) -> String {
    format!(
        "<h1>💬 Conversation Viewer</h1>\n<form method=\"get\" action=\"/conversations\">\
         <input name=\"id\" value=\"{}\" placeholder=\"Conversation ID\" size=\"40\"> \
         <button type=\"submit\">Load</button></form>\n",
        escape_html(id)
    )
}

async fn conversation_page(
    State(state): State<Arc<ApiState>>,
    Query(params): Query<ConversationParams>,
    uri: Uri,
) -> Response {
    let id = params.id.as_deref().map_or("", str::trim);
    let form = conversation_form(id);
    if id.is_empty() {
        let body = format!("{form}{}", notice("notice", "Enter a conversation ID to load it."));
        return page("Conversation Viewer", &body).into_response();
    }

    match state.gateway.find_conversation_by_id(id).await {
        Ok(Some(loaded)) => {
            let view = render_conversation(&loaded, state.formatter());
            let body = format!(
                "{form}{}",
                conversation_body(&view, state.summarizer.is_some())
            );
            page(&view.overview.title, &body).into_response()
        }
        Ok(None) => {
            let body = format!(
                "{form}{}",
                notice("notice", &format!("No conversation found with ID {id}."))
            );
            (StatusCode::NOT_FOUND, page("Conversation Viewer", &body)).into_response()
        }
        Err(e) if e.is_retryable() => unavailable("Conversation Viewer", &form, &e, &uri),
        Err(e) => {
            tracing::error!(error = %e, id, "conversation lookup failed");
            let body = format!("{form}{}", notice("error", &e.to_string()));
            (StatusCode::INTERNAL_SERVER_ERROR, page("Conversation Viewer", &body)).into_response()
        }
    }
}

fn conversation_body(view: &ConversationView, summaries: bool) -> String {
    let overview = &view.overview;
    let stats = &overview.stats;
    let metadata = &overview.metadata;
    let mut html = String::new();

    let _ = write!(html, "<h2>{}</h2>\n<div class=\"columns\">\n", escape_html(&overview.title));

    let _ = write!(
        html,
        "<section><h3>💭 Overview</h3><p>ID: {}</p><p>Schema: {}</p>",
        escape_html(&overview.id),
        escape_html(&overview.schema)
    );
    if let Some(created) = &overview.created {
        let _ = write!(html, "<p>Created: {created}</p>");
    }
    if let Some(updated) = &overview.updated {
        let _ = write!(html, "<p>Updated: {updated}</p>");
    }
    if !overview.owners.is_empty() {
        let _ = write!(html, "<p>Owners: {}</p>", escape_html(&overview.owners.join(", ")));
    }
    if !overview.functions.is_empty() {
        let _ = write!(html, "<p>Functions: {}</p>", escape_html(&overview.functions.join(", ")));
    }
    html.push_str("</section>\n");

    html.push_str("<section><h3>📊 Message Statistics</h3>");
    if stats.total == 0 {
        html.push_str("<p>No messages found</p>");
    } else {
        let _ = write!(
            html,
            "<p>Total: {} | User: {} | Assistant: {} | Other: {}</p>\
             <p>Sentiment: 😊 Positive: {} | 😐 Neutral: {} | 😔 Negative: {}</p>\
             <p>Complexity: 📝 Basic: {} | 📚 Intermediate: {} | 🎓 Advanced: {}</p>",
            stats.total,
            stats.user,
            stats.assistant,
            stats.other,
            stats.sentiment.positive,
            stats.sentiment.neutral,
            stats.sentiment.negative,
            stats.complexity.basic,
            stats.complexity.intermediate,
            stats.complexity.advanced,
        );
    }
    html.push_str("</section>\n");

    let check = |flag: bool| if flag { "✅" } else { "❌" };
    let _ = write!(
        html,
        "<section><h3>🏷️ Metadata</h3><p>Internal Unity: {}</p><p>OPT Status: {}</p>",
        check(metadata.internal_unity),
        check(metadata.opted_in)
    );
    if let (Some(language), Some(flag)) = (&metadata.language, metadata.language_flag) {
        let _ = write!(html, "<p>Language: {flag} {}</p>", escape_html(language));
    }
    if !metadata.topics.is_empty() {
        let _ = write!(html, "<p>Topics: {}</p>", capsules(&metadata.topics));
    }
    html.push_str("</section>\n</div>\n");

    for message in &view.notices {
        html.push_str(&notice("notice", message));
    }

    if summaries {
        let _ = write!(
            html,
            "<p><a href=\"/api/conversations/{}/summary\">📝 Generate summary</a></p>",
            urlencoding::encode(&overview.id)
        );
    }

    if !view.timeline.is_empty() {
        html.push_str("<h3>💬 Message History</h3>\n");
        for entry in &view.timeline {
            html.push_str(&entry_html(entry));
        }
    }

    html.push_str("<details><summary>🗄️ Raw data</summary>");
    for (label, json) in view.raw_pretty() {
        let _ = write!(html, "<h4>{label}</h4><pre><code>{}</code></pre>", escape_html(&json));
    }
    html.push_str("</details>\n");

    html
}

fn capsules(topics: &[String]) -> String {
    topics
        .iter()
        .map(|t| format!("<span class=\"topic\">{}</span>", escape_html(t)))
        .collect::<Vec<_>>()
        .join(" ")
}

fn entry_html(entry: &EntryView) -> String {
    let mut html = format!("<div class=\"entry entry-{}\">", entry.style.as_str());

    match entry.kind {
        EntryKind::Message => {
            let topics = if entry.topics.is_empty() {
                String::new()
            } else {
                format!(" 🎮 {}", capsules(&entry.topics))
            };
            let _ = write!(
                html,
                "<div class=\"entry-header\">{} {} | {}{} | {} | {}",
                entry.icon,
                escape_html(&entry.title),
                entry.sentiment.unwrap_or_default(),
                topics,
                escape_html(entry.knowledge.as_deref().unwrap_or_default()),
                entry.timestamp,
            );
            if entry.flagged {
                html.push_str(" | ⚠️ flagged");
            }
            if let Some(tokens) = entry.metrics.as_ref().and_then(|m| m.tokens) {
                let _ = write!(html, " | {tokens} tokens");
            }
            let _ = write!(html, "</div><div class=\"entry-body\">{}</div>", entry.body_html);
        }
        EntryKind::Context => {
            let _ = write!(
                html,
                "<div class=\"entry-header\"><strong>{} {}</strong> ({}) | {}</div>\
                 <details><summary>View Context Data</summary>\
                 <div class=\"entry-body\">{}</div></details>",
                entry.icon,
                escape_html(&entry.title),
                escape_html(entry.context_kind.as_deref().unwrap_or_default()),
                entry.timestamp,
                entry.body_html,
            );
        }
    }

    for warning in &entry.warnings {
        let _ = write!(html, "<div class=\"warning\">{}</div>", escape_html(warning));
    }
    html.push_str("</div>\n");
    html
}

fn search_form(params: &SearchParams) -> String {
    let value = |v: &Option<String>| escape_html(v.as_deref().unwrap_or_default());
    format!(
        "<h1>🔍 Search Conversations</h1>\n<form method=\"get\" action=\"/search\">\
         <input name=\"q\" value=\"{}\" placeholder=\"Enter search term (e.g., 'flappy')\" size=\"40\"> \
         Messages <input name=\"min_messages\" value=\"{}\" size=\"4\" placeholder=\"min\">\
         -<input name=\"max_messages\" value=\"{}\" size=\"4\" placeholder=\"max\"> \
         First message <input name=\"start_date\" type=\"date\" value=\"{}\">\
         -<input name=\"end_date\" type=\"date\" value=\"{}\"> \
         Limit <input name=\"limit\" value=\"{}\" size=\"5\"> \
         Skip <input name=\"skip\" value=\"{}\" size=\"5\"> \
         <button type=\"submit\">🔍 Search</button></form>\n",
        value(&params.q),
        value(&params.min_messages),
        value(&params.max_messages),
        value(&params.start_date),
        value(&params.end_date),
        value(&params.limit),
        value(&params.skip),
    )
}

async fn search_page(
    State(state): State<Arc<ApiState>>,
    Query(params): Query<SearchParams>,
    uri: Uri,
) -> Response {
    let form = search_form(&params);

    if params.text().is_empty() {
        let body = format!("{form}{}", notice("notice", "Please enter a search term."));
        return page("Search", &body).into_response();
    }

    let query = match params.to_query() {
        Ok(query) => query,
        Err(message) => {
            let body = format!("{form}{}", notice("error", &message));
            return (StatusCode::BAD_REQUEST, page("Search", &body)).into_response();
        }
    };

    match state.gateway.find_conversations_by_title(&query).await {
        Ok(summaries) if summaries.is_empty() => {
            let body = format!(
                "{form}{}",
                notice("notice", "No conversations found matching your search.")
            );
            page("Search", &body).into_response()
        }
        Ok(summaries) => {
            let rows = search_rows(&summaries, state.formatter());
            let body = format!("{form}{}", results_table(&rows));
            page("Search", &body).into_response()
        }
        Err(e) if e.is_retryable() => unavailable("Search", &form, &e, &uri),
        Err(e) => {
            tracing::error!(error = %e, "conversation search failed");
            let body = format!("{form}{}", notice("error", &e.to_string()));
            (StatusCode::INTERNAL_SERVER_ERROR, page("Search", &body)).into_response()
        }
    }
}

fn results_table(rows: &[SearchRow]) -> String {
    let mut html = format!("<p>Found {} conversations</p>\n<table>\n<tr>", rows.len());
    for column in COLUMNS {
        let _ = write!(html, "<th>{column}</th>");
    }
    html.push_str("</tr>\n");

    for row in rows {
        html.push_str("<tr>");
        for (i, cell) in row.cells().iter().enumerate() {
            if i == 0 {
                let _ = write!(
                    html,
                    "<td><a href=\"/conversations?id={}\">{}</a></td>",
                    urlencoding::encode(cell),
                    escape_html(cell)
                );
            } else {
                let _ = write!(html, "<td>{}</td>", escape_html(cell));
            }
        }
        html.push_str("</tr>\n");
    }

    html.push_str("</table>");
    html
}
