//! Title search endpoint and query-string parsing

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{ApiError, ApiState};
use crate::gateway::TitleQuery;
use crate::render::{SearchRow, search_rows};

/// Build search router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/api/search", get(search))
        .with_state(state)
}

/// Raw search parameters; blank values mean "not set"
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    pub min_messages: Option<String>,
    pub max_messages: Option<String>,
    /// `YYYY-MM-DD`
    pub start_date: Option<String>,
    /// `YYYY-MM-DD`
    pub end_date: Option<String>,
    pub limit: Option<String>,
    pub skip: Option<String>,
}

impl SearchParams {
    /// Search text, trimmed
    #[must_use]
    pub fn text(&self) -> &str {
        self.q.as_deref().map_or("", str::trim)
    }

    /// Parse into a title query
    ///
    /// # Errors
    ///
    /// Returns a message naming the first parameter that cannot be parsed
    pub fn to_query(&self) -> Result<TitleQuery, String> {
        Ok(TitleQuery {
            text: self.text().to_string(),
            min_messages: parse_count("min_messages", self.min_messages.as_deref())?,
            max_messages: parse_count("max_messages", self.max_messages.as_deref())?,
            start_date: parse_date("start_date", self.start_date.as_deref())?,
            end_date: parse_date("end_date", self.end_date.as_deref())?,
            limit: parse_count("limit", self.limit.as_deref())?,
            skip: parse_count("skip", self.skip.as_deref())?,
        })
    }
}

fn blank_to_none(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn parse_count(name: &str, value: Option<&str>) -> Result<Option<u64>, String> {
    blank_to_none(value)
        .map(|v| {
            v.parse::<u64>()
                .map_err(|_| format!("{name} must be a non-negative integer, got {v:?}"))
        })
        .transpose()
}

fn parse_date(name: &str, value: Option<&str>) -> Result<Option<NaiveDate>, String> {
    blank_to_none(value)
        .map(|v| {
            NaiveDate::parse_from_str(v, "%Y-%m-%d")
                .map_err(|_| format!("{name} must be a date in YYYY-MM-DD form, got {v:?}"))
        })
        .transpose()
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub count: usize,
    pub results: Vec<SearchRow>,
}

async fn search(
    State(state): State<Arc<ApiState>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    let query = params.to_query().map_err(ApiError::BadRequest)?;
    let summaries = state.gateway.find_conversations_by_title(&query).await?;
    let results = search_rows(&summaries, state.formatter());

    Ok(Json(SearchResponse {
        query: query.text,
        count: results.len(),
        results,
    }))
}
