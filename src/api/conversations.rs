//! Conversation JSON endpoints

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use serde::Serialize;

use super::{ApiError, ApiState};
use crate::render::{ConversationView, render_conversation};

/// Build conversations router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/{id}", get(get_conversation))
        .route("/{id}/summary", get(get_summary))
        .with_state(state)
}

async fn get_conversation(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
) -> Result<Json<ConversationView>, ApiError> {
    let loaded = state
        .gateway
        .find_conversation_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("no conversation with id {:?}", id.trim())))?;

    Ok(Json(render_conversation(&loaded, state.formatter())))
}

#[derive(Serialize)]
pub struct SummaryResponse {
    pub conversation_id: String,
    pub model: String,
    pub summary: String,
}

async fn get_summary(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
) -> Result<Json<SummaryResponse>, ApiError> {
    let summarizer = state
        .summarizer
        .as_ref()
        .ok_or(ApiError::NotConfigured("conversation summaries need GROQ_API_KEY"))?;

    let loaded = state
        .gateway
        .find_conversation_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("no conversation with id {:?}", id.trim())))?;

    if loaded.messages.is_empty() {
        return Err(ApiError::BadRequest("conversation has no messages to summarize".to_string()));
    }
    let summary = summarizer.summarize(&loaded.messages).await?;

    Ok(Json(SummaryResponse {
        conversation_id: id.trim().to_string(),
        model: summarizer.model().to_string(),
        summary,
    }))
}
