//! LLM conversation summaries via an OpenAI-compatible chat completions API

use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

use crate::config::SummaryConfig;
use crate::format::NO_CONTENT;
use crate::model::Message;
use crate::{Error, Result};

const PROMPT_PREFIX: &str = "Summarize the following conversation:\n";
const TEMPERATURE: f32 = 0.7;

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

/// Build the summary prompt, keeping the transcript within `max_chars`
///
/// Lines are `Role: content`. The first line that does not fit is cut to the
/// remaining budget and marked with `...`; later lines are dropped.
#[must_use]
pub fn build_prompt(messages: &[Message], max_chars: usize) -> String {
    let mut prompt = String::from(PROMPT_PREFIX);
    let mut used = 0;

    for message in messages {
        let role = message.role.title();
        let content = message.content.as_deref().unwrap_or(NO_CONTENT);
        let line = format!("{role}: {content}\n");
        let len = line.chars().count();

        if used + len <= max_chars {
            prompt.push_str(&line);
            used += len;
            continue;
        }

        let remaining = max_chars - used;
        if remaining > 0 {
            let cut: String = content.chars().take(remaining).collect();
            prompt.push_str(&format!("{role}: {cut}...\n"));
        }
        break;
    }

    prompt
}

/// Client for the summary endpoint
#[derive(Debug, Clone)]
pub struct Summarizer {
    client: reqwest::Client,
    config: SummaryConfig,
}

impl Summarizer {
    #[must_use]
    pub fn new(config: SummaryConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Summarize a conversation's messages
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the reply has no content
    pub async fn summarize(&self, messages: &[Message]) -> Result<String> {
        if messages.is_empty() {
            return Err(Error::Summary("conversation has no messages".to_string()));
        }

        let prompt = build_prompt(messages, self.config.max_prompt_chars);
        let request = ChatRequest {
            model: &self.config.model,
            messages: [ChatMessage {
                role: "user",
                content: &prompt,
            }],
            temperature: TEMPERATURE,
        };

        tracing::debug!(model = %self.config.model, prompt_chars = prompt.len(), "requesting summary");

        let response = self
            .client
            .post(&self.config.url)
            .bearer_auth(self.config.api_key.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "summary request failed");
                e
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "summary API error");
            return Err(Error::Summary(format!("summary API error {status}: {body}")));
        }

        let reply: ChatResponse = response.json().await?;
        let summary = reply
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| Error::Summary("no completion choices returned".to_string()))?;

        tracing::info!(chars = summary.len(), "summary generated");
        Ok(summary)
    }
}
