//! Free-text summary passthrough to an OpenAI-compatible chat completion API.

use async_trait::async_trait;
use axum::{Json, extract::State};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::AppState;
use crate::config::AiConfig;
use crate::constants::*;
use crate::error::ApiError;
use crate::models::{AiSummaryRequest, AiSummaryResponse};

#[derive(Debug, Error)]
pub enum AssistantError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {0}")]
    Api(String),

    #[error("completion contained no text")]
    EmptyResponse,
}

/// Turns a prompt into free text. Implementations may fail; callers degrade gracefully.
#[async_trait]
pub trait TextSummarizer: Send + Sync {
    async fn summarize(&self, prompt: &str) -> Result<String, AssistantError>;
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Clone)]
pub struct OpenAiSummarizer {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiSummarizer {
    pub fn new(config: &AiConfig) -> Result<Self, AssistantError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.clone(),
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl TextSummarizer for OpenAiSummarizer {
    async fn summarize(&self, prompt: &str) -> Result<String, AssistantError> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens: AI_SUMMARY_MAX_TOKENS,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AssistantError::Api(format!(
                "completion request failed: {}",
                response.status()
            )));
        }

        let parsed: ChatResponse = response.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or(AssistantError::EmptyResponse)
    }
}

pub async fn ai_summary_handler(
    State(state): State<AppState>,
    Json(payload): Json<AiSummaryRequest>,
) -> Result<Json<AiSummaryResponse>, ApiError> {
    if payload.prompt.trim().is_empty() {
        return Err(ApiError::BadRequest("No prompt provided".to_string()));
    }
    if payload.prompt.len() > MAX_PROMPT_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "Prompt must be less than {} characters",
            MAX_PROMPT_LENGTH
        )));
    }

    let summarizer = state
        .summarizer
        .as_ref()
        .ok_or_else(|| ApiError::Upstream(ERR_AI_NOT_CONFIGURED.to_string()))?;

    match summarizer.summarize(&payload.prompt).await {
        Ok(result) => Ok(Json(AiSummaryResponse { result })),
        Err(e) => {
            tracing::warn!(error = %e, "ai summary failed");
            Err(ApiError::Upstream(ERR_AI_FAILED.to_string()))
        }
    }
}
