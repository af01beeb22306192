//! Completion API client for the lab's language-model calls
//!
//! Talks the OpenAI chat-completions wire format to the AIML API. Workflows
//! only see the [`CompletionBackend`] trait so tests can swap in a fake.

use crate::error::{LabError, LabResult};
use crate::settings::{ModelRegistry, ModelRole};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// One prompt addressed to a model role
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    pub role: ModelRole,
    pub prompt: String,
    /// Output token budget; `None` leaves it to the service default
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub struct TokenUsage {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub text: String,
    pub usage: Option<TokenUsage>,
}

#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> LabResult<Completion>;
}

/// Chat completions request format
#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    /// o1-family models reject `max_tokens`
    #[serde(skip_serializing_if = "Option::is_none")]
    max_completion_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

/// Chat completions response format
#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<TokenUsage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Reasoning models take their output budget as `max_completion_tokens`
pub fn is_reasoning_model(name: &str) -> bool {
    let bare = name.rsplit('/').next().unwrap_or(name);
    bare.starts_with("o1") || bare.starts_with("o3") || bare.starts_with("o4")
}

fn build_chat_request(model: &str, prompt: &str, max_tokens: Option<u32>) -> ChatRequest {
    let (max_tokens, max_completion_tokens) = if is_reasoning_model(model) {
        (None, max_tokens)
    } else {
        (max_tokens, None)
    };

    ChatRequest {
        model: model.to_string(),
        messages: vec![Message {
            role: "user".to_string(),
            content: prompt.to_string(),
        }],
        max_tokens,
        max_completion_tokens,
    }
}

fn parse_chat_response(response: ChatResponse) -> LabResult<Completion> {
    let text = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| LabError::Network("No choices in completion response".to_string()))?
        .message
        .content
        .unwrap_or_default();

    Ok(Completion { text, usage: response.usage })
}

/// HTTP client for the AIML completion endpoint
pub struct AimlClient {
    client: reqwest::Client,
    models: ModelRegistry,
}

impl AimlClient {
    pub fn new(models: ModelRegistry, timeout: Duration) -> LabResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LabError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, models })
    }
}

#[async_trait]
impl CompletionBackend for AimlClient {
    async fn complete(&self, request: CompletionRequest) -> LabResult<Completion> {
        let model = self.models.get(request.role)?;
        let body = build_chat_request(&model.name, &request.prompt, request.max_tokens);
        let url = format!("{}/v1/chat/completions", model.api_base_url);

        tracing::debug!(
            role = %request.role,
            model = %model.name,
            prompt_chars = request.prompt.chars().count(),
            max_tokens = ?request.max_tokens,
            "Requesting completion"
        );
        let started = Instant::now();

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", model.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(LabError::Api { status, body });
        }

        let api_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| LabError::Network(format!("Failed to parse completion response: {}", e)))?;

        let completion = parse_chat_response(api_response)?;

        let usage = completion.usage.unwrap_or_default();
        tracing::info!(
            role = %request.role,
            model = %model.name,
            elapsed_ms = started.elapsed().as_millis() as u64,
            prompt_tokens = usage.prompt_tokens,
            completion_tokens = usage.completion_tokens,
            "Completion finished"
        );

        Ok(completion)
    }
}
