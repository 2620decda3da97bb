//! Chat completions over the OpenAI HTTP API.
//!
//! Any endpoint that speaks `POST {base}/chat/completions` works, so the
//! same provider serves api.openai.com and self-hosted gateways.

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, RETRY_AFTER};
use serde::{Deserialize, Serialize};

use super::traits::{
    ChatMessage, CompletionRequest, CompletionResponse, FinishReason, LlmError, LlmProvider,
    LlmResult, TokenUsage,
};

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    usage: Option<TokenUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
    finish_reason: Option<FinishReason>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
    code: Option<String>,
}

/// Maps an unsuccessful response to an error.
fn status_error(status: u16, retry_after_secs: Option<u64>, body: &str) -> LlmError {
    if status == 429 {
        return LlmError::RateLimited { retry_after_secs };
    }

    let envelope = serde_json::from_str::<ErrorEnvelope>(body).ok();
    let invalid_key = envelope
        .as_ref()
        .and_then(|e| e.error.code.as_deref())
        .is_some_and(|code| code == "invalid_api_key");
    let message = envelope
        .map(|e| e.error.message)
        .unwrap_or_else(|| format!("HTTP {}", status));

    if status == 401 || invalid_key {
        LlmError::Authentication(message)
    } else {
        LlmError::Api { status, message }
    }
}

/// Provider for OpenAI-compatible chat completion endpoints.
pub struct OpenAiCompatibleProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl OpenAiCompatibleProvider {
    /// Targets api.openai.com.
    pub fn openai(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self::custom(OPENAI_BASE_URL, Some(api_key.into()), model)
    }

    /// Targets another compatible endpoint. Local gateways often need no key.
    pub fn custom(
        base_url: impl Into<String>,
        api_key: Option<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            model: model.into(),
        }
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    fn chat_request<'a>(&'a self, request: &CompletionRequest) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: request.turns().collect(),
            temperature: request.temperature,
        }
    }

    fn parse_response(response: ChatResponse) -> LlmResult<CompletionResponse> {
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::InvalidResponse("no choices in response".to_string()))?;

        Ok(CompletionResponse {
            text: choice.message.content.unwrap_or_default(),
            usage: response.usage,
            finish_reason: choice.finish_reason.unwrap_or(FinishReason::Other),
        })
    }
}

#[async_trait]
impl LlmProvider for OpenAiCompatibleProvider {
    fn name(&self) -> &str {
        "openai-compatible"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: &CompletionRequest) -> LlmResult<CompletionResponse> {
        let mut http = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .json(&self.chat_request(request));
        if let Some(key) = &self.api_key {
            http = http.header(AUTHORIZATION, format!("Bearer {}", key));
        }

        let response = http.send().await?;
        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok());
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status.as_u16(), retry_after, &body));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(format!("parse response: {}", e)))?;
        let completion = Self::parse_response(parsed)?;

        tracing::debug!(
            model = %self.model,
            total_tokens = completion.usage.map(|u| u.total_tokens),
            finish_reason = ?completion.finish_reason,
            "Completion received"
        );
        Ok(completion)
    }
}
