//! Reqwest-backed chat completion client.
//!
//! The adapter owns transport details only: request shape, timeout, and the
//! mapping of HTTP failures onto [`LanguageModelError`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use zeroize::Zeroizing;

use super::dto::{ChatCompletionRequestDto, ChatCompletionResponseDto, ChatMessageDto};
use crate::domain::ports::{CompletionRequest, LanguageModel, LanguageModelError};

pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_MAX_TOKENS: u32 = 150;
pub const DEFAULT_TEMPERATURE: f32 = 0.3;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// Connection settings for an OpenAI-compatible endpoint.
pub struct OpenAiSettings {
    /// Base URL, e.g. `https://api.openai.com/v1/`.
    pub base_url: Url,
    pub api_key: Zeroizing<String>,
    pub model: String,
    pub timeout: Duration,
}

/// Chat completion client.
pub struct OpenAiChatClient {
    client: Client,
    endpoint: Url,
    api_key: Zeroizing<String>,
    model: String,
}

impl OpenAiChatClient {
    /// Build a client with the configured request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed or the
    /// base URL cannot be joined with the completions path.
    pub fn new(settings: OpenAiSettings) -> Result<Self, LanguageModelError> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|err| LanguageModelError::unavailable(err.to_string()))?;
        let endpoint = completions_endpoint(&settings.base_url)?;
        Ok(Self {
            client,
            endpoint,
            api_key: settings.api_key,
            model: settings.model,
        })
    }
}

fn completions_endpoint(base_url: &Url) -> Result<Url, LanguageModelError> {
    let mut base = base_url.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join("chat/completions")
        .map_err(|err| LanguageModelError::unavailable(format!("invalid base URL: {err}")))
}

#[async_trait]
impl LanguageModel for OpenAiChatClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LanguageModelError> {
        let body = ChatCompletionRequestDto {
            model: &self.model,
            messages: [
                ChatMessageDto {
                    role: "system",
                    content: &request.system_prompt,
                },
                ChatMessageDto {
                    role: "user",
                    content: &request.user_message,
                },
            ],
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(self.api_key.as_str())
            .json(&body)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, bytes.as_ref()));
        }
        parse_answer(bytes.as_ref())
    }
}

fn parse_answer(body: &[u8]) -> Result<String, LanguageModelError> {
    let decoded: ChatCompletionResponseDto = serde_json::from_slice(body).map_err(|err| {
        LanguageModelError::invalid_response(format!("invalid completion JSON: {err}"))
    })?;
    decoded
        .into_answer()
        .ok_or_else(|| LanguageModelError::invalid_response("completion had no content"))
}

fn map_transport_error(error: reqwest::Error) -> LanguageModelError {
    if error.is_timeout() {
        LanguageModelError::timeout(error.to_string())
    } else {
        LanguageModelError::upstream(error.to_string())
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> LanguageModelError {
    let preview = body_preview(body);
    let message = if preview.is_empty() {
        format!("status {}", status.as_u16())
    } else {
        format!("status {}: {preview}", status.as_u16())
    };

    match status {
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            LanguageModelError::timeout(message)
        }
        StatusCode::UNAUTHORIZED
        | StatusCode::TOO_MANY_REQUESTS
        | StatusCode::SERVICE_UNAVAILABLE => LanguageModelError::unavailable(message),
        _ => LanguageModelError::upstream(message),
    }
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}
