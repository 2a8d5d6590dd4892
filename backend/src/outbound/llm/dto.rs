//! Wire types for OpenAI-compatible chat completions.

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub(super) struct ChatCompletionRequestDto<'a> {
    pub model: &'a str,
    pub messages: [ChatMessageDto<'a>; 2],
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Debug, Serialize)]
pub(super) struct ChatMessageDto<'a> {
    pub role: &'static str,
    pub content: &'a str,
}

#[derive(Debug, Deserialize)]
pub(super) struct ChatCompletionResponseDto {
    #[serde(default)]
    pub choices: Vec<ChoiceDto>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ChoiceDto {
    pub message: ChoiceMessageDto,
}

#[derive(Debug, Deserialize)]
pub(super) struct ChoiceMessageDto {
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatCompletionResponseDto {
    /// First non-blank answer, trimmed.
    pub fn into_answer(self) -> Option<String> {
        self.choices
            .into_iter()
            .filter_map(|choice| choice.message.content)
            .map(|content| content.trim().to_owned())
            .find(|content| !content.is_empty())
    }
}
