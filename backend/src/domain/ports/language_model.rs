//! Port for the external language model behind the support chatbot.

use async_trait::async_trait;

use super::define_port_error;

define_port_error! {
    /// Errors raised by language model adapters.
    pub enum LanguageModelError {
        /// The upstream did not answer in time.
        Timeout { message: String } => "language model timed out: {message}",
        /// The upstream is not configured or refused service.
        Unavailable { message: String } => "language model unavailable: {message}",
        /// Transport failure or an error status from the upstream.
        Upstream { message: String } => "language model request failed: {message}",
        /// The upstream answered with a body that could not be used.
        InvalidResponse { message: String } => "language model response invalid: {message}",
    }
}

/// One chat completion exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    pub system_prompt: String,
    pub user_message: String,
}

/// Chat completion provider.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Generate an answer for the request.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LanguageModelError>;
}

/// Stand-in used when no provider is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledLanguageModel;

#[async_trait]
impl LanguageModel for DisabledLanguageModel {
    async fn complete(&self, _request: &CompletionRequest) -> Result<String, LanguageModelError> {
        Err(LanguageModelError::unavailable("no language model configured"))
    }
}
