//! Driving port for the support chatbot.

use async_trait::async_trait;

use crate::domain::{ChatbotReply, Error};

/// Answer a visitor's question.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatbotQuery: Send + Sync {
    /// Produce an answer for the raw visitor message.
    async fn ask(&self, message: &str) -> Result<ChatbotReply, Error>;
}
