//! Port for caching chatbot answers.

use std::time::Duration;

use async_trait::async_trait;

use super::define_port_error;

define_port_error! {
    /// Errors raised by chatbot cache adapters.
    pub enum ChatbotCacheError {
        /// The cache backend could not be reached.
        Backend { message: String } => "chatbot cache unavailable: {message}",
    }
}

/// Key/value cache for generated answers.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatbotCache: Send + Sync {
    /// Fetch a cached answer.
    async fn get(&self, key: &str) -> Result<Option<String>, ChatbotCacheError>;

    /// Store an answer for `ttl`.
    async fn put(&self, key: &str, answer: &str, ttl: Duration) -> Result<(), ChatbotCacheError>;
}
