//! Port for message persistence and read tracking.

use async_trait::async_trait;

use crate::domain::{ConversationId, Message, MessageId, MessagePageRequest, NewMessage, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by message repository adapters.
    pub enum MessageRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "message repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "message repository query failed: {message}",
        /// The target conversation no longer exists.
        ConversationMissing { conversation_id: i64 } =>
            "conversation {conversation_id} does not exist",
    }
}

/// Port for writing messages and tracking who has read them.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Persist a message, its attachments and the sender's read mark in one
    /// unit of work.
    async fn insert(&self, message: NewMessage) -> Result<Message, MessageRepositoryError>;

    /// Fetch up to `page.fetch_limit()` messages in creation order starting
    /// at `page.offset()`.
    async fn list_page(
        &self,
        conversation_id: ConversationId,
        page: MessagePageRequest,
    ) -> Result<Vec<Message>, MessageRepositoryError>;

    /// Mark every message in the conversation as read by `reader` and return
    /// the ids whose read set changed.
    async fn mark_all_read(
        &self,
        conversation_id: ConversationId,
        reader: &UserId,
    ) -> Result<Vec<MessageId>, MessageRepositoryError>;
}
